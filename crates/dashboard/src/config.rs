use layers::table::DEFAULT_TABLE_LIMIT;
use scene::profile::Variable;
use streaming::cache::CachePolicy;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    /// Presentation cap on table rows, independent of the fetch limit.
    pub table_limit: usize,
    pub profiles: CachePolicy,
    pub measurements: CachePolicy,
    pub stats: CachePolicy,
    /// Variable the detail chart plots by default.
    pub variable: Variable,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            table_limit: DEFAULT_TABLE_LIMIT,
            profiles: CachePolicy::PROFILES,
            measurements: CachePolicy::MEASUREMENTS,
            stats: CachePolicy::STATS,
            variable: Variable::Temperature,
        }
    }
}
