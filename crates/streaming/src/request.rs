/// Identifies one underlying fetch issued by a cache.
///
/// Every caller attached to a de-duplicated request observes the same id.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FetchId(pub u64);

/// How a cache request treats an existing value.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum FetchMode {
    /// Serve a fresh cached value; fetch only when missing or stale.
    #[default]
    IfStale,
    /// Ignore the staleness window (manual refresh). Still de-duplicated.
    Refetch,
}
