use foundation::ids::ProfileId;
use scene::profile::Profile;

/// Rows shown in the "recent profiles" table by default.
pub const DEFAULT_TABLE_LIMIT: usize = 200;

pub const EMPTY_TABLE_MESSAGE: &str = "No profiles found. Try adjusting filters.";

/// One display-ready table row. Missing values render as `-`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub id: ProfileId,
    pub platform: String,
    pub cycle: u32,
    pub region: String,
    pub latitude: String,
    pub longitude: String,
    pub date: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableView {
    pub rows: Vec<TableRow>,
    /// Profiles in the list before the presentation cap.
    pub total: usize,
}

impl TableView {
    pub fn is_truncated(&self) -> bool {
        self.rows.len() < self.total
    }

    pub fn empty_message(&self) -> Option<&'static str> {
        self.rows.is_empty().then_some(EMPTY_TABLE_MESSAGE)
    }

    /// Index of the highlighted row, for scrolling it into view.
    pub fn selected_index(&self) -> Option<usize> {
        self.rows.iter().position(|r| r.selected)
    }
}

/// Projects the first `cap` profiles into rows, highlighting `selected`.
///
/// The cap is a presentation limit, independent of the fetch limit.
pub fn table_view(profiles: &[Profile], selected: Option<ProfileId>, cap: usize) -> TableView {
    let rows = profiles
        .iter()
        .take(cap)
        .map(|p| TableRow {
            id: p.id,
            platform: p.platform_number.clone(),
            cycle: p.cycle_number,
            region: p.ocean_region.clone().unwrap_or_else(|| "-".to_string()),
            latitude: format!("{:.2}", p.latitude),
            longitude: format!("{:.2}", p.longitude),
            date: p.date().unwrap_or("-").to_string(),
            selected: selected == Some(p.id),
        })
        .collect();

    TableView {
        rows,
        total: profiles.len(),
    }
}
