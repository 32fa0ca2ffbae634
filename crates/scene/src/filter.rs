use foundation::bounds::GeoBounds;

use crate::profile::Profile;

/// Result limit used when the form holds no usable value.
pub const DEFAULT_LIMIT: u32 = 200;

/// Row cap the CSV export falls back to when the limit field is emptied.
pub const EXPORT_DEFAULT_LIMIT: u32 = 100;

/// Region tags offered by the dashboard's region picker.
pub const KNOWN_REGIONS: [&str; 5] = [
    "Indian",
    "Arabian Sea",
    "Bay of Bengal",
    "Pacific",
    "Atlantic",
];

/// Normalized profile-list query.
///
/// Serves both as the cache key for the profile list and as the request
/// payload. Optional fields are `None` rather than empty strings, so two
/// forms that differ only by whitespace produce equal queries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProfileQuery {
    pub bounds: GeoBounds,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub ocean_region: Option<String>,
    pub limit: u32,
}

impl Default for ProfileQuery {
    fn default() -> Self {
        Self {
            bounds: GeoBounds::WORLD,
            start_date: None,
            end_date: None,
            ocean_region: None,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl ProfileQuery {
    /// Query-string pairs in the backend's parameter names. Unset optional
    /// fields are omitted entirely.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut out = vec![
            ("lat_min", self.bounds.lat_min.to_string()),
            ("lat_max", self.bounds.lat_max.to_string()),
            ("lon_min", self.bounds.lon_min.to_string()),
            ("lon_max", self.bounds.lon_max.to_string()),
            ("limit", self.limit.to_string()),
        ];
        self.push_optional(&mut out);
        out
    }

    /// Parameters for the CSV export endpoint, which takes no bounding box.
    pub fn export_params(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::new();
        self.push_optional(&mut out);
        out.push(("limit", self.limit.to_string()));
        out
    }

    fn push_optional(&self, out: &mut Vec<(&'static str, String)>) {
        if let Some(v) = &self.start_date {
            out.push(("start_date", v.clone()));
        }
        if let Some(v) = &self.end_date {
            out.push(("end_date", v.clone()));
        }
        if let Some(v) = &self.ocean_region {
            out.push(("ocean_region", v.clone()));
        }
    }

    /// Whether `profile` satisfies every predicate except the limit.
    ///
    /// Dates compare on their `YYYY-MM-DD` prefix; a profile without a date
    /// never matches a date-bounded query.
    pub fn matches(&self, profile: &Profile) -> bool {
        if !self.bounds.contains(profile.location()) {
            return false;
        }
        if let Some(region) = &self.ocean_region {
            if profile.ocean_region.as_deref() != Some(region.as_str()) {
                return false;
            }
        }
        if self.start_date.is_none() && self.end_date.is_none() {
            return true;
        }
        let Some(date) = profile.date() else {
            return false;
        };
        if let Some(start) = &self.start_date {
            if date < start.as_str() {
                return false;
            }
        }
        if let Some(end) = &self.end_date {
            if date > end.as_str() {
                return false;
            }
        }
        true
    }
}

impl std::fmt::Display for ProfileQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "limit={}", self.limit)?;
        if let Some(v) = &self.start_date {
            write!(f, " start={v}")?;
        }
        if let Some(v) = &self.end_date {
            write!(f, " end={v}")?;
        }
        if let Some(v) = &self.ocean_region {
            write!(f, " region={v:?}")?;
        }
        if self.bounds != GeoBounds::WORLD {
            let b = &self.bounds;
            write!(
                f,
                " bbox=[{},{}]x[{},{}]",
                b.lat_min, b.lat_max, b.lon_min, b.lon_max
            )?;
        }
        Ok(())
    }
}

/// Raw filter form inputs plus their normalized query.
///
/// The normalized query is recomputed on every mutation. Setters report
/// whether the normalized query changed; they never fetch anything themselves.
#[derive(Debug, Clone)]
pub struct FilterState {
    start: String,
    end: String,
    region: String,
    limit: u32,
    bounds: GeoBounds,
    query: ProfileQuery,
}

impl Default for FilterState {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterState {
    pub fn new() -> Self {
        let mut s = Self {
            start: String::new(),
            end: String::new(),
            region: String::new(),
            limit: DEFAULT_LIMIT,
            bounds: GeoBounds::WORLD,
            query: ProfileQuery::default(),
        };
        s.query = s.normalize();
        s
    }

    pub fn query(&self) -> &ProfileQuery {
        &self.query
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn end(&self) -> &str {
        &self.end
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Raw limit field; zero when emptied.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn set_start(&mut self, value: impl Into<String>) -> bool {
        self.start = value.into();
        self.renormalize()
    }

    pub fn set_end(&mut self, value: impl Into<String>) -> bool {
        self.end = value.into();
        self.renormalize()
    }

    pub fn set_region(&mut self, value: impl Into<String>) -> bool {
        self.region = value.into();
        self.renormalize()
    }

    /// Sets the result limit. Zero (an emptied numeric field) means "default".
    pub fn set_limit(&mut self, limit: u32) -> bool {
        self.limit = limit;
        self.renormalize()
    }

    /// Query sent to the CSV export. Same predicates as the list, but an
    /// emptied limit falls back to [`EXPORT_DEFAULT_LIMIT`].
    pub fn export_query(&self) -> ProfileQuery {
        ProfileQuery {
            limit: non_zero_or(self.limit, EXPORT_DEFAULT_LIMIT),
            ..self.query.clone()
        }
    }

    pub fn set_bounds(&mut self, bounds: GeoBounds) -> bool {
        self.bounds = bounds;
        self.renormalize()
    }

    fn renormalize(&mut self) -> bool {
        let next = self.normalize();
        if next == self.query {
            return false;
        }
        self.query = next;
        true
    }

    fn normalize(&self) -> ProfileQuery {
        ProfileQuery {
            bounds: self.bounds,
            start_date: non_blank(&self.start),
            end_date: non_blank(&self.end),
            ocean_region: non_blank(&self.region),
            limit: non_zero_or(self.limit, DEFAULT_LIMIT),
        }
    }
}

fn non_zero_or(limit: u32, default: u32) -> u32 {
    if limit == 0 { default } else { limit }
}

fn non_blank(raw: &str) -> Option<String> {
    let t = raw.trim();
    (!t.is_empty()).then(|| t.to_string())
}

#[cfg(test)]
mod tests {
    use super::{DEFAULT_LIMIT, EXPORT_DEFAULT_LIMIT, FilterState, ProfileQuery};
    use crate::profile::Profile;
    use foundation::bounds::GeoBounds;
    use foundation::ids::ProfileId;
    use pretty_assertions::assert_eq;

    fn profile(region: Option<&str>, date: Option<&str>) -> Profile {
        Profile {
            id: ProfileId(1),
            platform_number: "2902746".to_string(),
            cycle_number: 1,
            latitude: 10.0,
            longitude: 70.0,
            ocean_region: region.map(str::to_string),
            profile_date: date.map(str::to_string),
        }
    }

    #[test]
    fn default_query_is_whole_globe_with_default_limit() {
        let f = FilterState::new();
        assert_eq!(f.query(), &ProfileQuery::default());
        assert_eq!(f.query().limit, DEFAULT_LIMIT);
        assert_eq!(f.query().bounds, GeoBounds::WORLD);
    }

    #[test]
    fn blank_inputs_are_omitted() {
        let mut f = FilterState::new();
        assert!(!f.set_start("   "));
        assert!(!f.set_region(""));
        assert_eq!(f.query().start_date, None);
        assert_eq!(f.query().ocean_region, None);

        let keys: Vec<&str> = f.query().params().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["lat_min", "lat_max", "lon_min", "lon_max", "limit"]);
    }

    #[test]
    fn setters_report_structural_changes_only() {
        let mut f = FilterState::new();
        assert!(f.set_region("Pacific"));
        assert!(!f.set_region(" Pacific "));
        assert_eq!(f.region(), " Pacific ");
        assert!(f.set_limit(50));
        assert!(!f.set_limit(50));
        assert!(f.set_limit(0));
        assert_eq!(f.limit(), 0);
        assert_eq!(f.query().limit, DEFAULT_LIMIT);
    }

    #[test]
    fn emptied_limit_exports_one_hundred_rows() {
        let mut f = FilterState::new();
        f.set_region("Arabian Sea");
        assert_eq!(f.export_query().limit, DEFAULT_LIMIT);

        f.set_limit(0);
        let export = f.export_query();
        assert_eq!(export.limit, EXPORT_DEFAULT_LIMIT);
        assert_eq!(export.ocean_region.as_deref(), Some("Arabian Sea"));
        assert_eq!(f.query().limit, DEFAULT_LIMIT);

        f.set_limit(30);
        assert_eq!(f.export_query().limit, 30);
    }

    #[test]
    fn params_carry_set_fields() {
        let mut f = FilterState::new();
        f.set_start("2023-01-01");
        f.set_end("2023-06-30");
        f.set_region("Bay of Bengal");
        f.set_limit(25);

        let params = f.query().params();
        assert!(params.contains(&("start_date", "2023-01-01".to_string())));
        assert!(params.contains(&("end_date", "2023-06-30".to_string())));
        assert!(params.contains(&("ocean_region", "Bay of Bengal".to_string())));
        assert!(params.contains(&("limit", "25".to_string())));

        let export: Vec<&str> = f.query().export_params().iter().map(|(k, _)| *k).collect();
        assert_eq!(export, vec!["start_date", "end_date", "ocean_region", "limit"]);
    }

    #[test]
    fn matches_region_and_date_range() {
        let q = ProfileQuery {
            ocean_region: Some("Indian".to_string()),
            start_date: Some("2023-01-01".to_string()),
            end_date: Some("2023-12-31".to_string()),
            ..ProfileQuery::default()
        };
        assert!(q.matches(&profile(Some("Indian"), Some("2023-05-02T10:00:00"))));
        assert!(q.matches(&profile(Some("Indian"), Some("2023-12-31"))));
        assert!(!q.matches(&profile(Some("Pacific"), Some("2023-05-02"))));
        assert!(!q.matches(&profile(Some("Indian"), Some("2024-01-01"))));
        assert!(!q.matches(&profile(Some("Indian"), None)));
        assert!(ProfileQuery::default().matches(&profile(None, None)));
    }

    #[test]
    fn display_is_compact() {
        let mut f = FilterState::new();
        f.set_region("Atlantic");
        f.set_limit(10);
        assert_eq!(f.query().to_string(), "limit=10 region=\"Atlantic\"");
    }
}
