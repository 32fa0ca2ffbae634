/// Lifecycle of one cache key, as seen from outside the cache.
///
/// Missing → Loading → Fresh → Stale → Refreshing → Fresh ...
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Residency {
    /// No value and nothing in flight.
    Missing,
    /// First fetch in flight, no value yet.
    Loading,
    /// Value within its staleness window.
    Fresh,
    /// Value past its staleness window, nothing in flight.
    Stale,
    /// Value present (fresh or stale) with a fetch in flight.
    Refreshing,
}

impl Residency {
    pub fn has_value(self) -> bool {
        matches!(self, Residency::Fresh | Residency::Stale | Residency::Refreshing)
    }

    pub fn is_in_flight(self) -> bool {
        matches!(self, Residency::Loading | Residency::Refreshing)
    }
}
