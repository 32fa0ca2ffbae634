use serde::{Deserialize, Serialize};

/// Backend identifier of a single float profile.
///
/// Opaque to the dashboard: it is only compared, hashed and echoed back to the
/// backend when fetching measurements.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(pub i64);

impl ProfileId {
    pub fn new(raw: i64) -> Self {
        ProfileId(raw)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ProfileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
