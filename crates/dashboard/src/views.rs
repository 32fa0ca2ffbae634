use std::sync::Arc;

use foundation::ids::ProfileId;
use scene::filter::ProfileQuery;
use scene::profile::{MeasurementSeries, Profile};
use streaming::error::FetchError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ListStatus {
    /// Nothing requested yet.
    #[default]
    Idle,
    Loading,
    Ready,
    Failed,
}

/// The profile list currently on screen.
///
/// Holds a shared handle to the cached list, never a copy of it.
#[derive(Debug, Clone, Default)]
pub struct ListView {
    pub(crate) query: Option<ProfileQuery>,
    pub(crate) profiles: Option<Arc<Vec<Profile>>>,
    pub(crate) status: ListStatus,
    pub(crate) stale: bool,
    pub(crate) error: Option<FetchError>,
}

impl ListView {
    /// Query the displayed profiles answer, if any are displayed.
    pub fn query(&self) -> Option<&ProfileQuery> {
        self.query.as_ref()
    }

    pub fn profiles(&self) -> &[Profile] {
        self.profiles.as_deref().map_or(&[], |v| v.as_slice())
    }

    pub fn get(&self, id: ProfileId) -> Option<&Profile> {
        self.profiles().iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: ProfileId) -> bool {
        self.get(id).is_some()
    }

    pub fn status(&self) -> ListStatus {
        self.status
    }

    pub fn is_loading(&self) -> bool {
        self.status == ListStatus::Loading
    }

    pub fn is_error(&self) -> bool {
        self.status == ListStatus::Failed
    }

    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    /// The displayed profiles are retained data that may be outdated: either a
    /// stale cache entry shown while refreshing, or the last good list after a
    /// failed refresh.
    pub fn is_stale(&self) -> bool {
        self.stale
    }
}

/// The selected profile's measurement series, as far as the detail view knows.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DetailState {
    /// No selection.
    #[default]
    Empty,
    Loading(ProfileId),
    Ready(Arc<MeasurementSeries>),
    /// Fetch failed or no series exists for this profile.
    Absent(ProfileId),
}

impl DetailState {
    pub fn profile_id(&self) -> Option<ProfileId> {
        match self {
            DetailState::Empty => None,
            DetailState::Loading(id) | DetailState::Absent(id) => Some(*id),
            DetailState::Ready(s) => Some(s.profile()),
        }
    }

    pub fn series(&self) -> Option<&MeasurementSeries> {
        match self {
            DetailState::Ready(s) => Some(s),
            _ => None,
        }
    }
}
