use foundation::ids::ProfileId;
use foundation::math::LatLon;

use crate::picking::{Located, nearest};

/// The single profile shared by the map, the table and the detail chart.
///
/// Mutators return `true` when the selection actually changed so callers can
/// decide whether dependent views need refreshing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected: Option<ProfileId>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<ProfileId> {
        self.selected
    }

    pub fn is_selected(&self, id: ProfileId) -> bool {
        self.selected == Some(id)
    }

    pub fn select(&mut self, id: ProfileId) -> bool {
        let changed = self.selected != Some(id);
        self.selected = Some(id);
        changed
    }

    /// Selects the entity closest to `point`.
    ///
    /// An empty `entities` leaves the current selection untouched. Otherwise
    /// the best match is always selected, however far away it is.
    pub fn select_nearest<'a, T, I>(&mut self, point: LatLon, entities: I) -> bool
    where
        T: Located<Id = ProfileId> + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        match nearest(point, entities) {
            Some(id) => self.select(id),
            None => false,
        }
    }

    pub fn clear(&mut self) -> bool {
        self.selected.take().is_some()
    }

    /// Clears the selection unless its id is among `ids`.
    ///
    /// Returns `true` if the selection was dropped.
    pub fn retain_in<I>(&mut self, ids: I) -> bool
    where
        I: IntoIterator<Item = ProfileId>,
    {
        let Some(current) = self.selected else {
            return false;
        };
        if ids.into_iter().any(|id| id == current) {
            return false;
        }
        self.selected = None;
        true
    }
}
