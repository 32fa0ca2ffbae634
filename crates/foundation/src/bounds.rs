use core::hash::{Hash, Hasher};

use crate::math::{LatLon, StableF64};

/// Latitude/longitude bounding box in degrees (inclusive on every edge).
#[derive(Copy, Clone, Debug)]
pub struct GeoBounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl GeoBounds {
    /// The whole globe.
    pub const WORLD: GeoBounds = GeoBounds {
        lat_min: -90.0,
        lat_max: 90.0,
        lon_min: -180.0,
        lon_max: 180.0,
    };

    pub fn new(lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        GeoBounds {
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    pub fn contains(&self, p: LatLon) -> bool {
        p.lat >= self.lat_min
            && p.lat <= self.lat_max
            && p.lon >= self.lon_min
            && p.lon <= self.lon_max
    }

    fn key(&self) -> [StableF64; 4] {
        [
            StableF64(self.lat_min),
            StableF64(self.lat_max),
            StableF64(self.lon_min),
            StableF64(self.lon_max),
        ]
    }
}

impl Default for GeoBounds {
    fn default() -> Self {
        GeoBounds::WORLD
    }
}

impl PartialEq for GeoBounds {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for GeoBounds {}

impl Hash for GeoBounds {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}
