//! Deterministic float ordering.
//!
//! Nearest-point selection and filter cache keys both need floats that sort
//! and hash the same way every time, including for `-0.0` and NaN.

use core::cmp::Ordering;
use core::hash::{Hash, Hasher};

/// Folds `-0.0` into `0.0` and every NaN payload into `f64::NAN`.
pub fn canonical_f64(v: f64) -> f64 {
    if v == 0.0 {
        0.0
    } else if v.is_nan() {
        f64::NAN
    } else {
        v
    }
}

/// `total_cmp` on canonicalized values: `-0.0 == 0.0`, NaN sorts last.
pub fn stable_total_cmp_f64(a: f64, b: f64) -> Ordering {
    canonical_f64(a).total_cmp(&canonical_f64(b))
}

/// A float wrapper usable in ordered and hashed keys.
///
/// `Eq`, `Ord` and `Hash` all agree because they all go through
/// [`canonical_f64`].
#[derive(Debug, Copy, Clone, Default)]
pub struct StableF64(pub f64);

impl PartialEq for StableF64 {
    fn eq(&self, other: &Self) -> bool {
        stable_total_cmp_f64(self.0, other.0) == Ordering::Equal
    }
}

impl Eq for StableF64 {}

impl PartialOrd for StableF64 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for StableF64 {
    fn cmp(&self, other: &Self) -> Ordering {
        stable_total_cmp_f64(self.0, other.0)
    }
}

impl Hash for StableF64 {
    fn hash<H: Hasher>(&self, state: &mut H) {
        canonical_f64(self.0).to_bits().hash(state);
    }
}
