use foundation::math::LatLon;

/// Anything that sits at a point on the globe and has a stable identifier.
pub trait Located {
    type Id: Copy;

    fn id(&self) -> Self::Id;
    fn location(&self) -> LatLon;
}

impl Located for crate::profile::Profile {
    type Id = foundation::ids::ProfileId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn location(&self) -> LatLon {
        crate::profile::Profile::location(self)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NearestHit<Id> {
    pub id: Id,
    pub distance_km: f64,
}

/// Linear nearest-entity scan by great-circle distance.
///
/// Ordering contract:
/// - The returned entity has no strictly closer entity in `entities`.
/// - Ties go to the first entity encountered in iteration order.
/// - Entities whose distance is NaN never win.
///
/// There is no distance cutoff: any non-empty input yields a hit, however far
/// the closest entity is from `point`.
pub fn nearest_hit<'a, T, I>(point: LatLon, entities: I) -> Option<NearestHit<T::Id>>
where
    T: Located + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut best: Option<NearestHit<T::Id>> = None;

    for entity in entities {
        let d = point.distance_km(entity.location());
        if d.is_nan() {
            continue;
        }
        match best {
            Some(b) if d >= b.distance_km => {}
            _ => {
                best = Some(NearestHit {
                    id: entity.id(),
                    distance_km: d,
                })
            }
        }
    }

    best
}

/// Identifier of the entity closest to `point`, or `None` for an empty input.
pub fn nearest<'a, T, I>(point: LatLon, entities: I) -> Option<T::Id>
where
    T: Located + 'a,
    I: IntoIterator<Item = &'a T>,
{
    nearest_hit(point, entities).map(|hit| hit.id)
}
