use foundation::ids::ProfileId;
use scene::profile::Profile;

/// One map marker with the fields its popup shows.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPoint {
    pub id: ProfileId,
    /// `platform-cycle`, shown as the float name in the popup.
    pub label: String,
    pub lat: f64,
    pub lon: f64,
    pub region: Option<String>,
    pub date: Option<String>,
    pub selected: bool,
}

pub fn map_points(profiles: &[Profile], selected: Option<ProfileId>) -> Vec<MapPoint> {
    profiles
        .iter()
        .map(|p| MapPoint {
            id: p.id,
            label: p.label(),
            lat: p.latitude,
            lon: p.longitude,
            region: p.ocean_region.clone(),
            date: p.date().map(str::to_string),
            selected: selected == Some(p.id),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::map_points;
    use foundation::ids::ProfileId;
    use pretty_assertions::assert_eq;
    use scene::profile::Profile;

    #[test]
    fn one_point_per_profile_with_selection_flag() {
        let profiles = vec![
            Profile {
                id: ProfileId(1),
                platform_number: "2902746".to_string(),
                cycle_number: 4,
                latitude: 12.0,
                longitude: 70.5,
                ocean_region: Some("Arabian Sea".to_string()),
                profile_date: Some("2023-02-01T00:00:00Z".to_string()),
            },
            Profile {
                id: ProfileId(2),
                platform_number: "2902746".to_string(),
                cycle_number: 5,
                latitude: 12.5,
                longitude: 71.0,
                ocean_region: None,
                profile_date: None,
            },
        ];

        let points = map_points(&profiles, Some(ProfileId(2)));
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].label, "2902746-4");
        assert_eq!(points[0].date.as_deref(), Some("2023-02-01"));
        assert!(!points[0].selected);
        assert!(points[1].selected);
        assert_eq!((points[1].lat, points[1].lon), (12.5, 71.0));
    }

    #[test]
    fn empty_list_has_no_points() {
        assert!(map_points(&[], None).is_empty());
    }
}
