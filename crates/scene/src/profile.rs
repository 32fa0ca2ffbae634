use foundation::ids::ProfileId;
use foundation::math::{LatLon, stable_total_cmp_f64};
use serde::{Deserialize, Deserializer, Serialize};

/// One float measurement event: where and when a float surfaced.
///
/// Immutable once fetched. Lists of profiles are replaced wholesale on
/// re-fetch, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    #[serde(deserialize_with = "string_or_number")]
    pub platform_number: String,
    pub cycle_number: u32,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub ocean_region: Option<String>,
    /// ISO-8601 date or timestamp as sent by the backend.
    #[serde(default)]
    pub profile_date: Option<String>,
}

impl Profile {
    pub fn location(&self) -> LatLon {
        LatLon::new(self.latitude, self.longitude)
    }

    /// Human-readable float label, `platform-cycle`.
    pub fn label(&self) -> String {
        format!("{}-{}", self.platform_number, self.cycle_number)
    }

    /// Calendar-date part of `profile_date` (`YYYY-MM-DD`).
    pub fn date(&self) -> Option<&str> {
        let raw = self.profile_date.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        Some(raw.get(..10).unwrap_or(raw))
    }
}

// Some backends send WMO platform numbers as integers.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
    })
}

/// Which measured quantity a chart plots against depth.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Variable {
    #[default]
    Temperature,
    Salinity,
}

impl Variable {
    pub fn axis_title(self) -> &'static str {
        match self {
            Variable::Temperature => "Temperature (°C)",
            Variable::Salinity => "Salinity (PSU)",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "temperature" | "temp" => Some(Variable::Temperature),
            "salinity" | "psal" => Some(Variable::Salinity),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Sample {
    /// Meters below the surface.
    pub depth: f64,
    pub temperature: f64,
    pub salinity: f64,
}

impl Sample {
    pub fn value(&self, variable: Variable) -> f64 {
        match variable {
            Variable::Temperature => self.temperature,
            Variable::Salinity => self.salinity,
        }
    }
}

/// Depth-ordered readings for exactly one profile.
///
/// Samples are always sorted by ascending depth. An empty series is a valid
/// value and is distinct from "no series at all" (`Option::None` upstream).
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementSeries {
    profile: ProfileId,
    samples: Vec<Sample>,
}

impl MeasurementSeries {
    pub fn new(profile: ProfileId, mut samples: Vec<Sample>) -> Self {
        samples.sort_by(|a, b| stable_total_cmp_f64(a.depth, b.depth));
        Self { profile, samples }
    }

    pub fn profile(&self) -> ProfileId {
        self.profile
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn max_depth(&self) -> Option<f64> {
        self.samples.last().map(|s| s.depth)
    }
}

#[cfg(test)]
mod tests {
    use super::{MeasurementSeries, Profile, Sample, Variable};
    use foundation::ids::ProfileId;

    #[test]
    fn decodes_backend_record() {
        let json = r#"{"id":3,"platform_number":2902746,"cycle_number":12,
            "latitude":15.5,"longitude":68.25,"ocean_region":"Arabian Sea",
            "profile_date":"2023-03-14T06:30:00"}"#;
        let p: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(p.id, ProfileId(3));
        assert_eq!(p.platform_number, "2902746");
        assert_eq!(p.label(), "2902746-12");
        assert_eq!(p.date(), Some("2023-03-14"));
    }

    #[test]
    fn optional_fields_default_to_none() {
        let json = r#"{"id":1,"platform_number":"5904","cycle_number":1,
            "latitude":0,"longitude":0}"#;
        let p: Profile = serde_json::from_str(json).unwrap();
        assert_eq!(p.ocean_region, None);
        assert_eq!(p.date(), None);
    }

    #[test]
    fn series_is_sorted_by_depth() {
        let s = |depth| Sample {
            depth,
            temperature: 30.0 - depth / 100.0,
            salinity: 35.0,
        };
        let series = MeasurementSeries::new(ProfileId(1), vec![s(500.0), s(0.0), s(50.0)]);
        let depths: Vec<f64> = series.samples().iter().map(|x| x.depth).collect();
        assert_eq!(depths, vec![0.0, 50.0, 500.0]);
        assert_eq!(series.max_depth(), Some(500.0));
        assert_eq!(series.samples()[0].value(Variable::Temperature), 30.0);
    }

    #[test]
    fn parses_variable_names() {
        assert_eq!(Variable::parse("Salinity"), Some(Variable::Salinity));
        assert_eq!(Variable::parse(" temp "), Some(Variable::Temperature));
        assert_eq!(Variable::parse("oxygen"), None);
    }
}
