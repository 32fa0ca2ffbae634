//! Wire types exchanged with the ARGO backend.
//!
//! Profiles decode straight into `scene::Profile`; everything else lands here
//! and is converted into domain values at the edge.

use foundation::ids::ProfileId;
use scene::profile::{MeasurementSeries, Sample};
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Column-oriented measurement payload, aligned by index.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeasurementsPayload {
    #[serde(default)]
    pub depth: Vec<f64>,
    #[serde(default)]
    pub temperature: Vec<f64>,
    #[serde(default)]
    pub salinity: Vec<f64>,
}

impl MeasurementsPayload {
    /// Zips the three columns into depth-sorted samples for `profile`.
    ///
    /// Columns of different lengths are rejected rather than truncated.
    pub fn into_series(self, profile: ProfileId) -> Result<MeasurementSeries, FetchError> {
        let n = self.depth.len();
        if self.temperature.len() != n || self.salinity.len() != n {
            return Err(FetchError::decode(format!(
                "misaligned arrays for profile {profile}: depth={} temperature={} salinity={}",
                n,
                self.temperature.len(),
                self.salinity.len()
            )));
        }

        let samples = self
            .depth
            .into_iter()
            .zip(self.temperature)
            .zip(self.salinity)
            .map(|((depth, temperature), salinity)| Sample {
                depth,
                temperature,
                salinity,
            })
            .collect();

        Ok(MeasurementSeries::new(profile, samples))
    }

    pub fn from_series(series: &MeasurementSeries) -> Self {
        let s = series.samples();
        Self {
            depth: s.iter().map(|x| x.depth).collect(),
            temperature: s.iter().map(|x| x.temperature).collect(),
            salinity: s.iter().map(|x| x.salinity).collect(),
        }
    }
}

/// Aggregate counts shown in the dashboard header.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArgoStats {
    pub profiles: u64,
    pub floats: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{ChatReply, MeasurementsPayload};
    use crate::error::FetchErrorKind;
    use foundation::ids::ProfileId;

    #[test]
    fn zips_and_sorts_columns() {
        let payload: MeasurementsPayload = serde_json::from_str(
            r#"{"depth":[100,0,50],"temperature":[25,28,27],"salinity":[35.2,35.0,35.1]}"#,
        )
        .unwrap();
        let series = payload.into_series(ProfileId(5)).unwrap();
        assert_eq!(series.profile(), ProfileId(5));
        let rows: Vec<(f64, f64)> = series
            .samples()
            .iter()
            .map(|s| (s.depth, s.temperature))
            .collect();
        assert_eq!(rows, vec![(0.0, 28.0), (50.0, 27.0), (100.0, 25.0)]);
    }

    #[test]
    fn empty_payload_is_an_empty_series() {
        let payload: MeasurementsPayload = serde_json::from_str("{}").unwrap();
        let series = payload.into_series(ProfileId(1)).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn rejects_misaligned_columns() {
        let payload = MeasurementsPayload {
            depth: vec![0.0, 10.0],
            temperature: vec![20.0],
            salinity: vec![35.0, 35.0],
        };
        let err = payload.into_series(ProfileId(2)).unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Decode);
    }

    #[test]
    fn chat_reply_message_is_optional() {
        let reply: ChatReply = serde_json::from_str("{}").unwrap();
        assert_eq!(reply.message, None);
    }
}
