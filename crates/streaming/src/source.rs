//! Remote data source abstraction.
//!
//! The dashboard core only ever talks to the backend through `ArgoSource`.
//! Implementations:
//! - `MemorySource` (here): in-process data for tests and offline runs
//! - an HTTP source (in the command-line app) for the real backend
//!
//! Methods return boxed futures so the trait stays dyn-compatible.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::Duration;

use foundation::ids::ProfileId;
use futures_util::future::BoxFuture;
use parking_lot::{Mutex, RwLock};
use runtime::metrics::Metrics;
use scene::filter::ProfileQuery;
use scene::profile::{MeasurementSeries, Profile};

use crate::error::{FetchError, FetchErrorKind};
use crate::protocol::{ArgoStats, ChatReply};

/// Backend operations consumed by the dashboard.
///
/// Implementations must be `Send + Sync` so one source can back several
/// concurrent fetches.
pub trait ArgoSource: Send + Sync {
    fn name(&self) -> &str;

    /// Profiles matching `query`, at most `query.limit` of them. Order is not
    /// significant.
    fn profiles(&self, query: &ProfileQuery) -> BoxFuture<'_, Result<Vec<Profile>, FetchError>>;

    /// Measurement series for one profile. A profile without measurements is
    /// a `NotFound` error.
    fn measurements(&self, id: ProfileId) -> BoxFuture<'_, Result<MeasurementSeries, FetchError>>;

    fn stats(&self) -> BoxFuture<'_, Result<ArgoStats, FetchError>>;

    fn chat(&self, message: &str) -> BoxFuture<'_, Result<ChatReply, FetchError>>;

    /// CSV export of profiles matching `query`, passed through verbatim.
    fn export_csv(&self, query: &ProfileQuery) -> BoxFuture<'_, Result<Vec<u8>, FetchError>>;
}

pub const CALLS_PROFILES: &str = "profiles";
pub const CALLS_MEASUREMENTS: &str = "measurements";
pub const CALLS_STATS: &str = "stats";
pub const CALLS_CHAT: &str = "chat";
pub const CALLS_EXPORT: &str = "export";

/// In-memory source with call accounting and failure injection.
pub struct MemorySource {
    name: String,
    profiles: RwLock<Vec<Profile>>,
    measurements: RwLock<HashMap<ProfileId, MeasurementSeries>>,
    failing_measurements: RwLock<HashSet<ProfileId>>,
    fail_profiles: RwLock<bool>,
    chat_reply: RwLock<Option<String>>,
    latency: Option<Duration>,
    calls: Mutex<Metrics>,
}

impl MemorySource {
    pub fn new(profiles: Vec<Profile>) -> Self {
        Self {
            name: "memory".to_string(),
            profiles: RwLock::new(profiles),
            measurements: RwLock::new(HashMap::new()),
            failing_measurements: RwLock::new(HashSet::new()),
            fail_profiles: RwLock::new(false),
            chat_reply: RwLock::new(None),
            latency: None,
            calls: Mutex::new(Metrics::new()),
        }
    }

    pub fn with_measurements(self, series: impl IntoIterator<Item = MeasurementSeries>) -> Self {
        {
            let mut m = self.measurements.write();
            for s in series {
                m.insert(s.profile(), s);
            }
        }
        self
    }

    pub fn with_chat_reply(self, reply: impl Into<String>) -> Self {
        *self.chat_reply.write() = Some(reply.into());
        self
    }

    /// Every call sleeps for `latency` before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Replaces the backing profile list, as if the backend data changed.
    pub fn set_profiles(&self, profiles: Vec<Profile>) {
        *self.profiles.write() = profiles;
    }

    pub fn set_fail_profiles(&self, fail: bool) {
        *self.fail_profiles.write() = fail;
    }

    pub fn fail_measurements(&self, id: ProfileId) {
        self.failing_measurements.write().insert(id);
    }

    /// Number of calls made to the operation named by one of the `CALLS_*`
    /// constants.
    pub fn calls(&self, op: &str) -> u64 {
        self.calls.lock().counter(op)
    }

    fn record(&self, op: &'static str) {
        self.calls.lock().inc(op);
    }

    async fn wait(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn matching(&self, query: &ProfileQuery) -> Vec<Profile> {
        self.profiles
            .read()
            .iter()
            .filter(|p| query.matches(p))
            .take(query.limit as usize)
            .cloned()
            .collect()
    }
}

impl ArgoSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn profiles(&self, query: &ProfileQuery) -> BoxFuture<'_, Result<Vec<Profile>, FetchError>> {
        let query = query.clone();
        Box::pin(async move {
            self.record(CALLS_PROFILES);
            self.wait().await;
            if *self.fail_profiles.read() {
                return Err(FetchError::new(
                    FetchErrorKind::Status(503),
                    "profile list unavailable",
                ));
            }
            Ok(self.matching(&query))
        })
    }

    fn measurements(&self, id: ProfileId) -> BoxFuture<'_, Result<MeasurementSeries, FetchError>> {
        Box::pin(async move {
            self.record(CALLS_MEASUREMENTS);
            self.wait().await;
            if self.failing_measurements.read().contains(&id) {
                return Err(FetchError::new(
                    FetchErrorKind::Transport,
                    format!("connection reset fetching profile {id}"),
                ));
            }
            self.measurements
                .read()
                .get(&id)
                .cloned()
                .ok_or_else(|| FetchError::not_found(format!("measurements for profile {id}")))
        })
    }

    fn stats(&self) -> BoxFuture<'_, Result<ArgoStats, FetchError>> {
        Box::pin(async move {
            self.record(CALLS_STATS);
            self.wait().await;
            let profiles = self.profiles.read();
            let floats: BTreeSet<&str> = profiles
                .iter()
                .map(|p| p.platform_number.as_str())
                .collect();
            Ok(ArgoStats {
                profiles: profiles.len() as u64,
                floats: floats.len() as u64,
            })
        })
    }

    fn chat(&self, _message: &str) -> BoxFuture<'_, Result<ChatReply, FetchError>> {
        Box::pin(async move {
            self.record(CALLS_CHAT);
            self.wait().await;
            Ok(ChatReply {
                message: self.chat_reply.read().clone(),
            })
        })
    }

    fn export_csv(&self, query: &ProfileQuery) -> BoxFuture<'_, Result<Vec<u8>, FetchError>> {
        let query = query.clone();
        Box::pin(async move {
            self.record(CALLS_EXPORT);
            self.wait().await;
            write_export(&self.matching(&query))
        })
    }
}

/// Column order of the CSV export.
const EXPORT_HEADER: [&str; 7] = [
    "id",
    "platform_number",
    "cycle_number",
    "latitude",
    "longitude",
    "ocean_region",
    "profile_date",
];

fn write_export(profiles: &[Profile]) -> Result<Vec<u8>, FetchError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADER).map_err(export_error)?;
    for p in profiles {
        writer
            .write_record([
                p.id.to_string(),
                p.platform_number.clone(),
                p.cycle_number.to_string(),
                p.latitude.to_string(),
                p.longitude.to_string(),
                p.ocean_region.clone().unwrap_or_default(),
                p.profile_date.clone().unwrap_or_default(),
            ])
            .map_err(export_error)?;
    }
    writer.into_inner().map_err(|e| {
        FetchError::with_source(FetchErrorKind::Decode, "CSV export", e.into_error())
    })
}

fn export_error(err: csv::Error) -> FetchError {
    FetchError::with_source(FetchErrorKind::Decode, "CSV export", err)
}
