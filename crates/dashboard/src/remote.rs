use std::sync::Arc;

use foundation::ids::ProfileId;
use futures_util::future::{BoxFuture, FutureExt};
use scene::filter::ProfileQuery;
use scene::profile::{MeasurementSeries, Profile};
use streaming::cache::{Cached, FetchResult, QueryCache};
use streaming::protocol::ArgoStats;
use streaming::request::FetchMode;
use streaming::source::ArgoSource;
use tracing::warn;

use crate::config::DashboardConfig;

/// Cached, de-duplicated access to the backend.
///
/// This is the single source of truth for remote data: every read of a
/// profile list, measurement series or stats goes through one of its caches.
#[derive(Clone)]
pub struct RemoteData {
    source: Arc<dyn ArgoSource>,
    profiles: QueryCache<ProfileQuery, Arc<Vec<Profile>>>,
    measurements: QueryCache<ProfileId, Arc<MeasurementSeries>>,
    stats: QueryCache<(), ArgoStats>,
}

impl RemoteData {
    pub fn new(source: Arc<dyn ArgoSource>, config: &DashboardConfig) -> Self {
        Self {
            source,
            profiles: QueryCache::new("argo-profiles", config.profiles),
            measurements: QueryCache::new("argo-measurements", config.measurements),
            stats: QueryCache::new("argo-stats", config.stats),
        }
    }

    pub fn source(&self) -> &Arc<dyn ArgoSource> {
        &self.source
    }

    pub fn profiles_cache(&self) -> &QueryCache<ProfileQuery, Arc<Vec<Profile>>> {
        &self.profiles
    }

    pub fn measurements_cache(&self) -> &QueryCache<ProfileId, Arc<MeasurementSeries>> {
        &self.measurements
    }

    pub fn stats_cache(&self) -> &QueryCache<(), ArgoStats> {
        &self.stats
    }

    /// Profiles for `query`. Failures propagate to the caller.
    pub fn list_profiles(
        &self,
        query: ProfileQuery,
        mode: FetchMode,
    ) -> BoxFuture<'static, FetchResult<Arc<Vec<Profile>>>> {
        let source = Arc::clone(&self.source);
        self.profiles.fetch(query, mode, move |query| async move {
            source.profiles(&query).await.map(Arc::new)
        })
    }

    pub fn cached_profiles(&self, query: &ProfileQuery) -> Option<Cached<Arc<Vec<Profile>>>> {
        self.profiles.peek(query)
    }

    /// Measurement series for `id`.
    ///
    /// Returns `None` without fetching when `id` is `None`. The future itself
    /// never fails: any fetch error resolves to `None` ("no data").
    pub fn fetch_measurements(
        &self,
        id: Option<ProfileId>,
        mode: FetchMode,
    ) -> Option<BoxFuture<'static, Option<Arc<MeasurementSeries>>>> {
        let id = id?;
        let source = Arc::clone(&self.source);
        let fetch = self.measurements.fetch(id, mode, move |id| async move {
            source.measurements(id).await.map(Arc::new)
        });

        Some(
            async move {
                match fetch.await {
                    Ok(series) => Some(series),
                    Err(err) => {
                        warn!("measurements for profile {id} unavailable: {err}");
                        None
                    }
                }
            }
            .boxed(),
        )
    }

    pub fn cached_measurements(&self, id: ProfileId) -> Option<Cached<Arc<MeasurementSeries>>> {
        self.measurements.peek(&id)
    }

    pub fn stats(&self, mode: FetchMode) -> BoxFuture<'static, FetchResult<ArgoStats>> {
        let source = Arc::clone(&self.source);
        self.stats
            .fetch((), mode, move |()| async move { source.stats().await })
    }
}
