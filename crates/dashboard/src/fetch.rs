use std::sync::Arc;

use foundation::ids::ProfileId;
use futures_util::future::{BoxFuture, FutureExt};
use scene::filter::ProfileQuery;
use scene::profile::{MeasurementSeries, Profile};
use streaming::cache::FetchResult;
use streaming::protocol::ArgoStats;

/// A fetch handed out by `Dashboard::reconcile`, tagged with the input that
/// was current when it was issued.
///
/// Resolving it does not touch the dashboard; the caller feeds the resulting
/// `Delivery` back through `Dashboard::deliver`, in whatever order the
/// deliveries complete.
pub enum PendingFetch {
    Profiles {
        query: ProfileQuery,
        request: BoxFuture<'static, FetchResult<Arc<Vec<Profile>>>>,
    },
    Measurements {
        id: ProfileId,
        request: BoxFuture<'static, Option<Arc<MeasurementSeries>>>,
    },
    Stats {
        request: BoxFuture<'static, FetchResult<ArgoStats>>,
    },
}

impl PendingFetch {
    pub fn resolve(self) -> BoxFuture<'static, Delivery> {
        match self {
            PendingFetch::Profiles { query, request } => async move {
                Delivery::Profiles {
                    result: request.await,
                    query,
                }
            }
            .boxed(),
            PendingFetch::Measurements { id, request } => async move {
                Delivery::Measurements {
                    series: request.await,
                    id,
                }
            }
            .boxed(),
            PendingFetch::Stats { request } => {
                async move { Delivery::Stats(request.await) }.boxed()
            }
        }
    }

    /// Profile query this fetch answers, if it is a list fetch.
    pub fn query(&self) -> Option<&ProfileQuery> {
        match self {
            PendingFetch::Profiles { query, .. } => Some(query),
            _ => None,
        }
    }

    /// Profile id this fetch answers, if it is a measurement fetch.
    pub fn profile_id(&self) -> Option<ProfileId> {
        match self {
            PendingFetch::Measurements { id, .. } => Some(*id),
            _ => None,
        }
    }
}

impl std::fmt::Debug for PendingFetch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PendingFetch::Profiles { query, .. } => write!(f, "PendingFetch::Profiles({query})"),
            PendingFetch::Measurements { id, .. } => write!(f, "PendingFetch::Measurements({id})"),
            PendingFetch::Stats { .. } => write!(f, "PendingFetch::Stats"),
        }
    }
}

/// A resolved fetch, still carrying the tag it was issued with.
#[derive(Debug, Clone)]
pub enum Delivery {
    Profiles {
        query: ProfileQuery,
        result: FetchResult<Arc<Vec<Profile>>>,
    },
    /// `None` covers both "fetch failed" and "backend has no series".
    Measurements {
        id: ProfileId,
        series: Option<Arc<MeasurementSeries>>,
    },
    Stats(FetchResult<ArgoStats>),
}
