//! HTTP access to the ARGO backend.
//!
//! All endpoints live under `<base>/api`. Status handling:
//! - 404 becomes a `NotFound` error
//! - any other non-success status becomes `Status(code)`
//! - connection failures and timeouts become `Transport`
//! - bodies that do not parse become `Decode`

use std::time::Duration;

use foundation::ids::ProfileId;
use futures_util::future::BoxFuture;
use reqwest::{RequestBuilder, Response, StatusCode};
use scene::filter::ProfileQuery;
use scene::profile::{MeasurementSeries, Profile};
use serde::de::DeserializeOwned;
use streaming::error::{FetchError, FetchErrorKind};
use streaming::protocol::{ArgoStats, ChatReply, ChatRequest, MeasurementsPayload};
use streaming::source::ArgoSource;
use tracing::debug;

pub struct HttpSource {
    name: String,
    api_base: String,
    client: reqwest::Client,
}

impl HttpSource {
    /// Source for the backend at `base_url`, with `timeout` applied to every
    /// request.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                FetchError::with_source(FetchErrorKind::Transport, "failed to build HTTP client", e)
            })?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: &str, client: reqwest::Client) -> Self {
        let root = base_url.trim_end_matches('/');
        Self {
            name: format!("http {root}"),
            api_base: format!("{root}/api"),
            client,
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_base)
    }
}

async fn send(request: RequestBuilder, what: &str) -> Result<Response, FetchError> {
    let resp = request
        .send()
        .await
        .map_err(|e| {
            FetchError::with_source(
                FetchErrorKind::Transport,
                format!("{what}: request failed"),
                e,
            )
        })?;

    let status = resp.status();
    if status == StatusCode::NOT_FOUND {
        return Err(FetchError::not_found(what));
    }
    if !status.is_success() {
        return Err(FetchError::new(
            FetchErrorKind::Status(status.as_u16()),
            format!("{what}: request rejected"),
        ));
    }
    Ok(resp)
}

async fn body(resp: Response, what: &str) -> Result<Vec<u8>, FetchError> {
    let bytes = resp
        .bytes()
        .await
        .map_err(|e| {
            FetchError::with_source(
                FetchErrorKind::Transport,
                format!("{what}: failed to read response"),
                e,
            )
        })?;
    Ok(bytes.to_vec())
}

async fn json<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T, FetchError> {
    let bytes = body(resp, what).await?;
    serde_json::from_slice(&bytes).map_err(|e| {
        FetchError::with_source(
            FetchErrorKind::Decode,
            format!("{what}: invalid response body"),
            e,
        )
    })
}

impl ArgoSource for HttpSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn profiles(&self, query: &ProfileQuery) -> BoxFuture<'_, Result<Vec<Profile>, FetchError>> {
        debug!("GET /argo/profiles {query}");
        let request = self.client.get(self.url("/argo/profiles")).query(&query.params());
        Box::pin(async move {
            let resp = send(request, "profile list").await?;
            json(resp, "profile list").await
        })
    }

    fn measurements(&self, id: ProfileId) -> BoxFuture<'_, Result<MeasurementSeries, FetchError>> {
        let request = self
            .client
            .get(self.url(&format!("/argo/profiles/{id}/measurements")));
        Box::pin(async move {
            let what = format!("measurements for profile {id}");
            let resp = send(request, &what).await?;
            let payload: MeasurementsPayload = json(resp, &what).await?;
            payload.into_series(id)
        })
    }

    fn stats(&self) -> BoxFuture<'_, Result<ArgoStats, FetchError>> {
        let request = self.client.get(self.url("/argo/stats"));
        Box::pin(async move {
            let resp = send(request, "stats").await?;
            json(resp, "stats").await
        })
    }

    fn chat(&self, message: &str) -> BoxFuture<'_, Result<ChatReply, FetchError>> {
        let request = self.client.post(self.url("/chat/query")).json(&ChatRequest {
            message: message.to_string(),
        });
        Box::pin(async move {
            let resp = send(request, "chat query").await?;
            json(resp, "chat query").await
        })
    }

    fn export_csv(&self, query: &ProfileQuery) -> BoxFuture<'_, Result<Vec<u8>, FetchError>> {
        let request = self.client.get(self.url("/argo/export")).query(&query.export_params());
        Box::pin(async move {
            let resp = send(request, "export").await?;
            body(resp, "export").await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::HttpSource;
    use std::time::Duration;

    #[test]
    fn api_base_appends_prefix_once() {
        let a = HttpSource::with_client("http://127.0.0.1:8000/", reqwest::Client::new());
        assert_eq!(a.api_base(), "http://127.0.0.1:8000/api");
        assert_eq!(a.url("/argo/stats"), "http://127.0.0.1:8000/api/argo/stats");

        let b = HttpSource::new("https://argo.example.org", Duration::from_secs(5)).unwrap();
        assert_eq!(b.api_base(), "https://argo.example.org/api");
    }
}
