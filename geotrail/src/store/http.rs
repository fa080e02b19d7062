//! HTTP remote store.
//!
//! Talks JSON to a small REST endpoint:
//!
//! | Operation | Request |
//! |---|---|
//! | single add | `POST {base}/locations` with one sample object |
//! | batch add | `POST {base}/locations/batch` with an array (all-or-nothing) |
//! | stale cleanup | `DELETE {base}/locations?before={epoch_ms}` |
//!
//! Samples are serialized as `{"latitude":..,"longitude":..,"timestamp_ms":..}`.
//! A cleanup response may carry `{"removed": n}`; anything else counts as
//! "unknown".

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;

use super::{BoxFuture, RemoteStore, StoreError};
use crate::location::LocationSample;

/// Default timeout for HTTP requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Deserialize)]
struct RemoveResponse {
    removed: Option<u64>,
}

/// Remote store backed by an HTTP JSON endpoint.
#[derive(Debug, Clone)]
pub struct HttpStore {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpStore {
    /// Create a store for the given base URL with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, StoreError> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a store with a custom per-request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, StoreError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(StoreError::Config(format!(
                "endpoint must be an http(s) URL, got '{}'",
                base_url
            )));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("geotrail/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StoreError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// The normalized base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

fn map_reqwest_error(e: reqwest::Error) -> StoreError {
    if e.is_timeout() {
        StoreError::Timeout
    } else if e.is_connect() {
        StoreError::Unreachable(e.to_string())
    } else {
        StoreError::Other(e.to_string())
    }
}

impl RemoteStore for HttpStore {
    fn add_location<'a>(&'a self, sample: &'a LocationSample) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            let request = self.client.post(self.url("locations")).json(sample);
            self.send(request).await?;
            Ok(())
        })
    }

    fn add_locations<'a>(
        &'a self,
        samples: &'a [LocationSample],
    ) -> BoxFuture<'a, Result<(), StoreError>> {
        Box::pin(async move {
            let request = self.client.post(self.url("locations/batch")).json(samples);
            self.send(request).await?;
            Ok(())
        })
    }

    fn remove_outdated(&self, before_ms: i64) -> BoxFuture<'_, Result<Option<u64>, StoreError>> {
        Box::pin(async move {
            let url = self.url(&format!("locations?before={}", before_ms));
            let request = self.client.delete(url);
            let response = self.send(request).await?;

            let removed = response
                .json::<RemoveResponse>()
                .await
                .ok()
                .and_then(|r| r.removed);
            Ok(removed)
        })
    }

    fn name(&self) -> &str {
        "http"
    }
}
