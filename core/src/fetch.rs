//! Executes registry searches end to end.
//!
//! # Design
//! `Fetcher` glues `RegistryClient` to a `Transport`: build the request,
//! send it, parse the answer. `fetch` is the fail-soft entry point and
//! always yields a `ResultPage`; every failure is logged and turned into an
//! empty page for the requested index. `try_fetch` runs the same pipeline
//! but hands the error back, for callers that keep their own error signal.
//!
//! The transport is a trait object so tests can script responses without a
//! socket. `ReqwestTransport` is the real one.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error};

use crate::client::RegistryClient;
use crate::config::RegistryConfig;
use crate::error::SearchError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{ResultPage, SearchCriteria};

/// Performs one HTTP round-trip. Non-2xx statuses are not errors at this
/// level; they come back as an `HttpResponse` for the client to judge.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, SearchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SearchError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, SearchError> {
        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                let value = value.to_str().ok()?;
                Some((name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Transport(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[derive(Clone)]
pub struct Fetcher {
    client: RegistryClient,
    transport: Arc<dyn Transport>,
}

impl Fetcher {
    pub fn new(client: RegistryClient, transport: Arc<dyn Transport>) -> Self {
        Self { client, transport }
    }

    /// A fetcher talking to `config.base_url` over reqwest.
    pub fn from_config(config: &RegistryConfig) -> Result<Self, SearchError> {
        let transport = ReqwestTransport::new(config.request_timeout)?;
        Ok(Self::new(
            RegistryClient::new(&config.base_url),
            Arc::new(transport),
        ))
    }

    pub fn client(&self) -> &RegistryClient {
        &self.client
    }

    pub async fn try_fetch(&self, criteria: &SearchCriteria) -> Result<ResultPage, SearchError> {
        let request = self.client.build_search(criteria)?;
        debug!(url = %request.url, method = request.method.as_str(), "querying registry");
        let response = self.transport.execute(request).await?;
        let page = self.client.parse_search(response, criteria.page)?;
        debug!(
            page = page.current_page,
            records = page.results.len(),
            total = page.total_results,
            "registry answered"
        );
        Ok(page)
    }

    /// Never fails: any error yields an empty page for `criteria.page`.
    pub async fn fetch(&self, criteria: &SearchCriteria) -> ResultPage {
        match self.try_fetch(criteria).await {
            Ok(page) => page,
            Err(err) => {
                error!(error = %err, page = criteria.page, "registry search failed");
                ResultPage::empty(criteria.page)
            }
        }
    }
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("client", &self.client)
            .finish_non_exhaustive()
    }
}
