//! Stateless HTTP request builder and response parser for the registry.
//!
//! # Design
//! `RegistryClient` holds only a `base_url` and carries no mutable state
//! between calls. A search is split into `build_search`, which produces an
//! `HttpRequest`, and `parse_search`, which consumes an `HttpResponse`.
//! The round-trip in between is someone else's job (`fetch::Fetcher` or a
//! host with its own HTTP stack), keeping this layer deterministic.

use serde_json::Value;
use url::Url;

use crate::error::SearchError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::normalize::{self, normalize_page};
use crate::query::format_query;
use crate::types::{ResultPage, SearchCriteria, PAGE_SIZE};

#[derive(Debug, Clone)]
pub struct RegistryClient {
    base_url: String,
}

impl RegistryClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Link to a company's own registry entry. Informational only; nothing
    /// in this crate fetches it.
    pub fn detail_url(&self, business_id: &str) -> String {
        normalize::detail_url(&self.base_url, business_id)
    }

    pub fn build_search(&self, criteria: &SearchCriteria) -> Result<HttpRequest, SearchError> {
        let endpoint = format!("{}/companies", self.base_url);
        let url = Url::parse_with_params(&endpoint, format_query(criteria))
            .map_err(|e| SearchError::InvalidUrl(format!("{endpoint}: {e}")))?;
        Ok(HttpRequest {
            method: HttpMethod::Get,
            url: url.into(),
            headers: vec![("accept".to_string(), "application/json".to_string())],
        })
    }

    /// Parse the registry's answer to a search for zero-based `page`.
    pub fn parse_search(&self, response: HttpResponse, page: u32) -> Result<ResultPage, SearchError> {
        check_status(&response)?;
        let payload: Value = serde_json::from_str(&response.body)
            .map_err(|e| SearchError::DeserializationError(e.to_string()))?;
        Ok(normalize_page(&payload, &self.base_url, page, PAGE_SIZE))
    }
}

fn check_status(response: &HttpResponse) -> Result<(), SearchError> {
    if response.is_success() {
        return Ok(());
    }
    Err(SearchError::HttpError {
        status: response.status,
        body: response.body.clone(),
    })
}
