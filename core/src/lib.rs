//! Search core for the Finnish company registry open-data API.
//!
//! # Overview
//! Turns search criteria into a registry request, and the registry's
//! loosely-typed JSON answer into a stable page of flat company records.
//!
//! # Design
//! - `RegistryClient` is stateless: `build_search` produces a plain-data
//!   `HttpRequest`, `parse_search` consumes a plain-data `HttpResponse`.
//!   A host with its own HTTP stack can stop there.
//! - `normalize` holds the field-coercion policy and never fails a page.
//! - `Fetcher` runs the round-trip over a `Transport` and is fail-soft:
//!   every failure becomes an empty page.
//! - `SearchSession` adds validation, a short freshness window, in-flight
//!   deduplication and the error flag the fetcher does not expose.

pub mod client;
pub mod config;
pub mod error;
pub mod fetch;
pub mod http;
pub mod normalize;
pub mod query;
pub mod session;
pub mod types;

pub use client::RegistryClient;
pub use config::RegistryConfig;
pub use error::{ConfigError, CriteriaError, NormalizeError, SearchError};
pub use fetch::{Fetcher, ReqwestTransport, Transport};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use normalize::{normalize_company, normalize_page};
pub use query::format_query;
pub use session::SearchSession;
pub use types::{CompanyRecord, ResultPage, SearchCriteria, SearchOutcome, PAGE_SIZE};
