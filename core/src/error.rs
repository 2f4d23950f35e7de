//! Error types for the registry search core.
//!
//! # Design
//! `SearchError` covers everything between building a request and parsing
//! its response. Payloads are owned strings so the type is `Clone`: one
//! in-flight result may be handed to several waiters by the session.
//! `CriteriaError` is kept separate because it is raised before any I/O and
//! is meant to be shown to whoever typed the criteria.

use thiserror::Error;

/// Failures of a single search round-trip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The configured base URL could not be turned into a request URL.
    #[error("invalid request url: {0}")]
    InvalidUrl(String),

    /// The request never produced a response (connect, timeout, TLS, ...).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The registry answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body was not JSON.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),
}

/// Reasons a `SearchCriteria` may not be dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CriteriaError {
    #[error("at least one search criterion must be given")]
    Empty,

    #[error("business id {0:?} does not match the NNNNNNN-N format")]
    InvalidBusinessId(String),

    #[error("location {0:?} must contain at least one letter")]
    InvalidLocation(String),

    #[error("registration date range is inverted: {start} is after {end}")]
    InvertedDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },
}

/// A single upstream company entry that could not be normalized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("company entry {index} is not an object but {kind}")]
    NotAnObject { index: usize, kind: &'static str },
}

/// Invalid values in the environment-provided configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var} must be a whole number of seconds, got {value:?}")]
    InvalidSeconds { var: &'static str, value: String },

    #[error("{var} must be an absolute http(s) url, got {value:?}")]
    InvalidBaseUrl { var: &'static str, value: String },
}
