//! Search criteria and normalized result types.
//!
//! # Design
//! `SearchCriteria` is what a caller hands in; `CompanyRecord` and
//! `ResultPage` are what comes back out. All of them serialize in camelCase
//! so a host can pass them through as JSON unchanged. Records are flat and
//! string-only: the registry's loosely-typed payload is coerced into this
//! shape by `normalize`, never the other way around.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CriteriaError;

/// Number of companies the registry returns per page.
pub const PAGE_SIZE: u32 = 100;

static BUSINESS_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{7}-[0-9]$").expect("business id pattern compiles"));

/// Filters for one search request. `page` is zero-based.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_date_start: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_date_end: Option<NaiveDate>,
    #[serde(default)]
    pub page: u32,
}

impl SearchCriteria {
    pub fn with_business_id(mut self, business_id: impl Into<String>) -> Self {
        self.business_id = Some(business_id.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_registration_dates(
        mut self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Self {
        self.registration_date_start = start;
        self.registration_date_end = end;
        self
    }

    /// The same filters pointed at another page.
    pub fn at_page(&self, page: u32) -> Self {
        Self {
            page,
            ..self.clone()
        }
    }

    /// Trim the free-text fields and treat blank ones as unset, so that
    /// `"  "` and `None` hash and compare the same.
    pub fn normalized(mut self) -> Self {
        self.business_id = trimmed(self.business_id);
        self.location = trimmed(self.location);
        self
    }

    pub fn has_any_criterion(&self) -> bool {
        self.business_id.is_some()
            || self.location.is_some()
            || self.registration_date_start.is_some()
            || self.registration_date_end.is_some()
    }

    /// Check the preconditions a search must meet before it is dispatched.
    /// Expects an already `normalized` value.
    pub fn validate(&self) -> Result<(), CriteriaError> {
        if !self.has_any_criterion() {
            return Err(CriteriaError::Empty);
        }
        if let Some(id) = &self.business_id {
            if !BUSINESS_ID.is_match(id) {
                return Err(CriteriaError::InvalidBusinessId(id.clone()));
            }
        }
        if let Some(location) = &self.location {
            if !location.chars().any(char::is_alphabetic) {
                return Err(CriteriaError::InvalidLocation(location.clone()));
            }
        }
        if let (Some(start), Some(end)) = (self.registration_date_start, self.registration_date_end) {
            if start > end {
                return Err(CriteriaError::InvertedDateRange { start, end });
            }
        }
        Ok(())
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// One company, flattened. Every field is best-effort and may be empty
/// except `business_id`, which falls back to a positional placeholder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRecord {
    pub business_id: String,
    pub name: String,
    pub registration_date: String,
    /// Empty while the company is still active.
    pub end_date: String,
    pub company_form: String,
    pub location: String,
    pub detail_url: String,
}

/// One page of normalized results. `results` keeps the registry's order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPage {
    pub results: Vec<CompanyRecord>,
    pub total_results: u64,
    pub current_page: u32,
    pub total_pages: u64,
}

impl ResultPage {
    /// The page returned when there is nothing to show, whether because the
    /// payload was unusable or the request failed.
    pub fn empty(current_page: u32) -> Self {
        Self {
            results: Vec::new(),
            total_results: 0,
            current_page,
            total_pages: 0,
        }
    }
}

/// Result of a session search: the page to display plus whether the
/// request behind it failed. A failed search still carries an (empty) page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub page: ResultPage,
    pub error: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_criteria_are_rejected() {
        let err = SearchCriteria::default().validate().unwrap_err();
        assert_eq!(err, CriteriaError::Empty);
    }

    #[test]
    fn page_alone_is_not_a_criterion() {
        let criteria = SearchCriteria::default().at_page(3);
        assert_eq!(criteria.validate().unwrap_err(), CriteriaError::Empty);
    }

    #[test]
    fn well_formed_business_id_is_accepted() {
        let criteria = SearchCriteria::default().with_business_id("1234567-8");
        assert!(criteria.validate().is_ok());
    }

    #[test]
    fn malformed_business_ids_are_rejected() {
        for id in ["123456-7", "12345678", "1234567-89", "abcdefg-h", "1234567_8"] {
            let err = SearchCriteria::default().with_business_id(id).validate().unwrap_err();
            assert!(matches!(err, CriteriaError::InvalidBusinessId(_)), "{id}");
        }
    }

    #[test]
    fn location_needs_a_letter() {
        let err = SearchCriteria::default().with_location("00100").validate().unwrap_err();
        assert_eq!(err, CriteriaError::InvalidLocation("00100".to_string()));

        assert!(SearchCriteria::default().with_location("Hämeenlinna").validate().is_ok());
    }

    #[test]
    fn inverted_date_range_is_rejected() {
        let criteria = SearchCriteria::default()
            .with_registration_dates(Some(date(2024, 5, 1)), Some(date(2024, 1, 1)));
        assert!(matches!(
            criteria.validate(),
            Err(CriteriaError::InvertedDateRange { .. })
        ));
    }

    #[test]
    fn single_ended_or_equal_date_ranges_are_fine() {
        let d = date(2024, 1, 1);
        for (start, end) in [(Some(d), None), (None, Some(d)), (Some(d), Some(d))] {
            let criteria = SearchCriteria::default().with_registration_dates(start, end);
            assert!(criteria.validate().is_ok());
        }
    }

    #[test]
    fn normalized_drops_blank_text_fields() {
        let criteria = SearchCriteria::default()
            .with_business_id("  ")
            .with_location(" Oulu ")
            .normalized();
        assert_eq!(criteria.business_id, None);
        assert_eq!(criteria.location.as_deref(), Some("Oulu"));
    }

    #[test]
    fn criteria_deserialize_from_camel_case() {
        let criteria: SearchCriteria = serde_json::from_str(
            r#"{"businessId":"1234567-8","registrationDateStart":"2020-01-31","page":2}"#,
        )
        .unwrap();
        assert_eq!(criteria.business_id.as_deref(), Some("1234567-8"));
        assert_eq!(criteria.registration_date_start, Some(date(2020, 1, 31)));
        assert_eq!(criteria.page, 2);
        assert_eq!(criteria.location, None);
    }

    #[test]
    fn result_page_serializes_in_camel_case() {
        let json = serde_json::to_value(ResultPage::empty(4)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"results": [], "totalResults": 0, "currentPage": 4, "totalPages": 0})
        );
    }
}
