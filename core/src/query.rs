//! Maps `SearchCriteria` onto the registry's query-parameter names.
//!
//! Only parameters that are set are emitted, followed by the two the
//! registry always gets: `totalResults=true` and the one-based `page`.
//! Values are not URL-encoded here; `RegistryClient` does that when it
//! assembles the request URL.

use crate::types::SearchCriteria;

pub const BUSINESS_ID: &str = "businessId";
pub const LOCATION: &str = "location";
pub const REGISTRATION_DATE_START: &str = "registrationDateStart";
pub const REGISTRATION_DATE_END: &str = "registrationDateEnd";
pub const TOTAL_RESULTS: &str = "totalResults";
pub const PAGE: &str = "page";

pub fn format_query(criteria: &SearchCriteria) -> Vec<(String, String)> {
    let mut params = Vec::with_capacity(6);

    if let Some(id) = &criteria.business_id {
        params.push((BUSINESS_ID.to_string(), id.clone()));
    }
    if let Some(location) = &criteria.location {
        params.push((LOCATION.to_string(), location.clone()));
    }
    if let Some(start) = criteria.registration_date_start {
        params.push((REGISTRATION_DATE_START.to_string(), start.format("%Y-%m-%d").to_string()));
    }
    if let Some(end) = criteria.registration_date_end {
        params.push((REGISTRATION_DATE_END.to_string(), end.format("%Y-%m-%d").to_string()));
    }

    params.push((TOTAL_RESULTS.to_string(), "true".to_string()));
    // The registry counts pages from 1.
    params.push((PAGE.to_string(), (u64::from(criteria.page) + 1).to_string()));

    params
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::*;

    fn keys(params: &[(String, String)]) -> Vec<&str> {
        params.iter().map(|(k, _)| k.as_str()).collect()
    }

    #[test]
    fn page_only_criteria_produce_only_the_fixed_parameters() {
        for page in [0, 1, 41] {
            let params = format_query(&SearchCriteria::default().at_page(page));
            assert_eq!(keys(&params), vec![TOTAL_RESULTS, PAGE]);
            assert_eq!(params[1].1, (page + 1).to_string());
        }
    }

    #[test]
    fn all_criteria_are_emitted_in_order() {
        let criteria = SearchCriteria::default()
            .with_business_id("1234567-8")
            .with_location("Espoo")
            .with_registration_dates(
                NaiveDate::from_ymd_opt(2020, 1, 2),
                NaiveDate::from_ymd_opt(2021, 12, 31),
            )
            .at_page(2);

        assert_eq!(
            format_query(&criteria),
            vec![
                ("businessId".to_string(), "1234567-8".to_string()),
                ("location".to_string(), "Espoo".to_string()),
                ("registrationDateStart".to_string(), "2020-01-02".to_string()),
                ("registrationDateEnd".to_string(), "2021-12-31".to_string()),
                ("totalResults".to_string(), "true".to_string()),
                ("page".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn unset_criteria_are_omitted() {
        let criteria = SearchCriteria::default().with_registration_dates(
            None,
            NaiveDate::from_ymd_opt(2001, 3, 4),
        );
        assert_eq!(
            keys(&format_query(&criteria)),
            vec![REGISTRATION_DATE_END, TOTAL_RESULTS, PAGE]
        );
    }

    #[test]
    fn last_page_index_does_not_overflow() {
        let params = format_query(&SearchCriteria::default().at_page(u32::MAX));
        assert_eq!(params[1].1, "4294967296");
    }
}
