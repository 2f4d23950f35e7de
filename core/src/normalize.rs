//! Coerces the registry's loosely-typed company payload into `ResultPage`.
//!
//! # Design
//! The registry is inconsistent about several fields: the business id, the
//! registration date and the company form each show up as a plain string,
//! as an object under one of a few key names, or not at all. Every field is
//! resolved by the same ordered probe: plain string first, then the known
//! object shapes, then a textual rendering of whatever is there. Nothing in
//! here fails a whole page. A company entry that cannot be read at all is
//! replaced by a flagged placeholder record at the same position, and a
//! payload without a `companies` array becomes an empty page.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::NormalizeError;
use crate::types::{CompanyRecord, ResultPage};

/// Display name given to placeholder records for unreadable entries.
pub const ERROR_RECORD_NAME: &str = "Error processing data";

/// Renderings that carry no information for a human reader.
const PLACEHOLDER_MARKERS: &[&str] = &["{}", "[]", "null", "[object Object]"];

/// Language tag of the name variant preferred for display.
const PREFERRED_LANGUAGE: &str = "FI";

/// Build a page from a decoded registry payload.
///
/// `page` is the zero-based index that was requested; it is carried into the
/// result as is. `totalResults` is trusted when present, otherwise the number
/// of records on this page stands in for it.
pub fn normalize_page(payload: &Value, base_url: &str, page: u32, page_size: u32) -> ResultPage {
    let Some(companies) = payload.get("companies").and_then(Value::as_array) else {
        debug!(page, "registry payload has no companies array");
        return ResultPage::empty(page);
    };

    let results: Vec<CompanyRecord> = companies
        .iter()
        .enumerate()
        .map(|(index, company)| {
            normalize_company(company, index, base_url).unwrap_or_else(|err| {
                warn!(index, error = %err, "replacing unreadable company entry");
                error_record(index)
            })
        })
        .collect();

    let total_results = total_results(payload).unwrap_or(results.len() as u64);
    let total_pages = if page_size == 0 {
        0
    } else {
        total_results.div_ceil(u64::from(page_size))
    };

    ResultPage {
        results,
        total_results,
        current_page: page,
        total_pages,
    }
}

/// Flatten one upstream company entry. `index` is its position in the batch
/// and seeds the placeholder id when no usable business id is present.
pub fn normalize_company(
    company: &Value,
    index: usize,
    base_url: &str,
) -> Result<CompanyRecord, NormalizeError> {
    let company = company.as_object().ok_or(NormalizeError::NotAnObject {
        index,
        kind: kind_of(company),
    })?;

    let business_id = resolve_business_id(company, index);
    let detail_url = detail_url(base_url, &business_id);

    Ok(CompanyRecord {
        name: resolve_name(company),
        registration_date: resolve_registration_date(company),
        end_date: company.get("endDate").map(coerce_text).unwrap_or_default(),
        company_form: resolve_company_form(company),
        location: resolve_location(company),
        detail_url,
        business_id,
    })
}

/// Link to a company's own registry entry under `base_url`.
pub fn detail_url(base_url: &str, business_id: &str) -> String {
    format!("{base_url}/companies/{business_id}")
}

/// Placeholder emitted in place of an entry that could not be normalized.
pub fn error_record(index: usize) -> CompanyRecord {
    CompanyRecord {
        business_id: format!("error-{index}"),
        name: ERROR_RECORD_NAME.to_string(),
        ..CompanyRecord::default()
    }
}

fn total_results(payload: &Value) -> Option<u64> {
    match payload.get("totalResults")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn resolve_name(company: &Map<String, Value>) -> String {
    let Some(names) = company.get("names").and_then(Value::as_array) else {
        return String::new();
    };

    let current_finnish = names
        .iter()
        .filter(|entry| is_current(entry))
        .find(|entry| {
            entry
                .get("language")
                .and_then(Value::as_str)
                .is_some_and(|lang| lang.eq_ignore_ascii_case(PREFERRED_LANGUAGE))
        })
        .map(name_of)
        .filter(|name| !name.is_empty());

    current_finnish
        .or_else(|| names.first().map(name_of))
        .unwrap_or_default()
}

fn name_of(entry: &Value) -> String {
    match entry {
        Value::Object(map) => map.get("name").map(coerce_text).unwrap_or_default(),
        other => coerce_text(other),
    }
}

fn resolve_business_id(company: &Map<String, Value>, index: usize) -> String {
    let resolved = match company.get("businessId") {
        Some(Value::String(id)) => Some(id.clone()),
        Some(Value::Object(map)) => string_field(map, "value").or_else(|| string_field(map, "id")),
        _ => None,
    };
    resolved.unwrap_or_else(|| format!("company-{index}"))
}

fn resolve_registration_date(company: &Map<String, Value>) -> String {
    let Some(value) = company.get("registrationDate") else {
        return nested_registration_date(company);
    };
    match value {
        Value::String(date) => date.clone(),
        Value::Object(map) => string_field(map, "value")
            .or_else(|| string_field(map, "registrationDate"))
            .unwrap_or_else(|| coerce_text(value)),
        Value::Null => nested_registration_date(company),
        other => coerce_text(other),
    }
}

/// The v3 schema keeps the registration date inside the business id object.
fn nested_registration_date(company: &Map<String, Value>) -> String {
    company
        .get("businessId")
        .and_then(Value::as_object)
        .and_then(|id| string_field(id, "registrationDate"))
        .unwrap_or_default()
}

fn resolve_company_form(company: &Map<String, Value>) -> String {
    let Some(form) = company
        .get("companyForms")
        .and_then(Value::as_array)
        .and_then(|forms| forms.first())
    else {
        return String::new();
    };

    match form {
        Value::String(label) => label.clone(),
        Value::Object(map) => string_field(map, "name")
            .filter(|name| !name.is_empty())
            .or_else(|| first_description(map))
            .unwrap_or_else(|| coerce_text(form)),
        other => coerce_text(other),
    }
}

fn first_description(form: &Map<String, Value>) -> Option<String> {
    form.get("descriptions")?
        .as_array()?
        .iter()
        .find_map(|d| d.get("description").and_then(Value::as_str))
        .map(str::to_string)
}

fn resolve_location(company: &Map<String, Value>) -> String {
    let Some(address) = company
        .get("addresses")
        .and_then(Value::as_array)
        .and_then(|addresses| addresses.iter().find(|a| a.is_object() && is_current(a)))
    else {
        return String::new();
    };

    let post_code = address.get("postCode").map(coerce_text).unwrap_or_default();
    let city = address
        .get("postOffices")
        .and_then(Value::as_array)
        .and_then(|offices| offices.first())
        .and_then(|office| office.get("city"))
        .map(coerce_text)
        .unwrap_or_default();

    format!("{post_code} {city}").trim().to_string()
}

/// An entry is current when it has no end date, or an empty one.
fn is_current(entry: &Value) -> bool {
    match entry.get("endDate") {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Last-resort rendering of any JSON value as display text.
fn coerce_text(value: &Value) -> String {
    let text = match value {
        Value::Null => return String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    };
    if PLACEHOLDER_MARKERS.contains(&text.as_str()) {
        String::new()
    } else {
        text
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
