use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::info;

pub use axum::http::StatusCode;

pub const PAGE_SIZE: usize = 100;

/// In-memory stand-in for the registry. Companies are stored as raw JSON so
/// fixtures can use every shape the real service has been seen to return.
#[derive(Debug, Default)]
pub struct Registry {
    companies: Vec<Value>,
    failure: Option<StatusCode>,
    hits: AtomicUsize,
}

impl Registry {
    pub fn new(companies: Vec<Value>) -> Arc<Self> {
        Arc::new(Self {
            companies,
            ..Self::default()
        })
    }

    /// A registry that answers every search with `status`.
    pub fn failing(status: StatusCode) -> Arc<Self> {
        Arc::new(Self {
            failure: Some(status),
            ..Self::default()
        })
    }

    /// Number of searches served so far, failed ones included.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyQuery {
    pub business_id: Option<String>,
    pub location: Option<String>,
    pub registration_date_start: Option<String>,
    pub registration_date_end: Option<String>,
    pub total_results: Option<bool>,
    pub page: Option<usize>,
}

impl CompanyQuery {
    fn matches(&self, company: &Value) -> bool {
        if let Some(wanted) = &self.business_id {
            if business_id(company) != Some(wanted.as_str()) {
                return false;
            }
        }
        if let Some(wanted) = &self.location {
            let wanted = wanted.to_lowercase();
            if !current_cities(company).any(|city| city.to_lowercase().contains(&wanted)) {
                return false;
            }
        }
        if self.registration_date_start.is_some() || self.registration_date_end.is_some() {
            let Some(date) = registration_date(company) else {
                return false;
            };
            if self.registration_date_start.as_deref().is_some_and(|start| date < start) {
                return false;
            }
            if self.registration_date_end.as_deref().is_some_and(|end| date > end) {
                return false;
            }
        }
        true
    }
}

pub fn app() -> Router {
    app_with(Registry::new(sample_companies()))
}

pub fn app_with(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/companies", get(search_companies))
        .with_state(registry)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with(listener: TcpListener, registry: Arc<Registry>) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with(registry)).await
}

async fn search_companies(
    State(registry): State<Arc<Registry>>,
    Query(query): Query<CompanyQuery>,
) -> Result<Json<Value>, StatusCode> {
    registry.hits.fetch_add(1, Ordering::SeqCst);
    if let Some(status) = registry.failure {
        info!(%status, "answering search with scripted failure");
        return Err(status);
    }

    let matching: Vec<&Value> = registry
        .companies
        .iter()
        .filter(|company| query.matches(company))
        .collect();
    let page = query.page.unwrap_or(1).max(1);
    let companies: Vec<&Value> = matching
        .iter()
        .skip((page - 1).saturating_mul(PAGE_SIZE))
        .take(PAGE_SIZE)
        .copied()
        .collect();
    info!(page, matched = matching.len(), returned = companies.len(), "search served");

    let mut body = json!({ "companies": companies });
    if query.total_results == Some(true) {
        body["totalResults"] = json!(matching.len());
    }
    Ok(Json(body))
}

fn business_id(company: &Value) -> Option<&str> {
    match company.get("businessId")? {
        Value::String(id) => Some(id.as_str()),
        Value::Object(map) => map
            .get("value")
            .and_then(Value::as_str)
            .or_else(|| map.get("id").and_then(Value::as_str)),
        _ => None,
    }
}

fn registration_date(company: &Value) -> Option<&str> {
    match company.get("registrationDate") {
        Some(Value::String(date)) => Some(date.as_str()),
        Some(Value::Object(map)) => map
            .get("value")
            .and_then(Value::as_str)
            .or_else(|| map.get("registrationDate").and_then(Value::as_str)),
        _ => company.get("businessId")?.get("registrationDate")?.as_str(),
    }
}

fn current_cities(company: &Value) -> impl Iterator<Item = &str> {
    company
        .get("addresses")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|address| is_current(address))
        .filter_map(|address| address.get("postOffices")?.as_array())
        .flatten()
        .filter_map(|office| office.get("city")?.as_str())
}

/// No end date, or an empty one.
fn is_current(entry: &Value) -> bool {
    match entry.get("endDate") {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// A handful of companies covering the payload shapes the registry mixes:
/// plain and nested business ids, dates in three places, string and object
/// company forms, ended names and addresses.
pub fn sample_companies() -> Vec<Value> {
    vec![
        json!({
            "businessId": {"value": "1234567-8", "registrationDate": "2001-05-14", "source": "3"},
            "names": [
                {"name": "Vanha Nimi Oy", "language": "FI", "endDate": "2010-01-01"},
                {"name": "Pohjoisen Puu Ab", "language": "SE"},
                {"name": "Pohjoisen Puu Oy", "language": "FI"}
            ],
            "companyForms": [{"type": "16", "descriptions": [{"languageCode": "1", "description": "Osakeyhtiö"}]}],
            "addresses": [
                {"postCode": "00100", "postOffices": [{"city": "HELSINKI"}], "endDate": "2012-03-01"},
                {"postCode": "90100", "postOffices": [{"city": "OULU"}, {"city": "ULEÅBORG"}]}
            ]
        }),
        json!({
            "businessId": "2345678-9",
            "names": [{"name": "Kahvila Kulma", "language": "FI"}],
            "registrationDate": "2015-09-01",
            "companyForms": ["Toiminimi"],
            "addresses": [{"postCode": "90500", "postOffices": [{"city": "OULU"}]}]
        }),
        json!({
            "businessId": {"id": "3456789-0"},
            "names": [{"name": "Tampereen Kone Oy", "language": "FI"}],
            "registrationDate": {"value": "1998-02-20"},
            "companyForms": [{"name": "Osakeyhtiö"}],
            "addresses": [{"postCode": "33100", "postOffices": [{"city": "TAMPERE"}]}],
            "endDate": "2020-12-31"
        }),
        json!({
            "businessId": {},
            "names": [{"name": "Nimetön", "language": "SE"}],
            "registrationDate": {},
            "addresses": [{"postCode": "90100", "postOffices": [{"city": "OULU"}]}]
        }),
    ]
}

/// `count` plain companies in `city`, for paging tests. Ids are derived from
/// the position so they stay unique.
pub fn generated_companies(count: usize, city: &str) -> Vec<Value> {
    (0..count)
        .map(|n| {
            json!({
                "businessId": format!("{:07}-{}", 9_000_000 + n, n % 10),
                "names": [{"name": format!("Yritys {n} Oy"), "language": "FI"}],
                "registrationDate": "2020-01-01",
                "companyForms": ["OY"],
                "addresses": [{"postCode": "00100", "postOffices": [{"city": city}]}]
            })
        })
        .collect()
}
