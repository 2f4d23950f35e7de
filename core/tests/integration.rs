//! Searches against the live mock registry.
//!
//! # Design
//! Starts the mock registry on a random port in its own thread, then drives
//! the core two ways: the host-does-IO path (`build_search` / `parse_search`
//! with ureq doing the round-trip) and the async path (`Fetcher` and
//! `SearchSession` over `ReqwestTransport`).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mock_registry::{generated_companies, sample_companies, Registry, StatusCode};
use registry_core::{
    Fetcher, HttpRequest, HttpResponse, RegistryClient, RegistryConfig, ResultPage, SearchCriteria,
    SearchError, SearchSession,
};

fn spawn_registry(registry: Arc<Registry>) -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_registry::run_with(listener, registry).await
        })
        .unwrap();
    });

    addr
}

/// Execute an `HttpRequest` using ureq, handing 4xx/5xx back as data.
fn execute(req: HttpRequest) -> HttpResponse {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let mut builder = agent.get(&req.url);
    for (name, value) in &req.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    let mut response = builder.call().expect("HTTP transport error");

    HttpResponse {
        status: response.status().as_u16(),
        headers: Vec::new(),
        body: response.body_mut().read_to_string().unwrap_or_default(),
    }
}

fn config(addr: SocketAddr) -> RegistryConfig {
    RegistryConfig {
        base_url: format!("http://{addr}"),
        cache_ttl: Duration::from_secs(60),
        request_timeout: Duration::from_secs(5),
    }
}

#[test]
fn host_driven_search() {
    let addr = spawn_registry(Registry::new(sample_companies()));
    let client = RegistryClient::new(&format!("http://{addr}"));

    let criteria = SearchCriteria::default().with_location("Oulu");
    let req = client.build_search(&criteria).unwrap();
    let page = client.parse_search(execute(req), criteria.page).unwrap();

    assert_eq!(page.total_results, 3);
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.current_page, 0);

    let first = &page.results[0];
    assert_eq!(first.business_id, "1234567-8");
    assert_eq!(first.name, "Pohjoisen Puu Oy");
    assert_eq!(first.registration_date, "2001-05-14");
    assert_eq!(first.company_form, "Osakeyhtiö");
    assert_eq!(first.location, "90100 OULU");
    assert_eq!(first.detail_url, format!("http://{addr}/companies/1234567-8"));

    let second = &page.results[1];
    assert_eq!(second.business_id, "2345678-9");
    assert_eq!(second.company_form, "Toiminimi");
    assert_eq!(second.location, "90500 OULU");

    let anonymous = &page.results[2];
    assert_eq!(anonymous.business_id, "company-2");
    assert_eq!(anonymous.name, "Nimetön");
    assert_eq!(anonymous.registration_date, "");
}

#[test]
fn host_driven_search_sees_http_errors() {
    let addr = spawn_registry(Registry::failing(StatusCode::INTERNAL_SERVER_ERROR));
    let client = RegistryClient::new(&format!("http://{addr}"));

    let criteria = SearchCriteria::default().with_business_id("1234567-8");
    let req = client.build_search(&criteria).unwrap();
    let err = client.parse_search(execute(req), 0).unwrap_err();
    assert!(matches!(err, SearchError::HttpError { status: 500, .. }));
}

#[tokio::test]
async fn fetcher_walks_every_page() {
    let addr = spawn_registry(Registry::new(generated_companies(250, "ESPOO")));
    let fetcher = Fetcher::from_config(&config(addr)).unwrap();
    let criteria = SearchCriteria::default().with_location("Espoo");

    let first = fetcher.fetch(&criteria).await;
    assert_eq!(first.total_results, 250);
    assert_eq!(first.total_pages, 3);
    assert_eq!(first.results.len(), 100);

    let last = fetcher.fetch(&criteria.at_page(2)).await;
    assert_eq!(last.current_page, 2);
    assert_eq!(last.results.len(), 50);
    assert_eq!(last.results[0].business_id, "9000200-0");
    assert_eq!(last.results[0].name, "Yritys 200 Oy");
    assert_eq!(last.results[0].company_form, "OY");
}

#[tokio::test]
async fn fetcher_fails_soft_on_http_500() {
    let addr = spawn_registry(Registry::failing(StatusCode::INTERNAL_SERVER_ERROR));
    let fetcher = Fetcher::from_config(&config(addr)).unwrap();

    let page = fetcher
        .fetch(&SearchCriteria::default().with_location("Oulu").at_page(1))
        .await;
    assert_eq!(page, ResultPage::empty(1));
}

#[tokio::test]
async fn fetcher_fails_soft_when_nothing_listens() {
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let fetcher = Fetcher::from_config(&config(addr)).unwrap();
    let criteria = SearchCriteria::default().with_location("Oulu");

    assert_eq!(fetcher.fetch(&criteria).await, ResultPage::empty(0));
    assert!(matches!(
        fetcher.try_fetch(&criteria).await,
        Err(SearchError::Transport(_))
    ));
}

#[tokio::test]
async fn session_caches_and_flags_errors() {
    let registry = Registry::new(sample_companies());
    let addr = spawn_registry(registry.clone());
    let session = SearchSession::from_config(&config(addr)).unwrap();
    let criteria = SearchCriteria::default().with_location("Tampere");

    let first = session.search(criteria.clone()).await.unwrap();
    let again = session.search(criteria).await.unwrap();
    assert!(!first.error);
    assert_eq!(first, again);
    assert_eq!(first.page.results[0].end_date, "2020-12-31");
    assert_eq!(registry.hits(), 1);

    let failing = Registry::failing(StatusCode::BAD_GATEWAY);
    let addr = spawn_registry(failing.clone());
    let session = SearchSession::from_config(&config(addr)).unwrap();
    let outcome = session
        .search(SearchCriteria::default().with_location("Tampere"))
        .await
        .unwrap();
    assert!(outcome.error);
    assert_eq!(outcome.page, ResultPage::empty(0));
    assert_eq!(failing.hits(), 1);
}
