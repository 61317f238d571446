use listing_refinery::config::{ExtractionConfig, SegmentMode};
use listing_refinery::engine::ScrapeDispatcher;
use listing_refinery::network::ScrapeError;
use listing_refinery::refinery::ErrorResponse;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    std::fs::read_to_string(path).expect("fixture should exist")
}

async fn serve(route: &str, template: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(template)
        .expect(1)
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_scrape_end_to_end() {
    let server = serve(
        "/dap/filtracion3.html",
        ResponseTemplate::new(200).set_body_raw(fixture("cta_cards.html"), "text/html; charset=utf-8"),
    )
    .await;
    let url = format!("{}/dap/filtracion3.html", server.uri());

    let dispatcher = ScrapeDispatcher::new().unwrap();
    let response = dispatcher.scrape(Some(&url)).await.unwrap();

    assert_eq!(response.items.len(), 2);
    assert!(response.items.iter().all(|r| r.category == "filtracion"));
    assert!(response.items.iter().all(|r| r.category_url == url));
    assert_eq!(response.items[0].company_name, "Hidro Membranas");
}

#[tokio::test]
async fn test_scrape_reports_stats() {
    let server = serve(
        "/dap/agua.html",
        ResponseTemplate::new(200).set_body_raw(fixture("text_listings.html"), "text/html"),
    )
    .await;

    let config = ExtractionConfig::default().with_mode(SegmentMode::Gap);
    let dispatcher = ScrapeDispatcher::with_config(config, Duration::from_secs(5)).unwrap();
    let url = format!("{}/dap/agua.html", server.uri());
    let result = dispatcher.scrape_with_stats(Some(&url)).await.unwrap();

    assert_eq!(result.stats.mode, SegmentMode::Gap);
    assert_eq!(result.stats.records_emitted, 2);
    assert_eq!(result.stats.duplicates_dropped, 1);
    assert_eq!(result.records[0].category, "agua");
}

#[tokio::test]
async fn test_fetch_failure_has_no_partial_results() {
    let server = serve("/dap/filtracion.html", ResponseTemplate::new(500)).await;
    let url = format!("{}/dap/filtracion.html", server.uri());

    let dispatcher = ScrapeDispatcher::new().unwrap();
    let error = dispatcher.scrape(Some(&url)).await.unwrap_err();

    assert!(matches!(error, ScrapeError::UnexpectedStatus { status: 500, .. }));
    assert!(!error.is_caller_error());

    let envelope: serde_json::Value = serde_json::from_str(&ErrorResponse::new(&error).to_json()).unwrap();
    assert!(envelope["error"].as_str().unwrap().contains("500"));
}

#[tokio::test]
async fn test_missing_url_is_a_caller_error() {
    let dispatcher = ScrapeDispatcher::new().unwrap();

    let error = dispatcher.scrape(None).await.unwrap_err();
    assert!(error.is_caller_error());
    assert_eq!(ErrorResponse::new(&error).to_json(), r#"{"error":"Missing ?url"}"#);

    let error = dispatcher.scrape(Some("directorio.mx/dap/x.html")).await.unwrap_err();
    assert!(matches!(error, ScrapeError::InvalidUrl { .. }));
}

#[tokio::test]
async fn test_empty_page_yields_empty_items() {
    let server = serve(
        "/dap/vacio.html",
        ResponseTemplate::new(200).set_body_raw("<html><body><p>Sin resultados</p></body></html>", "text/html"),
    )
    .await;
    let url = format!("{}/dap/vacio.html", server.uri());

    let response = ScrapeDispatcher::new().unwrap().scrape(Some(&url)).await.unwrap();
    assert!(response.items.is_empty());
    assert_eq!(response.to_json(), r#"{"items":[]}"#);
}
