//! End-to-end cycle against mock Stash, TMDB and image servers.

use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::json;
use tmdb_backdrop::config::Config;
use tmdb_backdrop::orchestrator::{CycleOutcome, Orchestrator};
use tmdb_backdrop::route::SharedLocation;
use tmdb_backdrop::style::{CssFileDocument, Document, MemoryDocument};
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];

fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.stash.url = server.uri();
    config.tmdb.api_url = format!("{}/3", server.uri());
    config.tmdb.image_base_url = format!("{}/img", server.uri());
    config.style.fade_ms = 20;
    config
}

async fn mount_stash(server: &MockServer, urls: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("configuration"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "configuration": { "plugins": {
                "tmdb-backdrop": { "TmdbApiKey": "tmdb-key" }
            } } }
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("findGroup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "findGroup": { "urls": urls } }
        })))
        .mount(server)
        .await;
}

fn page(config: &Config) -> Arc<MemoryDocument> {
    let document = Arc::new(MemoryDocument::new());
    document.insert_element(config.page.container_id.clone());
    document
}

#[tokio::test]
async fn group_page_gets_tmdb_backdrop() {
    let server = MockServer::start().await;
    mount_stash(
        &server,
        json!(["https://example.com/other", "https://www.themoviedb.org/movie/603-the-matrix"]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/3/movie/603/images"))
        .and(query_param("api_key", "tmdb-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 603,
            "backdrops": [{ "file_path": "/abc.jpg", "width": 1920, "height": 1080 }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/abc.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG_MAGIC))
        .expect(1)
        .mount(&server)
        .await;

    let config = config_for(&server);
    let document = page(&config);
    let location = Arc::new(SharedLocation::new("http://stash.local/groups/42"));
    let orchestrator = Orchestrator::from_config(&config, location, document.clone());

    let outcome = orchestrator.handle_route_change().await;

    assert_matches!(outcome, CycleOutcome::Applied { ref image_url, .. } if image_url == &format!("{}/img/abc.jpg", server.uri()));
    let css = document.style(&config.page.style_id).unwrap();
    assert!(css.contains("/img/abc.jpg"));
    assert!(css.contains("#group-page"));
}

#[tokio::test]
async fn tmdb_failure_leaves_page_untouched() {
    let server = MockServer::start().await;
    mount_stash(&server, json!(["https://www.themoviedb.org/tv/1399"])).await;

    Mock::given(method("GET"))
        .and(path("/3/tv/1399/images"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let document = page(&config);
    let location = Arc::new(SharedLocation::new("http://stash.local/groups/7"));
    let orchestrator = Orchestrator::from_config(&config, location, document.clone());

    assert_eq!(orchestrator.handle_route_change().await, CycleOutcome::Unchanged);
    assert_eq!(document.mutations(), 0);
}

#[tokio::test]
async fn broken_image_restores_previous_stylesheet() {
    let server = MockServer::start().await;
    mount_stash(&server, json!(["https://www.themoviedb.org/movie/603"])).await;

    Mock::given(method("GET"))
        .and(path("/3/movie/603/images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "backdrops": [{ "file_path": "/broken.jpg" }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/broken.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not found</html>"))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let document = page(&config);
    document
        .set_style(&config.page.style_id, "previous {}")
        .unwrap();
    let location = Arc::new(SharedLocation::new("http://stash.local/groups/42"));
    let orchestrator = Orchestrator::from_config(&config, location, document.clone());

    assert_eq!(orchestrator.handle_route_change().await, CycleOutcome::Unchanged);
    assert_eq!(
        document.style(&config.page.style_id).as_deref(),
        Some("previous {}")
    );
}

#[tokio::test]
async fn stylesheet_file_follows_backdrop_lifecycle() {
    let server = MockServer::start().await;
    mount_stash(&server, json!([])).await;

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("backdrop.css");
    std::fs::write(&output, "/* tmdb-dynamic-style */\nold {}\n").unwrap();

    let config = config_for(&server);
    let location = Arc::new(SharedLocation::new("http://stash.local/groups/42"));
    let orchestrator =
        Orchestrator::from_config(&config, location, Arc::new(CssFileDocument::new(&output)));

    assert_eq!(orchestrator.handle_route_change().await, CycleOutcome::Cleared);
    assert!(!output.exists());
}
