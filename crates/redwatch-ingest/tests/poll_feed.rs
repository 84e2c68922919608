// End-to-end poller behavior against a mocked upstream feed.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use redwatch_core::RedwatchConfig;
use redwatch_ingest::Poller;
use redwatch_store::{ContentKind, Store};

fn posts_body() -> serde_json::Value {
    json!({
        "data": { "children": [
            { "kind": "t3", "data": {
                "id": "p1", "title": "Arbitrage thread", "selftext": "daily discussion",
                "author": "mod_bot", "created_utc": 1700000000.0
            }},
            { "kind": "t3", "data": {
                "id": "p2", "title": "Media only post", "selftext": "",
                "author": "someone", "created_utc": 1700000050.0
            }}
        ]}
    })
}

fn comments_body() -> serde_json::Value {
    json!({
        "data": { "children": [
            { "kind": "t1", "data": {
                "id": "c1", "body": "top level reply", "author": "replier",
                "created_utc": 1700000100.0, "parent_id": "t3_p1"
            }},
            { "kind": "t1", "data": {
                "id": "c2", "body": "nested reply", "author": "deep",
                "created_utc": 1700000150.0, "parent_id": "t1_c1"
            }}
        ]}
    })
}

async fn mock_community(server: &MockServer, name: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/r/{name}/new.json")))
        .and(query_param("raw_json", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(posts_body()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/r/{name}/comments.json")))
        .and(query_param("raw_json", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(comments_body()))
        .mount(server)
        .await;
}

fn config_for(server: &MockServer) -> RedwatchConfig {
    let mut config = RedwatchConfig::default();
    config.upstream.base_url = server.uri();
    config
}

#[tokio::test]
async fn poll_community_persists_posts_and_top_level_comments() {
    let server = MockServer::start().await;
    mock_community(&server, "sportsbook").await;

    let store = Arc::new(Store::open_in_memory().unwrap());
    let poller = Poller::new(store.clone(), &config_for(&server)).unwrap();

    let items = poller.poll_community("sportsbook").await.unwrap();

    // Two posts plus the one top-level comment; the nested reply is dropped.
    assert_eq!(items.len(), 3);
    let posts = items.iter().filter(|i| i.kind == ContentKind::Post).count();
    assert_eq!(posts, 2);
    assert!(items.iter().any(|i| i.source_id == "c1"));
    assert!(!items.iter().any(|i| i.source_id == "c2"));

    let post = items.iter().find(|i| i.source_id == "p1").unwrap();
    assert_eq!(post.normalized_text, "arbitrage thread daily discussion");
    assert_eq!(post.community, "sportsbook");
}

#[tokio::test]
async fn second_poll_is_fully_deduplicated() {
    let server = MockServer::start().await;
    mock_community(&server, "sportsbook").await;

    let store = Arc::new(Store::open_in_memory().unwrap());
    let poller = Poller::new(store, &config_for(&server)).unwrap();

    let first = poller.poll_community("sportsbook").await.unwrap();
    assert_eq!(first.len(), 3);

    let second = poller.poll_community("sportsbook").await.unwrap();
    assert!(second.is_empty());
}

#[tokio::test]
async fn upstream_error_skips_community_but_not_the_rest() {
    let server = MockServer::start().await;

    // "broken" answers 500 on posts; "healthy" serves both feeds.
    Mock::given(method("GET"))
        .and(path("/r/broken/new.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mock_community(&server, "healthy").await;

    let store = Arc::new(Store::open_in_memory().unwrap());
    let t1 = store.create_tenant(None, 60).unwrap();
    store.add_community(&t1.id, "broken").unwrap();
    store.add_community(&t1.id, "healthy").unwrap();

    let poller = Poller::new(store.clone(), &config_for(&server)).unwrap();
    let results = poller.poll_all_active().await;

    assert_eq!(results.len(), 2);
    assert!(results["broken"].is_empty());
    assert_eq!(results["healthy"].len(), 3);
    assert!(results["healthy"].iter().all(|i| i.community == "healthy"));
}
