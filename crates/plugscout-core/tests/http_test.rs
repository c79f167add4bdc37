mod common;

use common::FixtureServer;
use plugscout_core::{HttpClient, ScoutError};

const LIMIT: usize = 1024;

fn client(limit: usize) -> HttpClient {
    HttpClient::new().unwrap().with_max_body(limit)
}

#[tokio::test]
async fn body_at_the_limit_without_length_is_accepted() {
    let server = FixtureServer::start().await;
    server.route_without_length("/exact", 200, vec![b'x'; LIMIT]);

    let body = client(LIMIT).get_bytes(&server.url("/exact")).await.unwrap();
    assert_eq!(body.len(), LIMIT);
}

#[tokio::test]
async fn body_past_the_limit_without_length_is_rejected() {
    let server = FixtureServer::start().await;
    server.route_without_length("/over", 200, vec![b'x'; LIMIT + 1]);

    let err = client(LIMIT)
        .get_bytes(&server.url("/over"))
        .await
        .unwrap_err();
    assert!(matches!(err, ScoutError::ResponseTooLarge { limit: LIMIT, .. }));
}

#[tokio::test]
async fn body_at_the_limit_with_length_is_accepted() {
    let server = FixtureServer::start().await;
    server.route("/exact", 200, vec![b'x'; LIMIT]);

    let body = client(LIMIT).get_bytes(&server.url("/exact")).await.unwrap();
    assert_eq!(body.len(), LIMIT);
}

#[tokio::test]
async fn body_past_the_limit_with_length_is_rejected() {
    let server = FixtureServer::start().await;
    server.route("/over", 200, vec![b'x'; LIMIT + 1]);

    let err = client(LIMIT)
        .get_bytes(&server.url("/over"))
        .await
        .unwrap_err();
    assert!(matches!(err, ScoutError::ResponseTooLarge { limit: LIMIT, .. }));
}

#[tokio::test]
async fn streamed_limit_holds_across_many_chunks() {
    let limit = 256 * 1024;
    let server = FixtureServer::start().await;
    server.route_without_length("/exact", 200, vec![b'x'; limit]);
    server.route_without_length("/over", 200, vec![b'x'; limit + 1]);

    let body = client(limit).get_bytes(&server.url("/exact")).await.unwrap();
    assert_eq!(body.len(), limit);

    let err = client(limit)
        .get_bytes(&server.url("/over"))
        .await
        .unwrap_err();
    assert!(matches!(err, ScoutError::ResponseTooLarge { .. }));
}
