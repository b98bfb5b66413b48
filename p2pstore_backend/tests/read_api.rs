mod common;

use common::{photo_message, text_message, Fixture};
use p2pstore_backend::config::PLACEHOLDER_PNG;
use p2pstore_backend::api;
use p2pstore_backend::node::P2pStoreNode;
use reqwest::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE, ORIGIN};
use reqwest::StatusCode;
use serde_json::Value;
use tokio::time::{sleep, Duration};

const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

struct TestServer {
    _node: P2pStoreNode,
    server: tokio::task::JoinHandle<()>,
    base_url: String,
}

impl TestServer {
    async fn shutdown(self) {
        self.server.abort();
        let _ = self.server.await;
    }
}

fn next_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .expect("bind ephemeral port")
        .local_addr()
        .unwrap()
        .port()
}

async fn wait_for_health(base_url: &str) {
    let client = reqwest::Client::new();
    for _ in 0..50 {
        if let Ok(resp) = client.get(format!("{base_url}/health")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        sleep(Duration::from_millis(100)).await;
    }
    panic!("server did not become healthy in time");
}

/// Syncs an album listing (3 with follow-ons 1, 2) and a text listing (5),
/// then serves them.
async fn start_server(fx: &Fixture) -> TestServer {
    fx.write_export(vec![
        text_message(5, Some(8), "WTB lamp"),
        photo_message(3, 7, "Bike for sale"),
        photo_message(2, 7, ""),
        photo_message(1, 7, ""),
    ]);
    for id in 1..=3 {
        fx.write_photo(id, format!("jpeg {id}").as_bytes());
    }

    let node = P2pStoreNode::start(fx.config.clone()).await.expect("start");
    node.run_sync().await.expect("sync");

    let config = node.config().clone();
    let index = node.index();
    let server = tokio::spawn(async move {
        let _ = api::serve_http(config, index).await;
    });

    let base_url = format!("http://127.0.0.1:{}", fx.config.api_port);
    wait_for_health(&base_url).await;
    TestServer {
        _node: node,
        server,
        base_url,
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn lists_ids_and_returns_listing_data() {
    let fx = Fixture::new(next_port());
    let server = start_server(&fx).await;
    let client = reqwest::Client::new();

    let ids: Vec<i64> = client
        .get(format!("{}/telegram/market", server.base_url))
        .send()
        .await
        .expect("ids response")
        .json()
        .await
        .expect("ids json");
    assert_eq!(ids, vec![3, 5]);

    let listing: Value = client
        .get(format!("{}/telegram/market?msg_id=3", server.base_url))
        .send()
        .await
        .expect("listing response")
        .json()
        .await
        .expect("listing json");
    assert_eq!(listing["primary"]["id"], 3);
    assert_eq!(listing["primary"]["caption"], "Bike for sale");
    assert_eq!(listing["follow_ons"].as_array().map(Vec::len), Some(2));
    assert_eq!(listing["media"][0]["name"], "photo_3.jpg");
    assert_eq!(listing["media"][0]["type"], "photo");

    let unknown: Value = client
        .get(format!("{}/telegram/market?msg_id=999", server.base_url))
        .send()
        .await
        .expect("unknown response")
        .json()
        .await
        .expect("unknown json");
    assert_eq!(unknown, serde_json::json!({}));

    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn streams_files_and_placeholder() {
    let fx = Fixture::new(next_port());
    let server = start_server(&fx).await;
    let client = reqwest::Client::new();

    let photo = client
        .get(format!("{}/telegram/market?msg_id=3&photo=true", server.base_url))
        .send()
        .await
        .expect("photo response");
    assert_eq!(photo.status(), StatusCode::OK);
    assert_eq!(photo.headers()[CONTENT_TYPE], "image/jpeg");
    assert_eq!(photo.bytes().await.expect("photo body").as_ref(), b"jpeg 3");

    // Photos carry no thumbnail, so the primary is served instead.
    let thumb = client
        .get(format!("{}/telegram/market?msg_id=3&thumb=true", server.base_url))
        .send()
        .await
        .expect("thumb response");
    assert_eq!(thumb.bytes().await.expect("thumb body").as_ref(), b"jpeg 3");

    let placeholder = client
        .get(format!("{}/telegram/market?msg_id=5&photo=true", server.base_url))
        .send()
        .await
        .expect("placeholder response");
    assert_eq!(placeholder.headers()[CONTENT_TYPE], "image/png");
    let body = placeholder.bytes().await.expect("placeholder body");
    assert!(body.starts_with(&PNG_HEADER));
    assert_eq!(body.as_ref(), PLACEHOLDER_PNG);

    let bad = client
        .get(format!("{}/telegram/market?photo=true", server.base_url))
        .send()
        .await
        .expect("bad response");
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn text_listing_streams_follow_on_photo() {
    let fx = Fixture::new(next_port());
    fx.write_export(vec![
        text_message(5, Some(8), "WTB lamp, like this one"),
        photo_message(4, 8, ""),
    ]);
    fx.write_photo(4, b"jpeg 4");

    let node = P2pStoreNode::start(fx.config.clone()).await.expect("start");
    node.run_sync().await.expect("sync");
    let config = node.config().clone();
    let index = node.index();
    let server = tokio::spawn(async move {
        let _ = api::serve_http(config, index).await;
    });
    let base_url = format!("http://127.0.0.1:{}", fx.config.api_port);
    wait_for_health(&base_url).await;

    let photo = reqwest::get(format!("{base_url}/telegram/market?msg_id=5&photo=true"))
        .await
        .expect("photo response");
    assert_eq!(photo.status(), StatusCode::OK);
    assert_eq!(photo.headers()[CONTENT_TYPE], "image/jpeg");
    assert_eq!(photo.bytes().await.expect("photo body").as_ref(), b"jpeg 4");

    server.abort();
    let _ = server.await;
    drop(node);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn placeholder_survives_a_deleted_file() {
    let fx = Fixture::new(next_port());
    let server = start_server(&fx).await;
    std::fs::remove_file(&fx.config.paths.placeholder_image).expect("remove placeholder");

    let response = reqwest::get(format!("{}/telegram/market?msg_id=5&thumb=true", server.base_url))
        .await
        .expect("placeholder response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "image/png");
    assert_eq!(
        response.bytes().await.expect("placeholder body").as_ref(),
        PLACEHOLDER_PNG
    );

    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cors_allows_only_configured_origins() {
    let fx = Fixture::new(next_port());
    let server = start_server(&fx).await;
    let client = reqwest::Client::new();

    let allowed = client
        .get(format!("{}/telegram/market", server.base_url))
        .header(ORIGIN, "http://localhost:3000")
        .send()
        .await
        .expect("allowed response");
    assert_eq!(
        allowed.headers()[ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:3000"
    );

    let denied = client
        .get(format!("{}/telegram/market", server.base_url))
        .header(ORIGIN, "http://evil.example")
        .send()
        .await
        .expect("denied response");
    assert!(denied.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());

    server.shutdown().await;
}
