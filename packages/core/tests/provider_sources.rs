//! Vendor balance sources against wiremocked vendor APIs.

use serde_json::json;
use tempfile::TempDir;
use wiremock::{
    matchers::{body_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use wallet_monitor::{
    balance::{BalanceSource, SourceError},
    cache::TokenCache,
    services::{arvan::ArvanClient, hamravesh::HamraveshClient},
};

// ---- Arvan ------------------------------------------------------------------

async fn mount_arvan_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/auth/login"))
        .and(header("origin", "https://accounts.arvancloud.ir"))
        .and(header("x-redirect-uri", "https://panel.arvancloud.ir/"))
        .and(body_json(json!({
            "email": "ops@example.com",
            "password": "pw",
            "captcha": "v3.undefined"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "accessToken": "acc-1",
                "refreshToken": "ref-1",
                "defaultAccount": 77
            }
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_arvan_refresh(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/auth/refresh-token"))
        .and(header("authorization", "Bearer acc-1.77"))
        .and(body_json(json!({ "refreshToken": "ref-1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "accessToken": "acc-2" }
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn arvan(server: &MockServer) -> ArvanClient {
    ArvanClient::new(server.uri(), server.uri(), "ops@example.com", "pw")
}

#[tokio::test]
async fn arvan_logs_in_refreshes_and_reads_wallet() {
    let server = MockServer::start().await;
    mount_arvan_login(&server).await;
    mount_arvan_refresh(&server).await;
    Mock::given(method("GET"))
        .and(path("/resid/v1/wallets/me"))
        .and(header("authorization", "Bearer acc-2.77"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "totalBalance": "12345678.9" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reading = arvan(&server).fetch_balance().await.unwrap();

    assert_eq!(reading.value, 12_345_678);
    assert_eq!(reading.unit, "IRR");
}

#[tokio::test]
async fn arvan_rejected_login_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/login"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = arvan(&server).fetch_balance().await.unwrap_err();
    assert!(matches!(err, SourceError::Auth { .. }), "got {:?}", err);
}

#[tokio::test]
async fn arvan_login_outage_is_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/login"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = arvan(&server).fetch_balance().await.unwrap_err();
    assert!(matches!(err, SourceError::Network { .. }), "got {:?}", err);
}

#[tokio::test]
async fn arvan_wallet_outage_is_network_error() {
    let server = MockServer::start().await;
    mount_arvan_login(&server).await;
    mount_arvan_refresh(&server).await;
    Mock::given(method("GET"))
        .and(path("/resid/v1/wallets/me"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = arvan(&server).fetch_balance().await.unwrap_err();
    assert!(matches!(err, SourceError::Network { .. }), "got {:?}", err);
}

#[tokio::test]
async fn arvan_non_numeric_balance_is_format_error() {
    let server = MockServer::start().await;
    mount_arvan_login(&server).await;
    mount_arvan_refresh(&server).await;
    Mock::given(method("GET"))
        .and(path("/resid/v1/wallets/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "totalBalance": "unknown" }
        })))
        .mount(&server)
        .await;

    let err = arvan(&server).fetch_balance().await.unwrap_err();
    assert!(matches!(err, SourceError::Format { .. }), "got {:?}", err);
}

// ---- Hamravesh --------------------------------------------------------------

struct Hamravesh {
    _dir: TempDir,
    cache: TokenCache,
    client: HamraveshClient,
}

fn hamravesh(server: &MockServer, cached: Option<&str>) -> Hamravesh {
    let dir = TempDir::new().unwrap();
    let cache = TokenCache::new(dir.path().join("token-cache.json"));
    if let Some(token) = cached {
        cache.store(token);
    }
    let client = HamraveshClient::new(
        server.uri(),
        "ops@example.com",
        "pw",
        Some("session=abc".to_string()),
        cache.clone(),
    );
    Hamravesh {
        _dir: dir,
        cache,
        client,
    }
}

async fn mount_profile(server: &MockServer, token: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/api/v2/users/profile"))
        .and(header("authorization", format!("Token {}", token).as_str()))
        .respond_with(response)
        .mount(server)
        .await;
}

fn profile_with_balance(balance: i64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "organizations": [ { "name": "main", "balance": balance } ]
    }))
}

async fn mount_login(server: &MockServer, response: ResponseTemplate, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/api/v1/users/login"))
        .and(header("user-agent", "insomnia/11.2.0"))
        .and(header("cookie", "session=abc"))
        .respond_with(response)
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn hamravesh_uses_cached_token_without_login() {
    let server = MockServer::start().await;
    mount_profile(&server, "cached", profile_with_balance(4_500)).await;
    mount_login(&server, ResponseTemplate::new(500), 0).await;

    let h = hamravesh(&server, Some("cached"));
    let reading = h.client.fetch_balance().await.unwrap();

    assert_eq!(reading.value, 4_500);
    assert_eq!(h.cache.load().as_deref(), Some("cached"));
}

#[tokio::test]
async fn hamravesh_stale_token_triggers_one_login() {
    let server = MockServer::start().await;
    mount_profile(&server, "stale", ResponseTemplate::new(401)).await;
    mount_profile(&server, "fresh", profile_with_balance(9_000)).await;
    mount_login(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "key": "fresh" })),
        1,
    )
    .await;

    let h = hamravesh(&server, Some("stale"));
    let reading = h.client.fetch_balance().await.unwrap();

    assert_eq!(reading.value, 9_000);
    assert_eq!(h.cache.load().as_deref(), Some("fresh"));

    let login = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .find(|req| req.url.path() == "/api/v1/users/login")
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&login.body).unwrap();
    assert_eq!(body["identity"], "ops@example.com");
    assert!(body["captcha"].is_null());
    assert!(body["client_time"].as_str().unwrap().parse::<i64>().is_ok());
}

#[tokio::test]
async fn hamravesh_without_cache_logs_in_first() {
    let server = MockServer::start().await;
    mount_profile(&server, "fresh", profile_with_balance(1)).await;
    mount_login(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "key": "fresh" })),
        1,
    )
    .await;

    let h = hamravesh(&server, None);
    assert_eq!(h.client.fetch_balance().await.unwrap().value, 1);
}

#[tokio::test]
async fn hamravesh_login_without_key_is_auth_error() {
    let server = MockServer::start().await;
    mount_login(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "detail": "captcha required" })),
        1,
    )
    .await;

    let h = hamravesh(&server, None);
    let err = h.client.fetch_balance().await.unwrap_err();

    assert_eq!(err, SourceError::auth("Login failed: no token in response"));
    assert!(h.cache.load().is_none());
}

#[tokio::test]
async fn hamravesh_second_failure_is_reported() {
    let server = MockServer::start().await;
    mount_profile(&server, "stale", ResponseTemplate::new(401)).await;
    mount_profile(&server, "fresh", ResponseTemplate::new(403)).await;
    mount_login(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "key": "fresh" })),
        1,
    )
    .await;

    let h = hamravesh(&server, Some("stale"));
    let err = h.client.fetch_balance().await.unwrap_err();
    assert!(matches!(err, SourceError::Auth { .. }), "got {:?}", err);
}

#[tokio::test]
async fn hamravesh_profile_without_organization_is_format_error() {
    let server = MockServer::start().await;
    mount_profile(
        &server,
        "cached",
        ResponseTemplate::new(200).set_body_json(json!({ "organizations": [] })),
    )
    .await;

    let h = hamravesh(&server, Some("cached"));
    let err = h.client.fetch_balance().await.unwrap_err();
    assert!(matches!(err, SourceError::Format { .. }), "got {:?}", err);
}
