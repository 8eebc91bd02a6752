//! End-to-end scenarios (§8 of the expanded spec) driven against fake transports. No real
//! subprocess or socket is ever started; `FakeFactory`/`FakeConnection` stand in for C1/C3.

use mcp_gateway::test_support::FakeFactory;
use mcp_gateway::{AuthConfig, GatewayError, HttpParams, Manager, ServerParams, StdioParams, Transport};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn stdio(name: &str) -> ServerParams {
    ServerParams {
        name: name.to_string(),
        transport: Transport::Stdio,
        enabled: true,
        timeout_seconds: 5,
        description: Some("a stdio upstream".to_string()),
        stdio: Some(StdioParams {
            command: "fake-mcp".to_string(),
            args: vec![],
            env: vec![],
        }),
        http: None,
    }
}

fn http(name: &str, auth: Option<AuthConfig>) -> ServerParams {
    ServerParams {
        name: name.to_string(),
        transport: Transport::Http,
        enabled: true,
        timeout_seconds: 5,
        description: Some("an http upstream".to_string()),
        stdio: None,
        http: Some(HttpParams {
            url: format!("http://stub.internal/{name}"),
            auth,
        }),
    }
}

/// S1: a single stdio server initializes to Ready and its one tool is callable end to end.
#[tokio::test]
async fn s1_stdio_happy_path() {
    let factory = Arc::new(FakeFactory::new());
    factory.with_tools("fs", vec!["read_file".to_string(), "write_file".to_string()]);
    let manager = Manager::new(factory);

    let mut catalog = HashMap::new();
    catalog.insert("fs".to_string(), stdio("fs"));
    let summary = manager.initialize(catalog).await;
    assert_eq!(summary.ready, 1);
    assert_eq!(summary.failed, 0);

    let toolkit = manager.get_toolkit("fs", None).await.unwrap();
    assert_eq!(toolkit.tools().len(), 2);

    let mut args = serde_json::Map::new();
    args.insert("ignored".to_string(), serde_json::json!("value"));
    let result = toolkit
        .invoke("read_file", args, Duration::from_secs(5), CancellationToken::new())
        .await
        .unwrap();
    assert!(!result.is_error.unwrap_or(false));
}

/// S2: an http server with bearer auth and an allow-list narrower than its full catalog.
#[tokio::test]
async fn s2_http_with_bearer_and_allow_list() {
    let factory = Arc::new(FakeFactory::new());
    factory.with_tools("billing", vec!["charge".to_string(), "refund".to_string(), "list_invoices".to_string()]);
    let manager = Manager::new(factory);

    let mut catalog = HashMap::new();
    catalog.insert("billing".to_string(), http("billing", Some(AuthConfig::Bearer { token: "secret-token".to_string() })));
    manager.initialize(catalog).await;

    let toolkit = manager.get_toolkit("billing", Some(vec!["charge".to_string(), "refund".to_string()])).await.unwrap();
    assert_eq!(toolkit.tools().len(), 2);
    assert!(toolkit.tools().iter().all(|t| t.name != "list_invoices"));
}

/// S3: disabled entries are registered but never started and report Disabled on access.
#[tokio::test]
async fn s3_disabled_entries_never_start() {
    let factory = Arc::new(FakeFactory::new());
    let manager = Manager::new(factory);

    let mut disabled = stdio("archive");
    disabled.enabled = false;
    let mut catalog = HashMap::new();
    catalog.insert("archive".to_string(), disabled);
    catalog.insert("fs".to_string(), stdio("fs"));

    let summary = manager.initialize(catalog).await;
    assert_eq!(summary.total, 2);
    assert_eq!(summary.ready, 1);

    let err = manager.get_toolkit("archive", None).await.unwrap_err();
    assert!(matches!(err, GatewayError::Disabled { .. }));

    let servers = manager.list_servers().await;
    let archive_info = servers.iter().find(|s| s.name == "archive").unwrap();
    assert!(!archive_info.connected);
    assert!(archive_info.functions.is_empty());
}

/// S4: initialization partially fails; good servers stay Ready while bad ones report Failed, and
/// the summary accounts for both without one masking the other.
#[tokio::test]
async fn s4_partial_init_failure_is_isolated() {
    let factory = Arc::new(FakeFactory::new());
    factory.fail("flaky");
    let manager = Manager::new(factory);

    let mut catalog = HashMap::new();
    catalog.insert("flaky".to_string(), stdio("flaky"));
    catalog.insert("steady".to_string(), stdio("steady"));
    let summary = manager.initialize(catalog).await;

    assert_eq!(summary.total, 2);
    assert_eq!(summary.ready, 1);
    assert_eq!(summary.failed, 1);

    assert!(matches!(manager.get_toolkit("flaky", None).await.unwrap_err(), GatewayError::NotReady { .. }));
    assert!(manager.get_toolkit("steady", None).await.is_ok());
}

/// S5: a peer is added dynamically, removed, then re-adding under the same name after removal
/// succeeds, but adding a name collision against a live server is rejected without side effects.
#[tokio::test]
async fn s5_dynamic_peer_add_remove_and_collision() {
    let factory = Arc::new(FakeFactory::new());
    let manager = Manager::new(factory);

    let info = manager.add_peer(http("reports", None)).await.unwrap();
    assert!(info.connected);

    let collision = manager.add_peer(http("reports", None)).await.unwrap_err();
    assert!(matches!(collision, GatewayError::InvalidConfig { .. }));
    assert_eq!(manager.list_servers().await.len(), 1);

    manager.remove_peer("reports").await.unwrap();
    assert!(manager.list_servers().await.is_empty());

    let readded = manager.add_peer(http("reports", None)).await.unwrap();
    assert!(readded.connected);
}

/// S6: the re-exporter's own tool surface (list/get-functions/reload/available) reflects the same
/// Manager state a direct caller would see — the recursion point where one gateway peers with
/// another is exercised at the Manager level, since no real second process is started here.
#[tokio::test]
async fn s6_reexported_state_matches_manager_state() {
    let factory = Arc::new(FakeFactory::new());
    factory.with_tools("search", vec!["query".to_string()]);
    let manager = Manager::new(factory.clone());

    let mut catalog = HashMap::new();
    catalog.insert("search".to_string(), stdio("search"));
    manager.initialize(catalog).await;

    let available: Vec<String> = manager.list_servers().await.into_iter().filter(|s| s.connected).map(|s| s.name).collect();
    assert_eq!(available, vec!["search".to_string()]);

    factory.fail("search");
    manager.reload("search").await.unwrap_err();
    let after_reload_failure: Vec<String> = manager.list_servers().await.into_iter().filter(|s| s.connected).map(|s| s.name).collect();
    assert!(after_reload_failure.is_empty());

    factory.unfail("search");
    manager.reload("search").await.unwrap();
    let recovered: Vec<String> = manager.list_servers().await.into_iter().filter(|s| s.connected).map(|s| s.name).collect();
    assert_eq!(recovered, vec!["search".to_string()]);
}
