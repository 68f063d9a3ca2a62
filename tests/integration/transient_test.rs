//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! transient 读写往返次数测试

use oxtransient::backend::l2::Query;
use oxtransient::backend::memory::MemoryBackend;
use oxtransient::config::DeploymentMode;
use oxtransient::interceptor::DisabledReason;
use oxtransient::{Activation, OptionsClient};
use std::sync::Arc;

#[path = "../common/mod.rs"]
mod common;

fn transient_pair(name: &str) -> Vec<String> {
    vec![
        format!("_transient_{}", name),
        format!("_transient_timeout_{}", name),
    ]
}

#[tokio::test]
async fn test_get_transient_with_timeout_makes_a_single_round_trip() {
    let harness = common::memory_client("single_round_trip", DeploymentMode::SingleNode);
    assert!(harness.activation.is_registered());
    let client = &harness.client;

    assert!(client
        .set_transient("test_transient", &"test_value", 100)
        .await
        .unwrap());

    for key in transient_pair("test_transient") {
        client.cache().evict(&key).await;
    }
    harness.backend.clear_queries();

    let value: Option<String> = client.get_transient("test_transient").await.unwrap();
    assert_eq!(value.as_deref(), Some("test_value"));

    let queries = harness.backend.queries();
    assert_eq!(queries.len(), 1, "unexpected queries: {:?}", queries);
    assert_eq!(queries[0], Query::FetchMany(transient_pair("test_transient")));
    assert!(!queries.contains(&Query::Fetch("_transient_test_transient".to_string())));
    assert!(!queries.contains(&Query::Fetch(
        "_transient_timeout_test_transient".to_string()
    )));
}

#[tokio::test]
async fn test_set_transient_primes_option_cache() {
    let harness = common::memory_client("set_primes", DeploymentMode::SingleNode);
    let client = &harness.client;

    // 先加载自动加载快照，使写入的往返次数只包含 transient 本身
    client.cache().load_alloptions().await.unwrap();
    harness.backend.clear_queries();

    assert!(client
        .set_transient("test_transient", &"test_value", 100)
        .await
        .unwrap());

    let queries = harness.backend.queries();
    assert_eq!(queries.len(), 3, "unexpected queries: {:?}", queries);
    assert_eq!(queries[0], Query::FetchMany(transient_pair("test_transient")));
    assert_eq!(
        queries[1],
        Query::Insert("_transient_timeout_test_transient".to_string())
    );
    assert_eq!(
        queries[2],
        Query::Insert("_transient_test_transient".to_string())
    );
}

#[tokio::test]
async fn test_without_primer_reads_take_two_round_trips() {
    common::setup_logging();
    let mut config = common::memory_config(
        &common::generate_unique_service_name("no_primer"),
        DeploymentMode::SingleNode,
    );
    config.interceptor.enabled = false;
    let backend = Arc::new(MemoryBackend::new());
    let (client, activation) = OptionsClient::with_backend(&config, backend.clone());
    assert_eq!(activation, Activation::Disabled(DisabledReason::ByConfig));

    client.set_transient("feed", &"items", 100).await.unwrap();
    for key in transient_pair("feed") {
        client.cache().evict(&key).await;
    }
    backend.clear_queries();

    let value: Option<String> = client.get_transient("feed").await.unwrap();
    assert_eq!(value.as_deref(), Some("items"));
    assert_eq!(
        backend.queries(),
        vec![
            Query::Fetch("_transient_timeout_feed".to_string()),
            Query::Fetch("_transient_feed".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_native_priming_host_keeps_single_round_trip() {
    common::setup_logging();
    let mut config = common::memory_config(
        &common::generate_unique_service_name("native"),
        DeploymentMode::SingleNode,
    );
    config.interceptor.native_transient_priming = true;
    let backend = Arc::new(MemoryBackend::new());
    let (client, activation) = OptionsClient::with_backend(&config, backend.clone());
    assert_eq!(activation, Activation::Disabled(DisabledReason::NativePriming));
    assert!(client.registry().is_empty());

    client.set_transient("feed", &"items", 100).await.unwrap();
    for key in transient_pair("feed") {
        client.cache().evict(&key).await;
    }
    backend.clear_queries();

    let value: Option<String> = client.get_transient("feed").await.unwrap();
    assert_eq!(value.as_deref(), Some("items"));
    assert_eq!(backend.queries(), vec![Query::FetchMany(transient_pair("feed"))]);
}

#[tokio::test]
async fn test_native_priming_skips_autoloaded_transient() {
    common::setup_logging();
    let mut config = common::memory_config(
        &common::generate_unique_service_name("native_autoload"),
        DeploymentMode::SingleNode,
    );
    config.interceptor.native_transient_priming = true;
    let backend = Arc::new(MemoryBackend::new());
    let (client, _) = OptionsClient::with_backend(&config, backend.clone());

    client.set_transient("forever", &"value", 0).await.unwrap();
    client.cache().flush().await;
    client.cache().load_alloptions().await.unwrap();
    backend.clear_queries();

    let value: Option<String> = client.get_transient("forever").await.unwrap();
    assert_eq!(value.as_deref(), Some("value"));
    assert_eq!(backend.query_count(), 0, "unexpected queries: {:?}", backend.queries());
}

#[tokio::test]
async fn test_expired_transient_is_deleted() {
    let harness = common::memory_client("expiry", DeploymentMode::SingleNode);
    let client = &harness.client;

    client.set_transient("short", &42u32, 10).await.unwrap();
    let value: Option<u32> = client.get_transient("short").await.unwrap();
    assert_eq!(value, Some(42));

    harness.clock.advance(11);
    let value: Option<u32> = client.get_transient("short").await.unwrap();
    assert_eq!(value, None);
    assert!(!harness.backend.contains("_transient_short"));
    assert!(!harness.backend.contains("_transient_timeout_short"));
}

#[tokio::test]
async fn test_transient_without_expiry_is_autoloaded() {
    let harness = common::memory_client("no_expiry", DeploymentMode::SingleNode);
    let client = &harness.client;

    client.set_transient("forever", &"value", 0).await.unwrap();
    assert!(!harness.backend.contains("_transient_timeout_forever"));
    assert!(client
        .cache()
        .alloptions_contains("_transient_forever")
        .await
        .unwrap());

    harness.backend.clear_queries();
    let value: Option<String> = client.get_transient("forever").await.unwrap();
    assert_eq!(value.as_deref(), Some("value"));
    assert_eq!(harness.backend.query_count(), 0);
}

#[tokio::test]
async fn test_update_existing_transient() {
    let harness = common::memory_client("update", DeploymentMode::SingleNode);
    let client = &harness.client;

    client.set_transient("counter", &1u32, 60).await.unwrap();
    harness.clock.advance(30);
    assert!(client.set_transient("counter", &2u32, 60).await.unwrap());

    harness.clock.advance(45);
    let value: Option<u32> = client.get_transient("counter").await.unwrap();
    assert_eq!(value, Some(2));

    let timeout: Option<i64> = client.get("_transient_timeout_counter").await.unwrap();
    assert_eq!(timeout, Some(common::START + 30 + 60));
}

#[tokio::test]
async fn test_adding_expiry_to_autoloaded_transient() {
    let harness = common::memory_client("add_expiry", DeploymentMode::SingleNode);
    let client = &harness.client;

    client.set_transient("cfg", &"v1", 0).await.unwrap();
    assert!(client.set_transient("cfg", &"v2", 60).await.unwrap());
    assert!(!client
        .cache()
        .alloptions_contains("_transient_cfg")
        .await
        .unwrap());

    harness.clock.advance(61);
    let value: Option<String> = client.get_transient("cfg").await.unwrap();
    assert_eq!(value, None);
}

#[tokio::test]
async fn test_delete_transient() {
    let harness = common::memory_client("delete", DeploymentMode::SingleNode);
    let client = &harness.client;

    client.set_transient("gone", &"soon", 60).await.unwrap();
    assert!(client.delete_transient("gone").await.unwrap());
    assert!(!client.delete_transient("gone").await.unwrap());

    let value: Option<String> = client.get_transient("gone").await.unwrap();
    assert_eq!(value, None);
    assert!(!harness.backend.contains("_transient_timeout_gone"));
}

#[tokio::test]
async fn test_site_transient_round_trip_stays_in_namespace() {
    let harness = common::memory_client("site", DeploymentMode::SingleNode);
    let client = &harness.client;

    client.set_site_transient("shared", &"site", 100).await.unwrap();
    client.set_transient("shared", &"local", 100).await.unwrap();
    for key in [
        "_site_transient_shared",
        "_site_transient_timeout_shared",
        "_transient_shared",
        "_transient_timeout_shared",
    ] {
        client.cache().evict(key).await;
    }
    harness.backend.clear_queries();

    let value: Option<String> = client.get_site_transient("shared").await.unwrap();
    assert_eq!(value.as_deref(), Some("site"));
    assert_eq!(
        harness.backend.queries(),
        vec![Query::FetchMany(vec![
            "_site_transient_shared".to_string(),
            "_site_transient_timeout_shared".to_string()
        ])]
    );

    let value: Option<String> = client.get_transient("shared").await.unwrap();
    assert_eq!(value.as_deref(), Some("local"));
}
