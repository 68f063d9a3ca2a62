//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! transient 预取拦截器测试

use async_trait::async_trait;
use oxtransient::backend::l1::CachedOption;
use oxtransient::backend::l2::Query;
use oxtransient::config::{Config, DeploymentMode};
use oxtransient::error::{CacheError, Result};
use oxtransient::hooks::{HookRegistry, InterceptorRegistry};
use oxtransient::interceptor::{DisabledReason, HostCapabilities, PrimeCapability};
use oxtransient::{Activation, PreRead, PreReadInterceptor, TransientPrimer};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[path = "../common/mod.rs"]
mod common;

const CAPABLE: HostCapabilities = HostCapabilities {
    batch_prime: true,
    prefix_match: true,
    native_transient_priming: false,
};

struct MockCache {
    caps: HostCapabilities,
    alloptions: HashSet<String>,
    primed: Mutex<Vec<Vec<String>>>,
    snapshot_lookups: Mutex<usize>,
    fail_prime: bool,
    fail_snapshot: bool,
}

impl MockCache {
    fn new(caps: HostCapabilities) -> Self {
        Self {
            caps,
            alloptions: HashSet::new(),
            primed: Mutex::new(Vec::new()),
            snapshot_lookups: Mutex::new(0),
            fail_prime: false,
            fail_snapshot: false,
        }
    }

    fn with_alloption(mut self, key: &str) -> Self {
        self.alloptions.insert(key.to_string());
        self
    }

    fn primed(&self) -> Vec<Vec<String>> {
        self.primed.lock().unwrap().clone()
    }
}

#[async_trait]
impl PrimeCapability for MockCache {
    fn capabilities(&self) -> HostCapabilities {
        self.caps
    }

    async fn alloptions_contains(&self, key: &str) -> Result<bool> {
        *self.snapshot_lookups.lock().unwrap() += 1;
        if self.fail_snapshot {
            return Err(CacheError::BackendError("snapshot unavailable".to_string()));
        }
        Ok(self.alloptions.contains(key))
    }

    async fn prime_option_caches(&self, keys: &[String]) -> Result<()> {
        self.primed.lock().unwrap().push(keys.to_vec());
        if self.fail_prime {
            return Err(CacheError::L2Error("connection refused".to_string()));
        }
        Ok(())
    }
}

fn primer(cache: &Arc<MockCache>, namespace_variants: bool) -> TransientPrimer {
    TransientPrimer::new("interceptor_test", cache.clone(), namespace_variants)
}

fn pair(value: &str, timeout: &str) -> Vec<String> {
    vec![value.to_string(), timeout.to_string()]
}

#[tokio::test]
async fn test_value_read_primes_value_and_timeout_together() {
    common::setup_logging();
    let cache = Arc::new(MockCache::new(CAPABLE));
    let primer = primer(&cache, true);

    let result = primer
        .before_read(PreRead::Unresolved, "_transient_test_transient")
        .await;

    assert_eq!(result, PreRead::Unresolved);
    assert_eq!(
        cache.primed(),
        vec![pair(
            "_transient_test_transient",
            "_transient_timeout_test_transient"
        )]
    );
}

#[tokio::test]
async fn test_timeout_read_primes_same_pair() {
    let cache = Arc::new(MockCache::new(CAPABLE));
    let primer = primer(&cache, false);

    primer
        .before_read(PreRead::Unresolved, "_transient_timeout_feed")
        .await;

    assert_eq!(
        cache.primed(),
        vec![pair("_transient_feed", "_transient_timeout_feed")]
    );
}

#[tokio::test]
async fn test_resolved_pre_read_passes_through_untouched() {
    let cache = Arc::new(MockCache::new(CAPABLE));
    let primer = primer(&cache, true);
    let resolved = PreRead::Resolved(b"\"from another interceptor\"".to_vec());

    for key in ["_transient_feed", "_site_transient_feed", "siteurl"] {
        let result = primer.before_read(resolved.clone(), key).await;
        assert_eq!(result, resolved);
    }
    assert!(cache.primed().is_empty());
    assert_eq!(*cache.snapshot_lookups.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_non_transient_keys_pass_through() {
    let cache = Arc::new(MockCache::new(CAPABLE));
    let primer = primer(&cache, false);

    for key in [
        "siteurl",
        "transient_feed",
        "_transient_",
        "_site_transient_feed",
        "_site_transient_timeout_feed",
    ] {
        let result = primer.before_read(PreRead::Unresolved, key).await;
        assert_eq!(result, PreRead::Unresolved, "{key}");
    }
    assert!(cache.primed().is_empty());
}

#[tokio::test]
async fn test_autoloaded_value_is_not_primed() {
    let cache = Arc::new(MockCache::new(CAPABLE).with_alloption("_transient_no_expiry"));
    let primer = primer(&cache, true);

    primer
        .before_read(PreRead::Unresolved, "_transient_no_expiry")
        .await;
    primer
        .before_read(PreRead::Unresolved, "_transient_timeout_no_expiry")
        .await;

    assert!(cache.primed().is_empty());
}

#[tokio::test]
async fn test_site_transient_primes_only_site_pair() {
    let cache = Arc::new(MockCache::new(CAPABLE).with_alloption("_transient_shared"));
    let primer = primer(&cache, true);

    primer
        .before_read(PreRead::Unresolved, "_site_transient_shared")
        .await;

    assert_eq!(
        cache.primed(),
        vec![pair(
            "_site_transient_shared",
            "_site_transient_timeout_shared"
        )]
    );
}

#[tokio::test]
async fn test_prime_failure_is_absorbed() {
    let mut mock = MockCache::new(CAPABLE);
    mock.fail_prime = true;
    let cache = Arc::new(mock);
    let primer = primer(&cache, false);

    let result = primer
        .before_read(PreRead::Unresolved, "_transient_feed")
        .await;

    assert_eq!(result, PreRead::Unresolved);
    assert_eq!(cache.primed().len(), 1);
}

#[tokio::test]
async fn test_snapshot_failure_skips_priming() {
    let mut mock = MockCache::new(CAPABLE);
    mock.fail_snapshot = true;
    let cache = Arc::new(mock);
    let primer = primer(&cache, false);

    let result = primer
        .before_read(PreRead::Unresolved, "_transient_feed")
        .await;

    assert_eq!(result, PreRead::Unresolved);
    assert!(cache.primed().is_empty());
}

#[tokio::test]
async fn test_activation_guard() {
    let config = Config::default();
    let cases = [
        (
            HostCapabilities {
                batch_prime: false,
                ..CAPABLE
            },
            DisabledReason::NoBatchPrime,
        ),
        (
            HostCapabilities {
                prefix_match: false,
                ..CAPABLE
            },
            DisabledReason::NoPrefixMatch,
        ),
        (
            HostCapabilities {
                native_transient_priming: true,
                ..CAPABLE
            },
            DisabledReason::NativePriming,
        ),
    ];

    for (caps, reason) in cases {
        let registry = HookRegistry::new();
        let activation =
            TransientPrimer::register(&registry, Arc::new(MockCache::new(caps)), &config);
        assert_eq!(activation, Activation::Disabled(reason));
        assert!(registry.is_empty());
    }

    let mut disabled = Config::default();
    disabled.interceptor.enabled = false;
    let registry = HookRegistry::new();
    let activation =
        TransientPrimer::register(&registry, Arc::new(MockCache::new(CAPABLE)), &disabled);
    assert_eq!(activation, Activation::Disabled(DisabledReason::ByConfig));
    assert!(registry.is_empty());

    let registry = HookRegistry::new();
    let activation =
        TransientPrimer::register(&registry, Arc::new(MockCache::new(CAPABLE)), &config);
    assert_eq!(activation, Activation::Registered { priority: 100 });
    assert_eq!(
        registry.describe(),
        vec![(100, "transient_primer".to_string())]
    );
}

struct Resolver;

#[async_trait]
impl PreReadInterceptor for Resolver {
    fn name(&self) -> &str {
        "resolver"
    }

    async fn before_read(&self, _pre: PreRead, key: &str) -> PreRead {
        if key == "_transient_overridden" {
            PreRead::Resolved(b"\"override\"".to_vec())
        } else {
            PreRead::Unresolved
        }
    }
}

#[tokio::test]
async fn test_primer_runs_after_earlier_resolvers() {
    let cache = Arc::new(MockCache::new(CAPABLE));
    let registry = HookRegistry::new();
    TransientPrimer::register(&registry, cache.clone(), &Config::default());
    registry.register(10, Arc::new(Resolver));

    assert_eq!(
        registry.run_pre_read("_transient_overridden").await,
        PreRead::Resolved(b"\"override\"".to_vec())
    );
    assert!(cache.primed().is_empty());

    assert_eq!(
        registry.run_pre_read("_transient_other").await,
        PreRead::Unresolved
    );
    assert_eq!(cache.primed().len(), 1);
}

#[tokio::test]
async fn test_autoloaded_option_read_never_batches() {
    let harness = common::memory_client("alloptions_bypass", DeploymentMode::SingleNode);
    harness
        .backend
        .seed("_transient_no_expiry", b"\"kept\"".to_vec(), true);

    let value: Option<String> = harness.client.get_transient("no_expiry").await.unwrap();
    assert_eq!(value.as_deref(), Some("kept"));
    assert_eq!(harness.backend.queries(), vec![Query::LoadAutoloaded]);
}

#[tokio::test]
async fn test_repeated_reads_are_idempotent() {
    let harness = common::memory_client("idempotent", DeploymentMode::SingleNode);
    harness
        .backend
        .seed("_transient_timeout_feed", b"1800000000".to_vec(), false);
    harness
        .backend
        .seed("_transient_feed", b"\"items\"".to_vec(), false);
    harness.client.cache().load_alloptions().await.unwrap();
    harness.backend.clear_queries();

    let first = harness.client.get_option("_transient_feed").await.unwrap();
    assert_eq!(harness.backend.query_count(), 1);
    let second = harness.client.get_option("_transient_feed").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(harness.backend.query_count(), 1);
}

#[tokio::test]
async fn test_missing_transient_is_negatively_cached() {
    let harness = common::memory_client("negative_cache", DeploymentMode::SingleNode);
    harness.client.cache().load_alloptions().await.unwrap();
    harness.backend.clear_queries();

    assert_eq!(
        harness.client.get_option("_transient_missing").await.unwrap(),
        None
    );
    assert_eq!(
        harness
            .client
            .cache()
            .get_cached("_transient_timeout_missing")
            .await,
        Some(CachedOption::Absent)
    );
    assert_eq!(
        harness
            .client
            .get_option("_transient_timeout_missing")
            .await
            .unwrap(),
        None
    );
    assert_eq!(
        harness.backend.queries(),
        vec![Query::FetchMany(vec![
            "_transient_missing".to_string(),
            "_transient_timeout_missing".to_string()
        ])]
    );
}

#[tokio::test]
async fn test_multi_node_site_keys_use_single_reads() {
    let harness = common::memory_client("multi_node", DeploymentMode::MultiNode);
    harness.client.cache().load_alloptions().await.unwrap();
    harness.backend.clear_queries();

    harness
        .client
        .get_option("_site_transient_shared")
        .await
        .unwrap();
    assert_eq!(
        harness.backend.queries(),
        vec![Query::Fetch("_site_transient_shared".to_string())]
    );
}
