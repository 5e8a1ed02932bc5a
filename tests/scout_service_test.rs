//! End-to-end tests for the scout service: discovery, caching and selection together

mod common;

use common::FakeHost;
use nodescout::cache::{schema_key, DISCOVERY_KEY};
use nodescout::config::Config;
use nodescout::discovery::RemoteHost;
use nodescout::selector::{Intent, ToolContext, UsageStat};
use nodescout::services::selection_key;
use nodescout::store::{CapabilityStore, JsonFileStore, MemoryStore, StoreKind};
use nodescout::ScoutService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

fn test_config() -> Config {
    let mut config = Config::default();
    config.discovery.include_patterns = false;
    config.discovery.include_registry = false;
    config.discovery.sample_size = 0;
    config.discovery.batch.inter_window_delay = Duration::ZERO;
    config.registry.enabled = false;
    config
}

fn fake_host() -> Arc<FakeHost> {
    Arc::new(FakeHost::new(&[]).with_prefixes(&["n8n-nodes-base.", "@n8n/"]))
}

fn service(host: Arc<FakeHost>, store: Option<Arc<dyn CapabilityStore>>) -> ScoutService {
    ScoutService::new(host as Arc<dyn RemoteHost>, None, store, &test_config()).unwrap()
}

#[tokio::test]
async fn test_cold_cache_runs_discovery_once() {
    let host = fake_host();
    let service = service(Arc::clone(&host), None);

    let first = service.available_capabilities().await.unwrap();
    let calls_after_first = host.calls();
    let second = service.available_capabilities().await.unwrap();

    assert!(!first.is_empty());
    assert_eq!(first, second);
    assert_eq!(host.calls(), calls_after_first);
    assert!(service.cache().contains_key(DISCOVERY_KEY).await);
}

#[tokio::test]
async fn test_concurrent_cold_callers_share_one_discovery() {
    let host = fake_host();
    let service = service(Arc::clone(&host), None);

    let (a, b) = tokio::join!(service.available_capabilities(), service.available_capabilities());
    assert_eq!(a.unwrap().len(), b.unwrap().len());

    // 62 catalog entries in batches of 50, all accepted
    let single_run_calls = (nodescout::discovery::catalog::catalog().len() + 49) / 50;
    assert_eq!(host.calls(), single_run_calls);
}

#[tokio::test]
async fn test_select_ranks_and_caches() {
    let host = fake_host();
    let service = service(Arc::clone(&host), None);

    let context = ToolContext {
        intent: Some(Intent::Execution),
        ..ToolContext::with_query("send a slack message")
    };
    let selection = service.select(&context).await.unwrap();

    assert!(!selection.is_empty());
    assert!(selection.items.contains(&"slack".to_string()));
    assert!(selection.len() <= service.selector().config().max_count);
    for pair in selection.scores.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    for score in &selection.scores {
        assert!(score.score >= service.selector().config().score_threshold);
    }

    let calls = host.calls();
    let again = service.select(&context).await.unwrap();
    assert_eq!(again, selection);
    assert_eq!(host.calls(), calls);
    assert!(service.cache().contains_key(&selection_key(&context).unwrap()).await);

    let learned = service.selector().learned_patterns(Intent::Execution).await;
    assert!(learned.contains(&"slack".to_string()));
}

#[tokio::test]
async fn test_record_outcome_invalidates_cached_selections() {
    let service = service(fake_host(), None);
    let context = ToolContext::with_query("slack");
    service.select(&context).await.unwrap();
    let key = selection_key(&context).unwrap();
    assert!(service.cache().contains_key(&key).await);

    service.record_outcome("slack", true).await;

    assert!(!service.cache().contains_key(&key).await);
    let stats = service.selector().usage_stats().await;
    let slack = stats.iter().find(|s| s.capability_id == "slack").unwrap();
    assert_eq!((slack.call_count, slack.success_count), (1, 1));
}

#[tokio::test]
async fn test_rediscovery_drops_stale_selections() {
    let service = service(fake_host(), None);
    let context = ToolContext::with_query("gmail");
    service.select(&context).await.unwrap();

    let result = service.run_discovery().await.unwrap();
    assert!(!result.stats.cancelled);
    assert!(!service.cache().contains_key(&selection_key(&context).unwrap()).await);
    assert!(service.cache().contains_key(DISCOVERY_KEY).await);
}

#[tokio::test]
async fn test_credential_schema_is_cached() {
    let host = fake_host();
    let service = service(Arc::clone(&host), None);

    let schema = service.credential_schema("slackApi").await.unwrap().unwrap();
    assert_eq!(schema["type"], "object");
    let again = service.credential_schema("slackApi").await.unwrap();
    assert_eq!(again, Some(schema));
    assert_eq!(host.schema_calls.load(Ordering::SeqCst), 1);
    assert!(service.cache().contains_key(&schema_key("slackApi")).await);

    assert!(service.credential_schema("missingApi").await.unwrap().is_none());
    assert!(!service.cache().contains_key(&schema_key("missingApi")).await);
}

#[tokio::test]
async fn test_start_seeds_usage_and_stop_persists() {
    let mut seeded = UsageStat::new("slack");
    seeded.call_count = 10;
    seeded.success_count = 9;
    let store = Arc::new(MemoryStore::with_usage(vec![seeded]));
    let service = service(fake_host(), Some(Arc::clone(&store) as Arc<dyn CapabilityStore>));

    service.start().await.unwrap();
    assert!(service.is_running().await);

    let stats = service.selector().usage_stats().await;
    assert_eq!(stats.iter().find(|s| s.capability_id == "slack").unwrap().call_count, 10);

    service.record_outcome("gmail", false).await;
    service.stop().await;
    assert!(!service.is_running().await);

    let persisted = store.load_usage_stats().await.unwrap();
    assert_eq!(persisted.len(), 2);
    let gmail = persisted.iter().find(|s| s.capability_id == "gmail").unwrap();
    assert_eq!((gmail.call_count, gmail.success_count), (1, 0));
}

#[tokio::test]
async fn test_discovered_capabilities_reach_the_store() {
    let store = Arc::new(MemoryStore::new());
    let service = service(fake_host(), Some(Arc::clone(&store) as Arc<dyn CapabilityStore>));

    let result = service.run_discovery().await.unwrap();
    let stored = store.load_descriptors().await.unwrap();
    assert_eq!(stored.len(), result.descriptors.len());
}

#[tokio::test]
async fn test_from_config_with_json_store_persists_usage() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state").join("nodescout.json");

    let mut config = test_config();
    config.store.kind = StoreKind::Json;
    config.store.path = Some(path.clone());

    let service = ScoutService::from_config(&config).await.unwrap();
    service.record_outcome("httpRequest", true).await;
    assert_eq!(service.persist_usage().await.unwrap(), 1);

    let reopened = JsonFileStore::open(&path).await.unwrap();
    let usage = reopened.load_usage_stats().await.unwrap();
    assert_eq!(usage[0].capability_id, "httpRequest");
}

#[tokio::test]
async fn test_cache_statistics_track_hits_and_misses() {
    let service = service(fake_host(), None);

    // A cold read counts one miss, not one per lookup
    service.available_capabilities().await.unwrap();
    let cold = service.cache_statistics().await;
    assert_eq!((cold.hits, cold.misses), (0, 1));

    service.available_capabilities().await.unwrap();
    let stats = service.cache_statistics().await;
    assert_eq!((stats.hits, stats.misses), (1, 1));
    assert_eq!(stats.per_category.get("discovery"), Some(&1));
}

fn maintained_service(host: Arc<FakeHost>, warming: bool) -> ScoutService {
    let mut config = test_config();
    config.cache.refresh_interval = Duration::from_secs(1);
    config.cache.warming_interval = Duration::from_secs(1);
    config.cache.enable_predictive_warming = warming;
    ScoutService::new(host as Arc<dyn RemoteHost>, None, None, &config).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_background_refresh_swaps_schemas_and_counts_failures() {
    let host = fake_host();
    let service = maintained_service(Arc::clone(&host), false);
    service.start().await.unwrap();

    // The schema strategy queues the key for refresh when it is cached
    service.credential_schema("slackApi").await.unwrap();
    service.cache().enqueue_refresh(&schema_key("missingApi")).await;
    service.cache().enqueue_refresh("custom:key").await;
    assert_eq!(service.cache_statistics().await.refresh_queue_len, 3);

    tokio::time::sleep(Duration::from_millis(1500)).await;

    // Initial fetch, then one refresh each for slackApi and missingApi
    assert_eq!(host.schema_calls.load(Ordering::SeqCst), 3);
    let stats = service.cache_statistics().await;
    assert_eq!(stats.refreshes, 1);
    assert_eq!(stats.refresh_failures, 2);
    assert_eq!(stats.refresh_queue_len, 0);
    assert!(service.cache().contains_key(&schema_key("slackApi")).await);
    assert!(!service.cache().contains_key(&schema_key("missingApi")).await);

    service.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_background_refresh_never_reruns_discovery() {
    let host = fake_host();
    let service = maintained_service(Arc::clone(&host), true);
    service.start().await.unwrap();

    service.available_capabilities().await.unwrap();
    let calls = host.calls();
    // Read at a steady rhythm so the discovery key looks due for warming
    for _ in 0..5 {
        tokio::time::sleep(Duration::from_secs(2)).await;
        service.available_capabilities().await.unwrap();
    }
    service.cache().enqueue_refresh(DISCOVERY_KEY).await;
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(host.calls(), calls);
    let stats = service.cache_statistics().await;
    assert_eq!(stats.refreshes, 0);
    assert_eq!(stats.refresh_failures, 1);
    assert_eq!(stats.refresh_queue_len, 0);

    service.stop().await;
}
