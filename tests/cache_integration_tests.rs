//! Integration Tests for the Cache API
//!
//! Exercises the public operations end to end, including expiration timing
//! and concurrent access from several threads.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tokio::time::sleep;
use ttl_cache::{Cache, CacheError, Config};

const LONG: Duration = Duration::from_secs(60);

// == Helper Functions ==

fn create_test_cache<V: Clone + Send + Sync + 'static>() -> Cache<V> {
    Cache::new().expect("cache should start inside a tokio runtime")
}

// == Set / Get ==

#[tokio::test]
async fn test_set_then_get() {
    let cache = create_test_cache();

    cache.set("user:1", "alice".to_string(), LONG);

    assert_eq!(cache.get("user:1"), Some("alice".to_string()));
}

#[tokio::test]
async fn test_get_never_set() {
    let cache: Cache<u64> = create_test_cache();
    assert_eq!(cache.get("ghost"), None);
}

#[tokio::test]
async fn test_key_expires_after_ttl() {
    let cache = create_test_cache();

    cache.set("A", 1, Duration::from_millis(100));
    sleep(Duration::from_millis(150)).await;

    assert_eq!(cache.get("A"), None);
}

#[tokio::test]
async fn test_overwrite_is_not_cut_short_by_earlier_ttl() {
    let cache = create_test_cache();

    cache.set("A", 1, Duration::from_millis(200));
    sleep(Duration::from_millis(50)).await;
    cache.set("A", 2, Duration::from_millis(200));

    sleep(Duration::from_millis(170)).await;
    assert_eq!(cache.get("A"), Some(2));
}

// == Get Or Set ==

#[tokio::test]
async fn test_get_or_set_keeps_first_value() {
    let cache = create_test_cache();

    assert_eq!(cache.get_or_set("k", "v1", LONG), ("v1", false));
    assert_eq!(cache.get_or_set("k", "v2", LONG), ("v1", true));
    assert_eq!(cache.get("k"), Some("v1"));
}

#[tokio::test]
async fn test_get_or_set_loaded_branch_keeps_ttl() {
    let cache = create_test_cache();

    cache.get_or_set("k", 1, Duration::from_millis(100));
    cache.get_or_set("k", 2, LONG);

    sleep(Duration::from_millis(200)).await;
    assert_eq!(cache.get("k"), None, "Loaded branch must not extend the TTL");
}

#[tokio::test]
async fn test_get_or_set_after_expiry_inserts() {
    let cache = create_test_cache();

    cache.set("Spock", "first", Duration::from_millis(50));
    sleep(Duration::from_millis(120)).await;

    assert_eq!(cache.get_or_set("Spock", "second", LONG), ("second", false));
}

// == Expire ==

#[tokio::test]
async fn test_expire_present_and_absent() {
    let cache = create_test_cache();

    cache.set("k", 7, LONG);
    assert_eq!(cache.expire("k"), Some(7));
    assert_eq!(cache.get("k"), None);
    assert_eq!(cache.expire("k"), None);
}

#[tokio::test]
async fn test_expire_then_set_is_not_cut_short() {
    let cache = create_test_cache();

    cache.set("k", 1, Duration::from_millis(100));
    cache.expire("k");
    cache.set("k", 2, LONG);

    sleep(Duration::from_millis(200)).await;
    assert_eq!(cache.get("k"), Some(2));
}

// == Refresh ==

#[tokio::test]
async fn test_refresh_absent_has_no_effect() {
    let cache: Cache<u8> = create_test_cache();

    assert!(!cache.refresh("k", LONG));
    assert_eq!(cache.get("k"), None);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_refresh_keeps_key_for_new_ttl() {
    let cache = create_test_cache();

    cache.set("k", 1, Duration::from_millis(100));
    assert!(cache.refresh("k", Duration::from_millis(400)));

    sleep(Duration::from_millis(200)).await;
    assert_eq!(cache.get("k"), Some(1));

    sleep(Duration::from_millis(350)).await;
    assert_eq!(cache.get("k"), None);
}

// == Expire All ==

#[tokio::test]
async fn test_expire_all_clears_everything() {
    let cache = create_test_cache();
    let keys: Vec<String> = (0..10).map(|i| format!("key{}", i)).collect();

    for (i, key) in keys.iter().enumerate() {
        cache.set(key.as_str(), i, LONG);
    }
    cache.expire_all();

    for key in &keys {
        assert_eq!(cache.get(key), None);
    }
}

#[tokio::test]
async fn test_expire_all_then_reuse_key() {
    let cache = create_test_cache();

    cache.set("k", 1, Duration::from_millis(100));
    cache.expire_all();
    cache.set("k", 2, LONG);

    sleep(Duration::from_millis(200)).await;
    assert_eq!(cache.get("k"), Some(2));
}

// == Construction / Lifecycle ==

#[test]
fn test_new_requires_runtime() {
    assert!(matches!(
        Cache::<u8>::new(),
        Err(CacheError::NoRuntime(_))
    ));
}

#[tokio::test]
async fn test_with_config() {
    let config = Config {
        reaper_batch: 1,
        ..Config::default()
    };
    let cache = Cache::with_config(&config).unwrap();

    for i in 0..5 {
        cache.set(format!("k{}", i), i, Duration::from_millis(20));
    }
    sleep(Duration::from_millis(200)).await;

    assert!(cache.is_empty(), "Small batches must still drain every expiration");
    assert_eq!(cache.stats().expirations, 5);
}

#[tokio::test]
async fn test_shutdown_stops_reaping_but_reads_honor_ttl() {
    let cache = create_test_cache();

    cache.shutdown();
    cache.set("k", 1, Duration::from_millis(50));
    sleep(Duration::from_millis(120)).await;

    assert_eq!(cache.get("k"), None);
    assert_eq!(cache.len(), 1, "Nothing removes the entry without the reaper");
}

#[tokio::test]
async fn test_ttl_reports_remaining_time() {
    let cache = create_test_cache();

    cache.set("k", 1, Duration::from_secs(10));
    let remaining = cache.ttl("k").unwrap();

    assert!(remaining <= Duration::from_secs(10));
    assert!(remaining > Duration::from_secs(9));
    assert_eq!(cache.ttl("missing"), None);
}

// == Concurrency ==

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_get_or_set_single_winner() {
    let cache = Arc::new(create_test_cache());

    let handles: Vec<_> = (0..16u32)
        .map(|i| {
            let cache = Arc::clone(&cache);
            thread::spawn(move || cache.get_or_set("shared", i, LONG))
        })
        .collect();

    let results: Vec<(u32, bool)> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|(_, loaded)| !loaded).count(), 1);
    let values: HashSet<u32> = results.iter().map(|(value, _)| *value).collect();
    assert_eq!(values.len(), 1, "Every caller must see the winning value");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_writers_on_distinct_keys() {
    let cache = create_test_cache();

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let cache = cache.clone();
            thread::spawn(move || {
                for i in 0..100 {
                    cache.set(format!("t{}:{}", t, i), i, LONG);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(cache.len(), 800);
    assert_eq!(cache.get("t3:42"), Some(42));
}
