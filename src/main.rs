//! TTL Cache demo
//!
//! Exercises the cache sequentially: stores a long-lived and a short-lived
//! entry, reads and expires the first, then waits for the second to lapse.

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ttl_cache::{Cache, Config};

/// Demo values are either numbers or text.
#[derive(Debug, Clone)]
enum Value {
    Number(i64),
    Text(String),
}

/// Entry point for the demo.
///
/// # Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Store "UltimateAnswer" (long TTL) and "Spock" (short TTL)
/// 4. Read and then expire "UltimateAnswer"
/// 5. Wait past the short TTL and look "Spock" up again with get_or_set
/// 6. Stop the reaper
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ttl_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: reaper_batch={}, long_ttl={}s, short_ttl={}s, wait={}s",
        config.reaper_batch, config.demo_long_ttl, config.demo_short_ttl, config.demo_wait
    );

    let cache = Cache::with_config(&config)?;

    info!("Setting up cache...");
    cache.set("UltimateAnswer", Value::Number(42), config.long_ttl());
    cache.set(
        "Spock",
        Value::Text("Live long and prosper.".to_string()),
        config.short_ttl(),
    );

    info!("Searching for answers...");
    match cache.get("UltimateAnswer") {
        Some(Value::Number(answer)) => info!("The answer is, of course, {}.", answer),
        Some(other) => warn!("Unexpected answer: {:?}", other),
        None => warn!("Failed to answer the ultimate question."),
    }
    cache.expire("UltimateAnswer");

    info!("Searching for Spock...");
    tokio::time::sleep(config.wait()).await;
    let (value, found) = cache.get_or_set(
        "Spock",
        Value::Text("Live long and prosper.".to_string()),
        config.long_ttl(),
    );
    if found {
        warn!("Found Spock, that was unexpected!");
    } else {
        info!("Spock not found, releasing Genesis device.");
        match value {
            Value::Text(text) => info!("{}", text),
            Value::Number(n) => info!("{}", n),
        }
    }

    let stats = cache.stats();
    info!(
        "Cache stats: hits={}, misses={}, expirations={}, entries={}",
        stats.hits, stats.misses, stats.expirations, stats.total_entries
    );

    cache.shutdown();
    Ok(())
}
