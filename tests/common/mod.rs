//! Common test utilities
//!
//! Scenario tests run against every available store: always the in-process
//! `MemoryStore`, plus a real Redis when `PUBSUB_TEST_REDIS_URL` is set
//! (for example `redis://127.0.0.1:6379/15`).

#![allow(dead_code)]

use reliable_pubsub::pubsub::Broker;
use reliable_pubsub::store::{KeyValueStore, MemoryStore, RedisStore, StoreAddress};
use std::sync::{Arc, Once};

pub const REDIS_URL_ENV: &str = "PUBSUB_TEST_REDIS_URL";

static INIT_LOGGING: Once = Once::new();

/// Route library logs to stderr once per test binary
pub fn init_test_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = reliable_pubsub::core::logging::init_logging(
            Some("debug"),
            Some("ext"),
            None,
            false,
        );
    });
}

/// Redis store from the environment, if one is configured
pub fn redis_store() -> Option<Arc<RedisStore>> {
    let url = std::env::var(REDIS_URL_ENV).ok()?;
    let address: StoreAddress = url
        .parse()
        .unwrap_or_else(|e| panic!("{} is not a valid address: {}", REDIS_URL_ENV, e));
    let store = RedisStore::connect(&address)
        .unwrap_or_else(|e| panic!("{} is set but Redis is unreachable: {}", REDIS_URL_ENV, e));
    Some(Arc::new(store))
}

/// One broker per available store, each over a freshly purged namespace
pub fn test_brokers(namespace: &str) -> Vec<(&'static str, Broker)> {
    init_test_logging();

    let memory: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let mut brokers = vec![("memory", Broker::new(namespace, memory).unwrap())];

    if let Some(redis) = redis_store() {
        let broker = Broker::new(namespace, redis as Arc<dyn KeyValueStore>).unwrap();
        broker.purge().unwrap();
        brokers.push(("redis", broker));
    }

    brokers
}
