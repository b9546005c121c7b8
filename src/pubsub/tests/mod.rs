//! Test modules for the publish/subscribe protocol
//!
//! Tests run against the in-process MemoryStore, organised by functional area.


use crate::pubsub::Broker;
use crate::store::{KeyValueStore, MemoryStore};
use std::sync::Arc;

/// Broker over a fresh in-memory store, plus direct access to that store
pub(crate) fn memory_broker(namespace: &str) -> (Broker, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let broker = Broker::new(namespace, Arc::clone(&store) as Arc<dyn KeyValueStore>).unwrap();
    (broker, store)
}
