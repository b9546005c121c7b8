//! End-to-end delivery scenarios through the public API
//!
//! Each test runs once per available store. Redis runs are serialised since
//! they share one server.

mod common;

use common::test_brokers;
use reliable_pubsub::pubsub::Broker;
use reliable_pubsub::store::KeyValueStore;
use serial_test::serial;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
#[serial]
fn test_fan_out_to_independent_identities() {
    for (store, broker) in test_brokers("it_fanout") {
        let inventory = broker.subscribe("orders", "inventory").unwrap();
        let fulfillment = broker.subscribe("orders", "fulfillment").unwrap();

        let id = broker.publish("orders", "order-1", 60).unwrap();

        for handle in [&inventory, &fulfillment] {
            let message = handle.try_consume().unwrap().unwrap();
            assert_eq!(message.id(), id, "store: {}", store);
            assert_eq!(message.as_str(), Some("order-1"), "store: {}", store);
            assert!(handle.try_consume().unwrap().is_none(), "store: {}", store);
        }

        broker.purge().unwrap();
    }
}

#[test]
#[serial]
fn test_shared_identity_splits_messages() {
    for (store, broker) in test_brokers("it_pool") {
        let first = broker.subscribe("jobs", "workers").unwrap();
        let second = broker.subscribe("jobs", "workers").unwrap();

        let a = broker.publish("jobs", "a", 60).unwrap();
        let b = broker.publish("jobs", "b", 60).unwrap();

        assert_eq!(first.try_consume().unwrap().unwrap().id(), a, "store: {}", store);
        assert_eq!(second.try_consume().unwrap().unwrap().id(), b, "store: {}", store);
        assert!(first.try_consume().unwrap().is_none(), "store: {}", store);
        assert!(second.try_consume().unwrap().is_none(), "store: {}", store);

        broker.purge().unwrap();
    }
}

#[test]
#[serial]
fn test_late_subscriber_sees_only_later_messages() {
    for (store, broker) in test_brokers("it_late") {
        let early = broker.subscribe("news", "early").unwrap();
        let before = broker.publish("news", "before", 60).unwrap();

        let late = broker.subscribe("news", "late").unwrap();
        let after = broker.publish("news", "after", 60).unwrap();

        assert_eq!(early.try_consume().unwrap().unwrap().id(), before, "store: {}", store);
        assert_eq!(early.try_consume().unwrap().unwrap().id(), after, "store: {}", store);
        assert_eq!(late.try_consume().unwrap().unwrap().id(), after, "store: {}", store);
        assert!(late.try_consume().unwrap().is_none(), "store: {}", store);

        broker.purge().unwrap();
    }
}

#[test]
#[serial]
fn test_publish_without_subscribers_still_mints_id() {
    for (store, broker) in test_brokers("it_nobody") {
        let first = broker.publish("void", "x", 60).unwrap();
        let second = broker.publish("void", "y", 60).unwrap();

        assert_eq!(first, 1, "store: {}", store);
        assert_eq!(second, 2, "store: {}", store);
        assert!(broker.consumers("void").unwrap().is_empty(), "store: {}", store);

        broker.purge().unwrap();
    }
}

#[test]
#[serial]
fn test_blocking_consume_wakes_on_publish() {
    for (store, broker) in test_brokers("it_block") {
        let handle = broker.subscribe("events", "reader").unwrap();

        let publisher = {
            let broker = broker.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(100));
                broker.publish("events", "wake", 60).unwrap()
            })
        };

        let message = handle.consume(true, Duration::from_secs(5)).unwrap().unwrap();
        assert_eq!(message.id(), publisher.join().unwrap(), "store: {}", store);
        assert_eq!(message.as_str(), Some("wake"), "store: {}", store);

        broker.purge().unwrap();
    }
}

#[test]
#[serial]
fn test_blocking_consume_times_out() {
    for (store, broker) in test_brokers("it_timeout") {
        let handle = broker.subscribe("events", "reader").unwrap();

        let started = Instant::now();
        let message = handle.consume(true, Duration::from_secs(1)).unwrap();
        let elapsed = started.elapsed();

        assert!(message.is_none(), "store: {}", store);
        assert!(elapsed >= Duration::from_millis(900), "store: {} took {:?}", store, elapsed);
        assert!(elapsed < Duration::from_secs(3), "store: {} took {:?}", store, elapsed);

        broker.purge().unwrap();
    }
}

#[test]
#[serial]
fn test_expired_body_is_skipped() {
    for (store, broker) in test_brokers("it_expiry") {
        let handle = broker.subscribe("events", "reader").unwrap();

        broker.publish("events", "short lived", 1).unwrap();
        let survivor = broker.publish("events", "long lived", 60).unwrap();

        thread::sleep(Duration::from_millis(1500));

        let message = handle.consume(true, Duration::from_secs(1)).unwrap().unwrap();
        assert_eq!(message.id(), survivor, "store: {}", store);
        assert!(handle.try_consume().unwrap().is_none(), "store: {}", store);

        broker.purge().unwrap();
    }
}

#[test]
#[serial]
fn test_unsubscribe_clears_backlog_and_membership() {
    for (store, broker) in test_brokers("it_unsub") {
        let handle = broker.subscribe("orders", "leaving").unwrap();
        broker.publish("orders", "unread", 60).unwrap();

        handle.unsubscribe().unwrap();
        broker.publish("orders", "after", 60).unwrap();

        assert!(broker.consumers("orders").unwrap().is_empty(), "store: {}", store);
        let list = broker.keys().delivery_list("orders", "leaving");
        assert_eq!(broker.store().list_len(&list).unwrap(), 0, "store: {}", store);

        broker.purge().unwrap();
    }
}

#[test]
#[serial]
fn test_key_layout_on_the_store() {
    for (store, broker) in test_brokers("it_layout") {
        broker.subscribe("orders", "inventory").unwrap();
        let id = broker.publish("orders", "payload", 60).unwrap();

        let kv = broker.store();
        assert_eq!(kv.increment("it_layout.nextid").unwrap(), id + 1, "store: {}", store);
        assert!(kv
            .set_members("it_layout.orders.consumers")
            .unwrap()
            .contains("inventory"));
        assert_eq!(
            kv.string_get(&format!("it_layout.orders.messages.{}", id)).unwrap(),
            Some(b"payload".to_vec()),
            "store: {}",
            store
        );
        assert_eq!(
            kv.list_pop_head("it_layout.orders.inventory.messages").unwrap(),
            Some(id.to_string()),
            "store: {}",
            store
        );

        broker.purge().unwrap();
    }
}

#[test]
#[serial]
fn test_purge_leaves_other_namespaces() {
    for (store, broker) in test_brokers("it_purge") {
        let other = Broker::new("it_purge_other", Arc::clone(broker.store())).unwrap();
        other.purge().unwrap();
        let keep = other.subscribe("q", "c").unwrap();
        other.publish("q", "kept", 60).unwrap();

        broker.subscribe("q", "c").unwrap();
        broker.publish("q", "gone", 60).unwrap();
        broker.purge().unwrap();

        assert!(broker.consumers("q").unwrap().is_empty(), "store: {}", store);
        assert_eq!(broker.publish("q", "fresh", 60).unwrap(), 1, "store: {}", store);
        assert_eq!(keep.try_consume().unwrap().unwrap().as_str(), Some("kept"), "store: {}", store);

        other.purge().unwrap();
        broker.purge().unwrap();
    }
}
