//! Reliable Publish/Subscribe
//!
//! Publish a message once and have it fanned out to every consumer identity
//! subscribed to a queue, each identity receiving its own FIFO delivery list.
//! All state lives in a key-value store; any number of processes can publish
//! and consume against the same namespace concurrently.
//!
//! # Overview
//!
//! - **Broker**: namespace-scoped; registers consumer identities on queues and
//!   publishes messages
//! - **ConsumerHandle**: bound to one (queue, identity) pair; consumes and
//!   unsubscribes
//! - **Message IDs**: minted by an atomic store-side counter, strictly
//!   increasing per namespace and never reused
//! - **Expiry**: message bodies carry a TTL; an ID whose body expired before it
//!   was consumed is skipped transparently
//! - **Competing consumers**: handles sharing an identity split that identity's
//!   messages between them
//!
//! # Architecture
//!
//! ```text
//!  publish("orders", body)
//!        │
//!        ├─ INCR     shop.nextid ───────────────────────────► id = 7
//!        ├─ SETEX    shop.orders.messages.7  (body, ttl)
//!        ├─ SMEMBERS shop.orders.consumers ─────────────────► {invoicing, fulfillment}
//!        ├─ RPUSH    shop.orders.invoicing.messages   7
//!        └─ RPUSH    shop.orders.fulfillment.messages 7
//!
//! ┌────────────────────────────────┐   ┌──────────────────────────────────┐
//! │ shop.orders.invoicing.messages │   │ shop.orders.fulfillment.messages │
//! │ ┌───┬───┬───┐                  │   │ ┌───┬───┐                        │
//! │ │ 5 │ 6 │ 7 │                  │   │ │ 6 │ 7 │                        │
//! │ └─▲─┴───┴───┘                  │   │ └─▲─┴───┘                        │
//! └───┼────────────────────────────┘   └───┼──────────────────────────────┘
//!     │ BLPOP / LPOP, then GET body        │
//! ┌───┴──────────┐               ┌─────────┴─┐   ┌───────────┐
//! │  invoicing   │               │fulfillment│   │fulfillment│  (competing)
//! └──────────────┘               └───────────┘   └───────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust
//! use reliable_pubsub::pubsub::Broker;
//! use reliable_pubsub::store::MemoryStore;
//! use std::sync::Arc;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let broker = Broker::new("shop", Arc::new(MemoryStore::new()))?;
//!
//! let invoicing = broker.subscribe("orders", "invoicing")?;
//! let fulfillment = broker.subscribe("orders", "fulfillment")?;
//!
//! let id = broker.publish("orders", "order data", 3600)?;
//! assert_eq!(id, 1);
//!
//! let a = invoicing.try_consume()?.unwrap();
//! let b = fulfillment.try_consume()?.unwrap();
//! assert_eq!(a.as_str(), Some("order data"));
//! assert_eq!(a, b);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

mod broker;
mod config;
mod consumer;
mod error;
mod keys;
mod message;
mod typed;

pub use broker::{Broker, DEFAULT_TTL_SECS};
pub use config::{BrokerConfig, ConfigError, DEFAULT_NAMESPACE};
pub use consumer::ConsumerHandle;
pub use error::{PubSubError, PubSubResult};
pub use keys::KeySpace;
pub use message::{Message, MessageHeader};
pub use typed::{TypedBrokerExt, TypedConsumer, TypedMessage};

#[cfg(test)]
mod tests;
