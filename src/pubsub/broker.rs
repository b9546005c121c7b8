//! Broker - namespace-scoped subscription registry and publish fan-out
//!
//! The Broker owns no state of its own beyond its namespace and a store handle.
//! All coordination between concurrent publishers and consumers, in this
//! process or any other, goes through the store's atomic single-key primitives.

use crate::core::validation::{validate_key_segment, validate_namespace, validate_ttl_secs};
use crate::core::version;
use crate::pubsub::config::BrokerConfig;
use crate::pubsub::consumer::ConsumerHandle;
use crate::pubsub::error::{PubSubError, PubSubResult};
use crate::pubsub::keys::KeySpace;
use crate::store::{KeyValueStore, RedisStore, StoreAddress};
use serde::Serialize;
use std::sync::Arc;

/// Default message time-to-live in seconds
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Namespace-scoped publish/subscribe broker
///
/// Publishing is a three-step protocol:
///
/// 1. `INCR <ns>.nextid` mints the message ID
/// 2. `SETEX <ns>.<queue>.messages.<id>` stores the body with its TTL
/// 3. `SMEMBERS <ns>.<queue>.consumers` snapshots the subscribers and each one
///    gets `RPUSH <ns>.<queue>.<consumer>.messages <id>`
///
/// The steps are not a transaction. A subscriber racing step 3 may or may not
/// see the message, and a crash between steps can leave an ID without a body,
/// which consumers skip.
///
/// # Example
///
/// ```rust,no_run
/// use reliable_pubsub::pubsub::Broker;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let broker = Broker::connect("shop", "localhost:6379")?;
///
/// let fulfillment = broker.subscribe("orders", "fulfillment")?;
/// let id = broker.publish("orders", "order data", 3600)?;
///
/// let message = fulfillment.consume(true, std::time::Duration::from_secs(5))?;
/// assert_eq!(message.map(|m| m.header.id), Some(id));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Broker {
    keys: KeySpace,
    store: Arc<dyn KeyValueStore>,
    default_ttl_secs: u64,
}

impl std::fmt::Debug for Broker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broker")
            .field("namespace", &self.keys.namespace())
            .field("default_ttl_secs", &self.default_ttl_secs)
            .finish_non_exhaustive()
    }
}

pub(crate) fn validate_name(kind: &'static str, name: &str) -> PubSubResult<()> {
    validate_key_segment(name).map_err(|reason| PubSubError::InvalidName {
        kind,
        name: name.to_string(),
        reason,
    })
}

fn validate_broker_namespace(namespace: &str) -> PubSubResult<()> {
    validate_namespace(namespace).map_err(|reason| PubSubError::InvalidName {
        kind: "namespace",
        name: namespace.to_string(),
        reason,
    })
}

fn validate_ttl(ttl_secs: u64) -> PubSubResult<u64> {
    validate_ttl_secs(ttl_secs).map_err(|message| PubSubError::InvalidTtl { message })
}

impl Broker {
    /// Create a broker over an existing store handle
    pub fn new(namespace: &str, store: Arc<dyn KeyValueStore>) -> PubSubResult<Self> {
        validate_broker_namespace(namespace)?;
        Ok(Self {
            keys: KeySpace::new(namespace),
            store,
            default_ttl_secs: DEFAULT_TTL_SECS,
        })
    }

    /// Connect to a Redis store at `address` (`host`, `host:port` or URL)
    ///
    /// The namespace and address are validated before any connection attempt.
    pub fn connect(namespace: &str, address: &str) -> PubSubResult<Self> {
        validate_broker_namespace(namespace)?;
        let address: StoreAddress = address.parse()?;
        Self::connect_to(namespace, &address)
    }

    pub fn connect_to(namespace: &str, address: &StoreAddress) -> PubSubResult<Self> {
        validate_broker_namespace(namespace)?;
        log::debug!(
            "Connecting broker '{}' to {} (reliable-pubsub {}, key schema v{}, build {} {})",
            namespace,
            address,
            version::crate_version(),
            version::key_schema_version(),
            version::git_hash(),
            version::build_time()
        );
        let store = RedisStore::connect(address)?;
        Self::new(namespace, Arc::new(store))
    }

    /// Connect using a loaded configuration
    pub fn from_config(config: &BrokerConfig) -> PubSubResult<Self> {
        config.validate()?;
        let address = config.store_address()?;
        Self::connect_to(&config.namespace, &address)?.with_default_ttl(config.default_ttl_secs)
    }

    /// Replace the TTL used by [`Broker::publish_with_default_ttl`]
    pub fn with_default_ttl(mut self, ttl_secs: u64) -> PubSubResult<Self> {
        self.default_ttl_secs = validate_ttl(ttl_secs)?;
        Ok(self)
    }

    pub fn namespace(&self) -> &str {
        self.keys.namespace()
    }

    pub fn keys(&self) -> &KeySpace {
        &self.keys
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn default_ttl_secs(&self) -> u64 {
        self.default_ttl_secs
    }

    /// Register `consumer_id` on `queue` and return a handle for it
    ///
    /// Idempotent: subscribing an identity twice leaves it in the set once, and
    /// every handle for the same identity drains the same delivery list.
    /// Messages published before this call are not delivered.
    pub fn subscribe(&self, queue: &str, consumer_id: &str) -> PubSubResult<ConsumerHandle> {
        validate_name("queue", queue)?;
        validate_name("consumer identity", consumer_id)?;

        self.store
            .set_add(&self.keys.consumers(queue), consumer_id)?;
        log::debug!(
            "Subscribed '{}' to queue '{}' in namespace '{}'",
            consumer_id,
            queue,
            self.namespace()
        );

        Ok(ConsumerHandle::new(
            self.keys.clone(),
            Arc::clone(&self.store),
            queue.to_string(),
            consumer_id.to_string(),
        ))
    }

    /// Publish `message` to every identity currently subscribed to `queue`
    ///
    /// Returns the message ID. With no subscribers the ID is still consumed and
    /// the body still written; it simply expires unread.
    pub fn publish(
        &self,
        queue: &str,
        message: impl AsRef<[u8]>,
        ttl_secs: u64,
    ) -> PubSubResult<u64> {
        validate_name("queue", queue)?;
        let ttl_secs = validate_ttl(ttl_secs)?;

        let message_id = self.store.increment(&self.keys.next_id())?;
        let id = message_id.to_string();

        self.store.string_set_with_expiry(
            &self.keys.message(queue, &id),
            ttl_secs,
            message.as_ref(),
        )?;

        let consumers = self.store.set_members(&self.keys.consumers(queue))?;
        for consumer_id in &consumers {
            self.store
                .list_push_tail(&self.keys.delivery_list(queue, consumer_id), &id)?;
        }

        log::debug!(
            "Published message {} to queue '{}' in namespace '{}' for {} consumer(s)",
            message_id,
            queue,
            self.namespace(),
            consumers.len()
        );

        Ok(message_id)
    }

    /// [`Broker::publish`] with the broker's default TTL
    pub fn publish_with_default_ttl(
        &self,
        queue: &str,
        message: impl AsRef<[u8]>,
    ) -> PubSubResult<u64> {
        self.publish(queue, message, self.default_ttl_secs)
    }

    /// Serialize `payload` as JSON and publish it
    pub fn publish_json<T: Serialize>(
        &self,
        queue: &str,
        payload: &T,
        ttl_secs: u64,
    ) -> PubSubResult<u64> {
        let body = serde_json::to_vec(payload).map_err(|e| PubSubError::SerializationError {
            message: format!(
                "Failed to serialize {} for queue '{}': {}",
                std::any::type_name::<T>(),
                queue,
                e
            ),
        })?;
        self.publish(queue, body, ttl_secs)
    }

    /// Identities currently subscribed to `queue`, sorted
    pub fn consumers(&self, queue: &str) -> PubSubResult<Vec<String>> {
        validate_name("queue", queue)?;
        let mut consumers: Vec<String> = self
            .store
            .set_members(&self.keys.consumers(queue))?
            .into_iter()
            .collect();
        consumers.sort();
        Ok(consumers)
    }

    /// Delete every key in this broker's namespace, returning how many
    ///
    /// Scans the store's key space; intended for teardown, not regular traffic.
    /// Counters restart at 1 afterwards, so never purge a namespace that live
    /// consumers still hold message IDs for.
    pub fn purge(&self) -> PubSubResult<usize> {
        // Namespaces hold no pattern metacharacters, so this matches literally
        let keys = self.store.keys_matching(&self.keys.pattern())?;
        for key in &keys {
            self.store.delete(key)?;
        }
        log::debug!(
            "Purged {} key(s) from namespace '{}'",
            keys.len(),
            self.namespace()
        );
        Ok(keys.len())
    }
}
