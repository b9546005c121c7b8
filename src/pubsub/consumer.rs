//! Consumer handles for draining a delivery list
//!
//! A handle is bound to one (queue, consumer identity) pair. Every identity has
//! a private delivery list of message IDs; consuming pops an ID and resolves it
//! to the stored body. Several handles may share an identity, in which case
//! they compete for the same list and each message goes to exactly one of them.

use crate::pubsub::error::{PubSubError, PubSubResult};
use crate::pubsub::keys::KeySpace;
use crate::pubsub::message::Message;
use crate::store::KeyValueStore;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Handle for receiving messages as one consumer identity
///
/// Handles are cheap to clone; clones share the identity and therefore the
/// delivery list.
///
/// # Example
///
/// ```rust,no_run
/// # use reliable_pubsub::pubsub::Broker;
/// # use std::time::Duration;
/// # fn example(broker: Broker) -> Result<(), Box<dyn std::error::Error>> {
/// let handle = broker.subscribe("orders", "invoicing")?;
///
/// // Wait up to five seconds for the next message
/// if let Some(message) = handle.consume(true, Duration::from_secs(5))? {
///     println!("Invoicing order: {:?}", message.as_str());
/// }
///
/// // Drain whatever is already queued without waiting
/// for message in handle.consume_batch(100)? {
///     println!("Backlog: {:?}", message.as_str());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ConsumerHandle {
    keys: KeySpace,
    store: Arc<dyn KeyValueStore>,
    queue: String,
    consumer_id: String,
}

impl std::fmt::Debug for ConsumerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsumerHandle")
            .field("namespace", &self.keys.namespace())
            .field("queue", &self.queue)
            .field("consumer_id", &self.consumer_id)
            .finish_non_exhaustive()
    }
}

impl ConsumerHandle {
    pub(crate) fn new(
        keys: KeySpace,
        store: Arc<dyn KeyValueStore>,
        queue: String,
        consumer_id: String,
    ) -> Self {
        Self {
            keys,
            store,
            queue,
            consumer_id,
        }
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    pub fn consumer_id(&self) -> &str {
        &self.consumer_id
    }

    pub fn namespace(&self) -> &str {
        self.keys.namespace()
    }

    fn delivery_list(&self) -> String {
        self.keys.delivery_list(&self.queue, &self.consumer_id)
    }

    /// Receive the next message for this identity
    ///
    /// With `block` set, waits until a message arrives or `timeout` elapses; a
    /// zero `timeout` waits indefinitely. The timeout bounds the whole call,
    /// including any retries after expired entries. Without `block`, returns
    /// `None` as soon as the delivery list is empty.
    ///
    /// IDs whose body already expired are discarded and the next ID is tried,
    /// in both modes. `None` therefore always means "nothing deliverable now".
    pub fn consume(&self, block: bool, timeout: Duration) -> PubSubResult<Option<Message>> {
        let list_key = self.delivery_list();
        let deadline = (block && !timeout.is_zero()).then(|| Instant::now() + timeout);

        loop {
            let popped = if block {
                let wait = match deadline {
                    Some(deadline) => {
                        let remaining = deadline.saturating_duration_since(Instant::now());
                        if remaining.is_zero() {
                            return Ok(None);
                        }
                        remaining
                    }
                    None => Duration::ZERO,
                };
                self.store.list_pop_head_blocking(&list_key, wait)?
            } else {
                self.store.list_pop_head(&list_key)?
            };

            let Some(raw_id) = popped else {
                return Ok(None);
            };
            log::trace!("Popped '{}' from {}", raw_id, list_key);

            if let Some(message) = self.resolve(&raw_id)? {
                return Ok(Some(message));
            }
        }
    }

    /// Look up the body for a popped ID, `None` if it can no longer be delivered
    fn resolve(&self, raw_id: &str) -> PubSubResult<Option<Message>> {
        let Ok(id) = raw_id.parse::<u64>() else {
            log::warn!(
                "Discarding malformed message ID '{}' from queue '{}' for '{}'",
                raw_id,
                self.queue,
                self.consumer_id
            );
            return Ok(None);
        };

        match self.store.string_get(&self.keys.message(&self.queue, raw_id))? {
            Some(body) => Ok(Some(Message::new(id, self.queue.clone(), body))),
            None => {
                log::debug!(
                    "Skipping expired message {} on queue '{}' for '{}'",
                    id,
                    self.queue,
                    self.consumer_id
                );
                Ok(None)
            }
        }
    }

    /// Non-blocking [`ConsumerHandle::consume`]
    pub fn try_consume(&self) -> PubSubResult<Option<Message>> {
        self.consume(false, Duration::ZERO)
    }

    /// Blocking [`ConsumerHandle::consume`]; a zero `timeout` waits indefinitely
    pub fn consume_blocking(&self, timeout: Duration) -> PubSubResult<Option<Message>> {
        self.consume(true, timeout)
    }

    /// Drain up to `max` already-queued messages without waiting
    pub fn consume_batch(&self, max: usize) -> PubSubResult<Vec<Message>> {
        let mut batch = Vec::with_capacity(max.min(64));

        for _ in 0..max {
            match self.try_consume()? {
                Some(message) => batch.push(message),
                None => break,
            }
        }

        Ok(batch)
    }

    /// Blocking consume on tokio's blocking thread pool
    ///
    /// The store call itself cannot be interrupted, so dropping the returned
    /// future does not abandon the pop; prefer a non-zero `timeout`.
    pub async fn consume_async(&self, timeout: Duration) -> PubSubResult<Option<Message>> {
        let handle = self.clone();
        tokio::task::spawn_blocking(move || handle.consume(true, timeout))
            .await
            .map_err(|e| PubSubError::OperationFailed {
                message: format!("Blocking consume task failed: {}", e),
            })?
    }

    /// Number of IDs waiting in this identity's delivery list
    ///
    /// Includes IDs whose body may already have expired.
    pub fn pending(&self) -> PubSubResult<usize> {
        Ok(self.store.list_len(&self.delivery_list())?)
    }

    /// Remove this identity from the queue and delete its delivery list
    ///
    /// Undelivered messages are lost. This affects every handle sharing the
    /// identity; later publishes skip it until it subscribes again.
    pub fn unsubscribe(self) -> PubSubResult<()> {
        self.store
            .set_remove(&self.keys.consumers(&self.queue), &self.consumer_id)?;
        self.store.delete(&self.delivery_list())?;
        log::debug!(
            "Unsubscribed '{}' from queue '{}' in namespace '{}'",
            self.consumer_id,
            self.queue,
            self.keys.namespace()
        );
        Ok(())
    }
}
