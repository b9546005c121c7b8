//! Typed consumers for JSON message bodies
//!
//! Wraps a [`ConsumerHandle`] so callers receive deserialized values instead of
//! raw bytes. Pairs with [`crate::pubsub::Broker::publish_json`].

use crate::pubsub::broker::Broker;
use crate::pubsub::consumer::ConsumerHandle;
use crate::pubsub::error::{PubSubError, PubSubResult};
use crate::pubsub::message::{Message, MessageHeader};
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::time::Duration;

const PREVIEW_BYTES: usize = 100;

/// A consumer that deserializes every message body as JSON into `T`
///
/// # Example
///
/// ```rust,no_run
/// use reliable_pubsub::pubsub::{Broker, TypedBrokerExt};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Order { id: u32, sku: String }
///
/// # fn example(broker: Broker) -> Result<(), Box<dyn std::error::Error>> {
/// let orders = broker.subscribe_typed::<Order>("orders", "fulfillment")?;
/// broker.publish_json("orders", &Order { id: 7, sku: "A-1".into() }, 3600)?;
///
/// if let Some(order) = orders.try_consume()? {
///     println!("Shipping {} ({})", order.id, order.sku);
/// }
/// # Ok(())
/// # }
/// ```
pub struct TypedConsumer<T> {
    inner: ConsumerHandle,
    _phantom: PhantomData<fn() -> T>,
}

impl<T> TypedConsumer<T>
where
    T: DeserializeOwned,
{
    pub fn new(inner: ConsumerHandle) -> Self {
        Self {
            inner,
            _phantom: PhantomData,
        }
    }

    /// Receive and deserialize the next message; same semantics as
    /// [`ConsumerHandle::consume`]
    ///
    /// A body that fails to deserialize has already been removed from the
    /// delivery list; the error carries its ID and a preview of its content.
    pub fn consume(&self, block: bool, timeout: Duration) -> PubSubResult<Option<T>> {
        Ok(self
            .consume_with_header(block, timeout)?
            .map(|typed| typed.content))
    }

    pub fn try_consume(&self) -> PubSubResult<Option<T>> {
        self.consume(false, Duration::ZERO)
    }

    /// Like [`TypedConsumer::consume`] but keeps the message ID and queue
    pub fn consume_with_header(
        &self,
        block: bool,
        timeout: Duration,
    ) -> PubSubResult<Option<TypedMessage<T>>> {
        match self.inner.consume(block, timeout)? {
            Some(message) => {
                let content = deserialize_message::<T>(&message)?;
                Ok(Some(TypedMessage {
                    header: message.header,
                    content,
                }))
            }
            None => Ok(None),
        }
    }

    /// Underlying handle, e.g. for `pending()` or `unsubscribe()`
    pub fn inner(&self) -> &ConsumerHandle {
        &self.inner
    }

    pub fn into_inner(self) -> ConsumerHandle {
        self.inner
    }
}

fn deserialize_message<T: DeserializeOwned>(message: &Message) -> PubSubResult<T> {
    serde_json::from_slice(&message.body).map_err(|e| {
        let preview_len = message.body.len().min(PREVIEW_BYTES);
        let preview = String::from_utf8_lossy(&message.body[..preview_len]);
        let ellipsis = if message.body.len() > PREVIEW_BYTES {
            "..."
        } else {
            ""
        };

        PubSubError::DeserializationError {
            message: format!(
                "Failed to deserialize message to {}: {} | id: {}, queue: '{}' | data_length: {}, data_preview: '{}{}'",
                std::any::type_name::<T>(),
                e,
                message.header.id,
                message.header.queue,
                message.body.len(),
                preview,
                ellipsis
            ),
        }
    })
}

/// Deserialized content together with its header
#[derive(Debug, Clone)]
pub struct TypedMessage<T> {
    pub header: MessageHeader,
    pub content: T,
}

impl<T> TypedMessage<T> {
    pub fn id(&self) -> u64 {
        self.header.id
    }

    pub fn queue(&self) -> &str {
        &self.header.queue
    }
}

/// Extension trait for subscribing with a typed consumer
pub trait TypedBrokerExt {
    /// Subscribe `consumer_id` to `queue`, deserializing bodies into `T`
    fn subscribe_typed<T>(&self, queue: &str, consumer_id: &str) -> PubSubResult<TypedConsumer<T>>
    where
        T: DeserializeOwned;
}

impl TypedBrokerExt for Broker {
    fn subscribe_typed<T>(&self, queue: &str, consumer_id: &str) -> PubSubResult<TypedConsumer<T>>
    where
        T: DeserializeOwned,
    {
        let handle = self.subscribe(queue, consumer_id)?;
        Ok(TypedConsumer::new(handle))
    }
}

// Tests are located in src/pubsub/tests/typed.rs
