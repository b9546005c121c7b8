//! Delivered message types

use std::string::FromUtf8Error;

/// Metadata recovered alongside a delivered body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    /// Namespace-wide message ID assigned at publish time
    pub id: u64,
    /// Queue the message was published to
    pub queue: String,
}

/// A message handed to a consumer
///
/// The body is returned exactly as it was published; the store keeps raw bytes.
///
/// # Example
///
/// ```rust,no_run
/// # use reliable_pubsub::pubsub::ConsumerHandle;
/// # fn example(handle: ConsumerHandle) -> Result<(), Box<dyn std::error::Error>> {
/// if let Some(message) = handle.try_consume()? {
///     println!("#{} on {}: {:?}", message.header.id, message.header.queue, message.as_str());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub body: Vec<u8>,
}

impl Message {
    pub fn new(id: u64, queue: String, body: Vec<u8>) -> Self {
        Self {
            header: MessageHeader { id, queue },
            body,
        }
    }

    pub fn id(&self) -> u64 {
        self.header.id
    }

    pub fn queue(&self) -> &str {
        &self.header.queue
    }

    /// Body as UTF-8 text, `None` if it is not valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }

    pub fn into_string(self) -> Result<String, FromUtf8Error> {
        String::from_utf8(self.body)
    }
}
