//! Store key layout
//!
//! Every key a broker touches is built here, so the layout stays identical to
//! deployments already running against the same store:
//!
//! ```text
//! <namespace>.nextid                              INT   message ID counter
//! <namespace>.<queue>.consumers                   SET   subscribed consumer identities
//! <namespace>.<queue>.messages.<id>               STR   message body (with TTL)
//! <namespace>.<queue>.<consumer>.messages         LIST  pending message IDs for one identity
//! ```

use crate::core::validation::KEY_SEPARATOR;

const NEXT_ID: &str = "nextid";
const CONSUMERS: &str = "consumers";
const MESSAGES: &str = "messages";

/// Key builder bound to one namespace
///
/// Pure string manipulation; never touches the store. Callers are expected to
/// have validated the segments (see [`crate::core::validation`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    namespace: String,
}

impl KeySpace {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn key(&self, segments: &[&str]) -> String {
        let mut key = self.namespace.clone();
        for segment in segments {
            key.push(KEY_SEPARATOR);
            key.push_str(segment);
        }
        key
    }

    /// Namespace-wide message ID counter
    pub fn next_id(&self) -> String {
        self.key(&[NEXT_ID])
    }

    /// Set of consumer identities subscribed to `queue`
    pub fn consumers(&self, queue: &str) -> String {
        self.key(&[queue, CONSUMERS])
    }

    /// Body of message `message_id` published to `queue`
    pub fn message(&self, queue: &str, message_id: &str) -> String {
        self.key(&[queue, MESSAGES, message_id])
    }

    /// Delivery list of pending message IDs for `consumer_id` on `queue`
    pub fn delivery_list(&self, queue: &str, consumer_id: &str) -> String {
        self.key(&[queue, consumer_id, MESSAGES])
    }

    /// Glob matching every key in this namespace
    ///
    /// The namespace is not escaped; broker namespaces are validated to hold
    /// no pattern metacharacters.
    pub fn pattern(&self) -> String {
        format!("{}{}*", self.namespace, KEY_SEPARATOR)
    }
}
