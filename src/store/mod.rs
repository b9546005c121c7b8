//! Key-Value Store Adapter
//!
//! The publish/subscribe protocol never talks to a store directly. Everything it
//! needs is expressed as a small set of primitive operations on string keys,
//! captured by the [`KeyValueStore`] trait:
//!
//! | Primitive                  | Redis command | Used by              |
//! |----------------------------|---------------|----------------------|
//! | `increment`                | `INCR`        | publish (ID mint)    |
//! | `set_add` / `set_remove`   | `SADD`/`SREM` | subscribe/unsubscribe|
//! | `set_members`              | `SMEMBERS`    | publish (fan-out)    |
//! | `string_set_with_expiry`   | `SETEX`       | publish (body)       |
//! | `string_get`               | `GET`         | consume (resolve)    |
//! | `list_push_tail`           | `RPUSH`       | publish (fan-out)    |
//! | `list_pop_head`            | `LPOP`        | consume              |
//! | `list_pop_head_blocking`   | `BLPOP`       | consume              |
//! | `list_len`                 | `LLEN`        | pending count        |
//! | `delete`                   | `DEL`         | unsubscribe          |
//! | `keys_matching`            | `KEYS`        | namespace purge only |
//!
//! Every primitive is atomic on its single key; no operation spans keys.
//!
//! Two implementations ship with the crate:
//!
//! - [`RedisStore`] for a real Redis (or protocol-compatible) server
//! - [`MemoryStore`], an in-process store with the same semantics, used by the
//!   test suite and by embedded single-process deployments

mod address;
mod error;
mod memory;
mod redis_store;

pub use address::{StoreAddress, DEFAULT_HOST, DEFAULT_PORT};
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

use std::collections::HashSet;
use std::time::Duration;

/// Primitive operations the publish/subscribe protocol requires from a store
///
/// Implementations must be safe to share between threads; the protocol calls
/// these from any number of concurrent publishers and consumers.
pub trait KeyValueStore: Send + Sync {
    /// Atomically increment the integer at `key`, creating it at 0 if absent,
    /// and return the post-increment value
    fn increment(&self, key: &str) -> StoreResult<u64>;

    /// Add `member` to the set at `key` (no-op if already present)
    fn set_add(&self, key: &str, member: &str) -> StoreResult<()>;

    /// Remove `member` from the set at `key` (no-op if absent)
    fn set_remove(&self, key: &str, member: &str) -> StoreResult<()>;

    /// Snapshot of all members of the set at `key`; empty if the key is absent
    fn set_members(&self, key: &str) -> StoreResult<HashSet<String>>;

    /// Store `value` at `key`, to be purged after `ttl_secs` seconds
    fn string_set_with_expiry(&self, key: &str, ttl_secs: u64, value: &[u8]) -> StoreResult<()>;

    /// Read the value at `key`, `None` if absent or expired
    fn string_get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Append `value` to the tail of the list at `key`
    fn list_push_tail(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Pop the head of the list at `key`, `None` if the list is empty
    fn list_pop_head(&self, key: &str) -> StoreResult<Option<String>>;

    /// Pop the head of the list at `key`, waiting up to `timeout` for an
    /// element to arrive. A zero timeout waits indefinitely.
    fn list_pop_head_blocking(&self, key: &str, timeout: Duration)
        -> StoreResult<Option<String>>;

    /// Number of elements in the list at `key`
    fn list_len(&self, key: &str) -> StoreResult<usize>;

    /// Remove `key` whatever its type
    fn delete(&self, key: &str) -> StoreResult<()>;

    /// All live keys matching a glob-style `pattern`
    ///
    /// Scans the whole key space; reserved for setup, cleanup and purge.
    fn keys_matching(&self, pattern: &str) -> StoreResult<Vec<String>>;
}
