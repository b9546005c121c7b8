//! Redis-backed key-value store
//!
//! Uses the synchronous redis client. Connections are checked out of a small
//! idle pool per call so that a consumer parked in `BLPOP` never stalls
//! publishers or other consumers sharing the same store handle.

use crate::store::address::StoreAddress;
use crate::store::error::{StoreError, StoreResult};
use crate::store::KeyValueStore;
use redis::Commands;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

/// Upper bound on connections kept around between calls
const MAX_IDLE_CONNECTIONS: usize = 8;

/// Smallest non-zero BLPOP timeout; Redis reads `0` as "wait forever"
///
/// Fractional BLPOP timeouts need Redis 6.0 or later; older servers reject them.
const MIN_BLOCKING_TIMEOUT_SECS: f64 = 0.001;

pub struct RedisStore {
    client: redis::Client,
    address: StoreAddress,
    idle: Mutex<Vec<redis::Connection>>,
}

impl RedisStore {
    /// Build a store for `address` without contacting the server
    ///
    /// Fails only if the client rejects the address.
    pub fn open(address: &StoreAddress) -> StoreResult<Self> {
        let client =
            redis::Client::open(address.to_url()).map_err(|e| StoreError::InvalidAddress {
                address: address.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            address: address.clone(),
            idle: Mutex::new(Vec::new()),
        })
    }

    /// Build a store and verify the server answers `PING`
    pub fn connect(address: &StoreAddress) -> StoreResult<Self> {
        let store = Self::open(address)?;
        store.with_connection(|conn| redis::cmd("PING").query::<String>(conn))?;
        log::debug!("Connected to key-value store at {}", store.address);
        Ok(store)
    }

    pub fn address(&self) -> &StoreAddress {
        &self.address
    }

    fn checkout(&self) -> StoreResult<redis::Connection> {
        let pooled = self
            .idle
            .lock()
            .map_err(|e| StoreError::LockPoisoned {
                message: e.to_string(),
            })?
            .pop();

        match pooled {
            Some(conn) => Ok(conn),
            None => Ok(self.client.get_connection()?),
        }
    }

    fn checkin(&self, conn: redis::Connection) {
        if let Ok(mut idle) = self.idle.lock() {
            if idle.len() < MAX_IDLE_CONNECTIONS {
                idle.push(conn);
            }
        }
    }

    /// Run one command on a pooled connection
    ///
    /// A connection that produced an error is dropped rather than reused, since
    /// its protocol state is unknown.
    fn with_connection<T, F>(&self, operation: F) -> StoreResult<T>
    where
        F: FnOnce(&mut redis::Connection) -> redis::RedisResult<T>,
    {
        let mut conn = self.checkout()?;
        let result = operation(&mut conn)?;
        self.checkin(conn);
        Ok(result)
    }
}

impl KeyValueStore for RedisStore {
    fn increment(&self, key: &str) -> StoreResult<u64> {
        let value: i64 = self.with_connection(|conn| conn.incr(key, 1))?;
        u64::try_from(value).map_err(|_| StoreError::UnexpectedValue {
            key: key.to_string(),
            message: format!("counter went negative ({})", value),
        })
    }

    fn set_add(&self, key: &str, member: &str) -> StoreResult<()> {
        self.with_connection(|conn| conn.sadd(key, member))
    }

    fn set_remove(&self, key: &str, member: &str) -> StoreResult<()> {
        self.with_connection(|conn| conn.srem(key, member))
    }

    fn set_members(&self, key: &str) -> StoreResult<HashSet<String>> {
        self.with_connection(|conn| conn.smembers(key))
    }

    fn string_set_with_expiry(&self, key: &str, ttl_secs: u64, value: &[u8]) -> StoreResult<()> {
        self.with_connection(|conn| {
            redis::cmd("SETEX")
                .arg(key)
                .arg(ttl_secs)
                .arg(value)
                .query(conn)
        })
    }

    fn string_get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        self.with_connection(|conn| conn.get(key))
    }

    fn list_push_tail(&self, key: &str, value: &str) -> StoreResult<()> {
        self.with_connection(|conn| conn.rpush(key, value))
    }

    fn list_pop_head(&self, key: &str) -> StoreResult<Option<String>> {
        self.with_connection(|conn| redis::cmd("LPOP").arg(key).query(conn))
    }

    fn list_pop_head_blocking(
        &self,
        key: &str,
        timeout: Duration,
    ) -> StoreResult<Option<String>> {
        let timeout_secs = if timeout.is_zero() {
            0.0
        } else {
            timeout.as_secs_f64().max(MIN_BLOCKING_TIMEOUT_SECS)
        };

        // BLPOP replies with (key, value) or nil on timeout
        let popped: Option<(String, String)> = self.with_connection(|conn| {
            redis::cmd("BLPOP").arg(key).arg(timeout_secs).query(conn)
        })?;
        Ok(popped.map(|(_, value)| value))
    }

    fn list_len(&self, key: &str) -> StoreResult<usize> {
        self.with_connection(|conn| conn.llen(key))
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        self.with_connection(|conn| conn.del(key))
    }

    fn keys_matching(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let mut keys: Vec<String> = self.with_connection(|conn| conn.keys(pattern))?;
        keys.sort();
        Ok(keys)
    }
}
