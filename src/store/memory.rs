//! In-process key-value store
//!
//! Mirrors the semantics the protocol relies on from Redis: integer counters
//! stored as strings, sets, lists that disappear when emptied, strings with
//! lazy TTL expiry and a blocking list pop woken by pushes.

use crate::store::error::{StoreError, StoreResult};
use crate::store::KeyValueStore;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
enum Value {
    Str {
        data: Vec<u8>,
        expires_at: Option<Instant>,
    },
    Set(HashSet<String>),
    List(VecDeque<String>),
}

impl Value {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self, Value::Str { expires_at: Some(at), .. } if *at <= now)
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Str { .. } => "string",
            Value::Set(_) => "set",
            Value::List(_) => "list",
        }
    }
}

/// Thread-safe in-memory [`KeyValueStore`]
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
    /// Signalled on every list push so blocked pops can re-check
    list_pushed: Condvar,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys
    pub fn len(&self) -> StoreResult<usize> {
        let now = Instant::now();
        let entries = self.lock()?;
        Ok(entries.values().filter(|v| !v.is_expired(now)).count())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, HashMap<String, Value>>> {
        self.entries.lock().map_err(|e| StoreError::LockPoisoned {
            message: e.to_string(),
        })
    }
}

/// Drop `key` if it holds an expired string
fn purge_if_expired(entries: &mut HashMap<String, Value>, key: &str) {
    let now = Instant::now();
    if entries.get(key).is_some_and(|v| v.is_expired(now)) {
        entries.remove(key);
    }
}

fn wrong_type(key: &str, expected: &str, found: &Value) -> StoreError {
    StoreError::UnexpectedValue {
        key: key.to_string(),
        message: format!("expected {}, found {}", expected, found.type_name()),
    }
}

/// Pop the head of a list entry, removing the key once the list is empty
fn pop_front(entries: &mut HashMap<String, Value>, key: &str) -> StoreResult<Option<String>> {
    purge_if_expired(entries, key);
    let (popped, now_empty) = match entries.get_mut(key) {
        None => return Ok(None),
        Some(Value::List(list)) => {
            let popped = list.pop_front();
            (popped, list.is_empty())
        }
        Some(other) => return Err(wrong_type(key, "list", other)),
    };
    if now_empty {
        entries.remove(key);
    }
    Ok(popped)
}

impl KeyValueStore for MemoryStore {
    fn increment(&self, key: &str) -> StoreResult<u64> {
        let mut entries = self.lock()?;
        purge_if_expired(&mut entries, key);

        let current = match entries.get(key) {
            None => 0,
            Some(Value::Str { data, .. }) => std::str::from_utf8(data)
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .ok_or_else(|| StoreError::UnexpectedValue {
                    key: key.to_string(),
                    message: "value is not an integer".to_string(),
                })?,
            Some(other) => return Err(wrong_type(key, "string", other)),
        };

        let next = current + 1;
        // INCR keeps any existing TTL on the key
        let expires_at = match entries.get(key) {
            Some(Value::Str { expires_at, .. }) => *expires_at,
            _ => None,
        };
        entries.insert(
            key.to_string(),
            Value::Str {
                data: next.to_string().into_bytes(),
                expires_at,
            },
        );
        Ok(next)
    }

    fn set_add(&self, key: &str, member: &str) -> StoreResult<()> {
        let mut entries = self.lock()?;
        purge_if_expired(&mut entries, key);
        match entries
            .entry(key.to_string())
            .or_insert_with(|| Value::Set(HashSet::new()))
        {
            Value::Set(members) => {
                members.insert(member.to_string());
                Ok(())
            }
            other => Err(wrong_type(key, "set", other)),
        }
    }

    fn set_remove(&self, key: &str, member: &str) -> StoreResult<()> {
        let mut entries = self.lock()?;
        purge_if_expired(&mut entries, key);
        let now_empty = match entries.get_mut(key) {
            None => return Ok(()),
            Some(Value::Set(members)) => {
                members.remove(member);
                members.is_empty()
            }
            Some(other) => return Err(wrong_type(key, "set", other)),
        };
        if now_empty {
            entries.remove(key);
        }
        Ok(())
    }

    fn set_members(&self, key: &str) -> StoreResult<HashSet<String>> {
        let mut entries = self.lock()?;
        purge_if_expired(&mut entries, key);
        match entries.get(key) {
            None => Ok(HashSet::new()),
            Some(Value::Set(members)) => Ok(members.clone()),
            Some(other) => Err(wrong_type(key, "set", other)),
        }
    }

    fn string_set_with_expiry(&self, key: &str, ttl_secs: u64, value: &[u8]) -> StoreResult<()> {
        let expires_at = Some(ttl_secs)
            .filter(|ttl| *ttl > 0)
            .and_then(|ttl| Instant::now().checked_add(Duration::from_secs(ttl)))
            .ok_or_else(|| StoreError::UnexpectedValue {
                key: key.to_string(),
                message: "invalid expire time".to_string(),
            })?;
        let mut entries = self.lock()?;
        entries.insert(
            key.to_string(),
            Value::Str {
                data: value.to_vec(),
                expires_at: Some(expires_at),
            },
        );
        Ok(())
    }

    fn string_get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let mut entries = self.lock()?;
        purge_if_expired(&mut entries, key);
        match entries.get(key) {
            None => Ok(None),
            Some(Value::Str { data, .. }) => Ok(Some(data.clone())),
            Some(other) => Err(wrong_type(key, "string", other)),
        }
    }

    fn list_push_tail(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut entries = self.lock()?;
        purge_if_expired(&mut entries, key);
        match entries
            .entry(key.to_string())
            .or_insert_with(|| Value::List(VecDeque::new()))
        {
            Value::List(list) => list.push_back(value.to_string()),
            other => return Err(wrong_type(key, "list", other)),
        }
        drop(entries);
        self.list_pushed.notify_all();
        Ok(())
    }

    fn list_pop_head(&self, key: &str) -> StoreResult<Option<String>> {
        let mut entries = self.lock()?;
        pop_front(&mut entries, key)
    }

    fn list_pop_head_blocking(
        &self,
        key: &str,
        timeout: Duration,
    ) -> StoreResult<Option<String>> {
        let deadline = if timeout.is_zero() {
            None
        } else {
            Some(Instant::now() + timeout)
        };

        let mut entries = self.lock()?;
        loop {
            if let Some(value) = pop_front(&mut entries, key)? {
                return Ok(Some(value));
            }

            entries = match deadline {
                None => self
                    .list_pushed
                    .wait(entries)
                    .map_err(|e| StoreError::LockPoisoned {
                        message: e.to_string(),
                    })?,
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Ok(None);
                    }
                    let (guard, _) = self
                        .list_pushed
                        .wait_timeout(entries, remaining)
                        .map_err(|e| StoreError::LockPoisoned {
                            message: e.to_string(),
                        })?;
                    guard
                }
            };
        }
    }

    fn list_len(&self, key: &str) -> StoreResult<usize> {
        let mut entries = self.lock()?;
        purge_if_expired(&mut entries, key);
        match entries.get(key) {
            None => Ok(0),
            Some(Value::List(list)) => Ok(list.len()),
            Some(other) => Err(wrong_type(key, "list", other)),
        }
    }

    fn delete(&self, key: &str) -> StoreResult<()> {
        let mut entries = self.lock()?;
        entries.remove(key);
        Ok(())
    }

    fn keys_matching(&self, pattern: &str) -> StoreResult<Vec<String>> {
        let matcher = glob::Pattern::new(pattern).map_err(|e| StoreError::UnexpectedValue {
            key: pattern.to_string(),
            message: format!("invalid key pattern: {}", e),
        })?;
        let now = Instant::now();
        let entries = self.lock()?;
        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(key, value)| !value.is_expired(now) && matcher.matches(key))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}
