use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use taki_core::errors::Error;
use taki_core::types;

use crate::script::ClaimScript;
use crate::{KvStore, WriteOp};

enum Value {
    Hash(HashMap<String, Vec<u8>>),
    ZSet(HashMap<String, f64>),
    Set(HashSet<String>),
}

/// In-process KV backend with the same contract as [`crate::RedisKv`],
/// including the claim-script semantics. Per-key mutations go through the map
/// entry API, which is exclusive for the key, so the scripts stay atomic.
/// Used by tests and single-node setups.
#[derive(Default)]
pub struct MemoryKv {
    store: DashMap<String, Value>,
    expiry_map: DashMap<String, DateTime<Utc>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    fn purge_if_expired(&self, key: &str) {
        let expired = match self.expiry_map.get(key) {
            Some(deadline) => *deadline <= Utc::now(),
            None => false,
        };

        if expired {
            self.store.remove(key);
            self.expiry_map.remove(key);
        }
    }

    fn sorted_members(entries: &HashMap<String, f64>) -> Vec<String> {
        let mut members: Vec<(String, f64)> =
            entries.iter().map(|(m, s)| (m.clone(), *s)).collect();
        members.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        members.into_iter().map(|(m, _)| m).collect()
    }

    fn wrong_kind(key: &str) -> Error {
        Error::internal(format!("wrong value kind for key '{}'", key))
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn hset(&self, key: &str, fields: &[(String, Vec<u8>)]) -> types::Result<usize> {
        self.purge_if_expired(key);

        let mut entry = self
            .store
            .entry(key.to_string())
            .or_insert_with(|| Value::Hash(HashMap::new()));

        match entry.value_mut() {
            Value::Hash(hash) => {
                let mut created = 0;
                for (field, value) in fields {
                    if hash.insert(field.clone(), value.clone()).is_none() {
                        created += 1;
                    }
                }
                Ok(created)
            }
            _ => Err(Self::wrong_kind(key)),
        }
    }

    async fn hset_nx(&self, key: &str, fields: &[(String, Vec<u8>)]) -> types::Result<usize> {
        self.purge_if_expired(key);

        let mut entry = self
            .store
            .entry(key.to_string())
            .or_insert_with(|| Value::Hash(HashMap::new()));

        match entry.value_mut() {
            Value::Hash(hash) => {
                let mut created = 0;
                for (field, value) in fields {
                    if !hash.contains_key(field) {
                        hash.insert(field.clone(), value.clone());
                        created += 1;
                    }
                }
                Ok(created)
            }
            _ => Err(Self::wrong_kind(key)),
        }
    }

    async fn hget_all(&self, key: &str) -> types::Result<HashMap<String, Vec<u8>>> {
        self.purge_if_expired(key);

        match self.store.get(key) {
            Some(value) => match value.value() {
                Value::Hash(hash) => Ok(hash.clone()),
                _ => Err(Self::wrong_kind(key)),
            },
            None => Ok(HashMap::new()),
        }
    }

    async fn hmget(&self, key: &str, fields: &[&str]) -> types::Result<Vec<Option<Vec<u8>>>> {
        self.purge_if_expired(key);

        match self.store.get(key) {
            Some(value) => match value.value() {
                Value::Hash(hash) => Ok(fields.iter().map(|f| hash.get(*f).cloned()).collect()),
                _ => Err(Self::wrong_kind(key)),
            },
            None => Ok(fields.iter().map(|_| None).collect()),
        }
    }

    async fn hincr_by(&self, key: &str, field: &str, delta: i64) -> types::Result<i64> {
        self.purge_if_expired(key);

        let mut entry = self
            .store
            .entry(key.to_string())
            .or_insert_with(|| Value::Hash(HashMap::new()));

        match entry.value_mut() {
            Value::Hash(hash) => {
                let current = match hash.get(field) {
                    Some(raw) => String::from_utf8_lossy(raw)
                        .parse::<i64>()
                        .map_err(|e| Error::Unknown { source: e.into() })?,
                    None => 0,
                };
                let next = current + delta;
                hash.insert(field.to_string(), next.to_string().into_bytes());
                Ok(next)
            }
            _ => Err(Self::wrong_kind(key)),
        }
    }

    async fn hdel(&self, key: &str, field: &str) -> types::Result<()> {
        self.purge_if_expired(key);

        if let Some(mut entry) = self.store.get_mut(key) {
            match entry.value_mut() {
                Value::Hash(hash) => {
                    hash.remove(field);
                }
                _ => return Err(Self::wrong_kind(key)),
            }
        }

        Ok(())
    }

    async fn del(&self, key: &str) -> types::Result<()> {
        self.store.remove(key);
        self.expiry_map.remove(key);

        Ok(())
    }

    async fn expire(&self, key: &str, ttl: Duration) -> types::Result<bool> {
        self.purge_if_expired(key);

        if !self.store.contains_key(key) {
            return Ok(false);
        }

        self.expiry_map.insert(
            key.to_string(),
            Utc::now() + chrono::Duration::seconds(ttl.as_secs() as i64),
        );

        Ok(true)
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> types::Result<()> {
        self.purge_if_expired(key);

        let mut entry = self
            .store
            .entry(key.to_string())
            .or_insert_with(|| Value::ZSet(HashMap::new()));

        match entry.value_mut() {
            Value::ZSet(entries) => {
                entries.insert(member.to_string(), score);
                Ok(())
            }
            _ => Err(Self::wrong_kind(key)),
        }
    }

    async fn zrange_all(&self, key: &str) -> types::Result<Vec<String>> {
        self.purge_if_expired(key);

        match self.store.get(key) {
            Some(value) => match value.value() {
                Value::ZSet(entries) => Ok(Self::sorted_members(entries)),
                _ => Err(Self::wrong_kind(key)),
            },
            None => Ok(vec![]),
        }
    }

    async fn zrem(&self, key: &str, member: &str) -> types::Result<()> {
        self.purge_if_expired(key);

        if let Some(mut entry) = self.store.get_mut(key) {
            match entry.value_mut() {
                Value::ZSet(entries) => {
                    entries.remove(member);
                }
                _ => return Err(Self::wrong_kind(key)),
            }
        }

        Ok(())
    }

    async fn zcard(&self, key: &str) -> types::Result<i64> {
        self.purge_if_expired(key);

        match self.store.get(key) {
            Some(value) => match value.value() {
                Value::ZSet(entries) => Ok(entries.len() as i64),
                _ => Err(Self::wrong_kind(key)),
            },
            None => Ok(0),
        }
    }

    async fn zrem_range_by_rank(&self, key: &str, start: i64, stop: i64) -> types::Result<()> {
        self.purge_if_expired(key);

        if let Some(mut entry) = self.store.get_mut(key) {
            match entry.value_mut() {
                Value::ZSet(entries) => {
                    let members = Self::sorted_members(entries);
                    let len = members.len() as i64;
                    let resolve = |idx: i64| if idx < 0 { len + idx } else { idx };
                    let start = resolve(start).max(0);
                    let stop = resolve(stop).min(len - 1);

                    for rank in start..=stop {
                        if let Some(member) = members.get(rank as usize) {
                            entries.remove(member);
                        }
                    }
                }
                _ => return Err(Self::wrong_kind(key)),
            }
        }

        Ok(())
    }

    async fn sadd(&self, key: &str, member: &str) -> types::Result<()> {
        self.purge_if_expired(key);

        let mut entry = self
            .store
            .entry(key.to_string())
            .or_insert_with(|| Value::Set(HashSet::new()));

        match entry.value_mut() {
            Value::Set(members) => {
                members.insert(member.to_string());
                Ok(())
            }
            _ => Err(Self::wrong_kind(key)),
        }
    }

    async fn smembers(&self, key: &str) -> types::Result<Vec<String>> {
        self.purge_if_expired(key);

        match self.store.get(key) {
            Some(value) => match value.value() {
                Value::Set(members) => Ok(members.iter().cloned().collect()),
                _ => Err(Self::wrong_kind(key)),
            },
            None => Ok(vec![]),
        }
    }

    async fn txn(&self, ops: Vec<WriteOp>) -> types::Result<()> {
        for op in ops {
            match op {
                WriteOp::HashSet { key, field, value } => {
                    self.hset(&key, &[(field, value)]).await?;
                }
                WriteOp::SetAdd { key, member } => {
                    self.sadd(&key, &member).await?;
                }
            }
        }

        Ok(())
    }

    async fn eval_claim(&self, script: ClaimScript, key: &str) -> types::Result<i64> {
        self.purge_if_expired(key);

        match script {
            ClaimScript::Acquire => {
                let Some(mut entry) = self.store.get_mut(key) else {
                    return Ok(0);
                };
                match entry.value_mut() {
                    Value::Hash(hash) => {
                        if hash.contains_key("claimed") {
                            Ok(0)
                        } else {
                            hash.insert("claimed".to_string(), b"1".to_vec());
                            Ok(1)
                        }
                    }
                    _ => Err(Self::wrong_kind(key)),
                }
            }
            ClaimScript::Release => {
                let Some(mut entry) = self.store.get_mut(key) else {
                    return Ok(0);
                };
                match entry.value_mut() {
                    Value::Hash(hash) => {
                        if hash.get("claimed").map(|v| v.as_slice()) == Some(b"1".as_slice()) {
                            hash.remove("claimed");
                            Ok(1)
                        } else {
                            Ok(0)
                        }
                    }
                    _ => Err(Self::wrong_kind(key)),
                }
            }
            ClaimScript::DeleteClaimed => {
                let removed = self.store.remove_if(key, |_, value| {
                    matches!(
                        value,
                        Value::Hash(hash)
                            if hash.get("claimed").map(|v| v.as_slice()) == Some(b"1".as_slice())
                    )
                });

                if removed.is_some() {
                    self.expiry_map.remove(key);
                    Ok(1)
                } else {
                    Ok(0)
                }
            }
        }
    }
}
