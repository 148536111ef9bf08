use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use taki_core::types;

pub mod memory;
pub mod redis;
pub mod script;

pub use crate::memory::MemoryKv;
pub use crate::redis::RedisKv;
pub use crate::script::ClaimScript;

/// A single write in a [`KvStore::txn`] batch.
#[derive(Clone, Debug)]
pub enum WriteOp {
    HashSet {
        key: String,
        field: String,
        value: Vec<u8>,
    },
    SetAdd {
        key: String,
        member: String,
    },
}

/// The slice of the shared key-value store the scheduler relies on: hashes,
/// sorted sets, plain sets, key expiry, small atomic write batches, and the
/// server-side claim scripts.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Sets hash fields, returning the number of fields newly created.
    async fn hset(&self, key: &str, fields: &[(String, Vec<u8>)]) -> types::Result<usize>;

    /// Sets only the hash fields that do not exist yet, returning the number
    /// of fields created. Existing fields keep their values.
    async fn hset_nx(&self, key: &str, fields: &[(String, Vec<u8>)]) -> types::Result<usize>;

    /// Reads all fields of a hash. A missing key reads as an empty hash.
    async fn hget_all(&self, key: &str) -> types::Result<HashMap<String, Vec<u8>>>;

    /// Reads the named fields of a hash. Missing fields read as `None`.
    async fn hmget(&self, key: &str, fields: &[&str]) -> types::Result<Vec<Option<Vec<u8>>>>;

    /// Increments an integer hash field, returning the new value. A missing
    /// field counts from zero.
    async fn hincr_by(&self, key: &str, field: &str, delta: i64) -> types::Result<i64>;

    async fn hdel(&self, key: &str, field: &str) -> types::Result<()>;

    async fn del(&self, key: &str) -> types::Result<()>;

    /// Applies a TTL to a key. Returns false if the key does not exist.
    async fn expire(&self, key: &str, ttl: Duration) -> types::Result<bool>;

    async fn zadd(&self, key: &str, member: &str, score: f64) -> types::Result<()>;

    /// Returns all members of a sorted set, lowest score first.
    async fn zrange_all(&self, key: &str) -> types::Result<Vec<String>>;

    async fn zrem(&self, key: &str, member: &str) -> types::Result<()>;

    async fn zcard(&self, key: &str) -> types::Result<i64>;

    /// Removes members by rank range, both bounds inclusive. Negative indexes
    /// count from the highest rank.
    async fn zrem_range_by_rank(&self, key: &str, start: i64, stop: i64) -> types::Result<()>;

    async fn sadd(&self, key: &str, member: &str) -> types::Result<()>;

    async fn smembers(&self, key: &str) -> types::Result<Vec<String>>;

    /// Applies all writes as one atomic batch.
    async fn txn(&self, ops: Vec<WriteOp>) -> types::Result<()>;

    /// Runs one of the claim scripts against `key`, returning the raw script
    /// result.
    async fn eval_claim(&self, script: ClaimScript, key: &str) -> types::Result<i64>;
}

pub type SharedKv = Arc<dyn KvStore>;
