use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::Script;
use taki_core::errors::Error;
use taki_core::types;

use crate::script::ClaimScript;
use crate::{KvStore, WriteOp};

fn kv_err(e: redis::RedisError) -> Error {
    Error::Unknown { source: e.into() }
}

/// KV backend over a shared Redis instance. The connection manager reconnects
/// transparently, so a clone of it is all each call needs.
#[derive(Clone)]
pub struct RedisKv {
    conn: ConnectionManager,
    acquire_claim: Script,
    release_claim: Script,
    delete_claimed: Script,
}

impl RedisKv {
    pub async fn connect(url: &str) -> types::Result<Self> {
        let client = redis::Client::open(url).map_err(kv_err)?;
        let conn = ConnectionManager::new(client).await.map_err(kv_err)?;

        Ok(Self {
            conn,
            acquire_claim: Script::new(ClaimScript::Acquire.source()),
            release_claim: Script::new(ClaimScript::Release.source()),
            delete_claimed: Script::new(ClaimScript::DeleteClaimed.source()),
        })
    }
}

#[async_trait]
impl KvStore for RedisKv {
    async fn hset(&self, key: &str, fields: &[(String, Vec<u8>)]) -> types::Result<usize> {
        let mut conn = self.conn.clone();
        let mut cmd = redis::cmd("HSET");
        cmd.arg(key);
        for (field, value) in fields {
            cmd.arg(field).arg(value.as_slice());
        }

        cmd.query_async(&mut conn).await.map_err(kv_err)
    }

    async fn hset_nx(&self, key: &str, fields: &[(String, Vec<u8>)]) -> types::Result<usize> {
        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        pipe.atomic();
        for (field, value) in fields {
            pipe.cmd("HSETNX").arg(key).arg(field).arg(value.as_slice());
        }

        let created: Vec<i64> = pipe.query_async(&mut conn).await.map_err(kv_err)?;

        Ok(created.into_iter().filter(|c| *c == 1).count())
    }

    async fn hget_all(&self, key: &str) -> types::Result<HashMap<String, Vec<u8>>> {
        let mut conn = self.conn.clone();

        redis::cmd("HGETALL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(kv_err)
    }

    async fn hmget(&self, key: &str, fields: &[&str]) -> types::Result<Vec<Option<Vec<u8>>>> {
        let mut conn = self.conn.clone();

        redis::cmd("HMGET")
            .arg(key)
            .arg(fields)
            .query_async(&mut conn)
            .await
            .map_err(kv_err)
    }

    async fn hincr_by(&self, key: &str, field: &str, delta: i64) -> types::Result<i64> {
        let mut conn = self.conn.clone();

        redis::cmd("HINCRBY")
            .arg(key)
            .arg(field)
            .arg(delta)
            .query_async(&mut conn)
            .await
            .map_err(kv_err)
    }

    async fn hdel(&self, key: &str, field: &str) -> types::Result<()> {
        let mut conn = self.conn.clone();

        redis::cmd("HDEL")
            .arg(key)
            .arg(field)
            .query_async(&mut conn)
            .await
            .map_err(kv_err)
    }

    async fn del(&self, key: &str) -> types::Result<()> {
        let mut conn = self.conn.clone();

        redis::cmd("DEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(kv_err)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> types::Result<bool> {
        let mut conn = self.conn.clone();

        redis::cmd("EXPIRE")
            .arg(key)
            .arg(ttl.as_secs() as i64)
            .query_async(&mut conn)
            .await
            .map_err(kv_err)
    }

    async fn zadd(&self, key: &str, member: &str, score: f64) -> types::Result<()> {
        let mut conn = self.conn.clone();

        redis::cmd("ZADD")
            .arg(key)
            .arg(score)
            .arg(member)
            .query_async(&mut conn)
            .await
            .map_err(kv_err)
    }

    async fn zrange_all(&self, key: &str) -> types::Result<Vec<String>> {
        let mut conn = self.conn.clone();

        redis::cmd("ZRANGE")
            .arg(key)
            .arg(0)
            .arg(-1)
            .query_async(&mut conn)
            .await
            .map_err(kv_err)
    }

    async fn zrem(&self, key: &str, member: &str) -> types::Result<()> {
        let mut conn = self.conn.clone();

        redis::cmd("ZREM")
            .arg(key)
            .arg(member)
            .query_async(&mut conn)
            .await
            .map_err(kv_err)
    }

    async fn zcard(&self, key: &str) -> types::Result<i64> {
        let mut conn = self.conn.clone();

        redis::cmd("ZCARD")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(kv_err)
    }

    async fn zrem_range_by_rank(&self, key: &str, start: i64, stop: i64) -> types::Result<()> {
        let mut conn = self.conn.clone();

        redis::cmd("ZREMRANGEBYRANK")
            .arg(key)
            .arg(start)
            .arg(stop)
            .query_async(&mut conn)
            .await
            .map_err(kv_err)
    }

    async fn sadd(&self, key: &str, member: &str) -> types::Result<()> {
        let mut conn = self.conn.clone();

        redis::cmd("SADD")
            .arg(key)
            .arg(member)
            .query_async(&mut conn)
            .await
            .map_err(kv_err)
    }

    async fn smembers(&self, key: &str) -> types::Result<Vec<String>> {
        let mut conn = self.conn.clone();

        redis::cmd("SMEMBERS")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(kv_err)
    }

    async fn txn(&self, ops: Vec<WriteOp>) -> types::Result<()> {
        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        pipe.atomic();

        for op in &ops {
            match op {
                WriteOp::HashSet { key, field, value } => {
                    pipe.cmd("HSET")
                        .arg(key)
                        .arg(field)
                        .arg(value.as_slice())
                        .ignore();
                }
                WriteOp::SetAdd { key, member } => {
                    pipe.cmd("SADD").arg(key).arg(member).ignore();
                }
            }
        }

        pipe.query_async(&mut conn).await.map_err(kv_err)
    }

    async fn eval_claim(&self, script: ClaimScript, key: &str) -> types::Result<i64> {
        let mut conn = self.conn.clone();
        let script = match script {
            ClaimScript::Acquire => &self.acquire_claim,
            ClaimScript::Release => &self.release_claim,
            ClaimScript::DeleteClaimed => &self.delete_claimed,
        };

        script
            .key(key)
            .invoke_async(&mut conn)
            .await
            .map_err(kv_err)
    }
}
