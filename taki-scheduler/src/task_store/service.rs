use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use prost::Message;
use taki_core::errors::Error;
use taki_core::types;
use taki_kv::{ClaimScript, SharedKv};
use taki_rpc::proto::scheduler::SchedulingMetadata;

use crate::constant::{self, KeyPrefix};
use crate::task_store::repository::{PersistedTask, Repository};

const TASK_PROTO_FIELD: &str = "taskProto";
const TASK_METADATA_FIELD: &str = "schedulingMetadataProto";
const TASK_QUEUED_AT_USEC_FIELD: &str = "queuedAtUsec";
const TASK_ATTEMPT_COUNT_FIELD: &str = "attemptCount";

fn key_for_task(task_id: &str) -> String {
    format!("{}/{}", KeyPrefix::Task, task_id)
}

pub struct Service {
    kv: SharedKv,
}

impl Service {
    pub fn new(kv: SharedKv) -> super::Repository {
        std::sync::Arc::new(Box::new(Self { kv }))
    }

    fn parse_i64(raw: &[u8], what: &str) -> types::Result<i64> {
        let text = std::str::from_utf8(raw)
            .map_err(|e| Error::invalid_argument(format!("unexpected bytes for {}: {}", what, e)))?;
        text.parse::<i64>()
            .map_err(|e| Error::invalid_argument(format!("could not parse {} '{}': {}", what, text, e)))
    }
}

#[async_trait]
impl Repository for Service {
    async fn insert(
        &self,
        task_id: &str,
        metadata: &SchedulingMetadata,
        serialized_task: &[u8],
    ) -> types::Result<()> {
        let key = key_for_task(task_id);
        let fields = vec![
            (TASK_PROTO_FIELD.to_string(), serialized_task.to_vec()),
            (TASK_METADATA_FIELD.to_string(), metadata.encode_to_vec()),
            (
                TASK_QUEUED_AT_USEC_FIELD.to_string(),
                Utc::now().timestamp_micros().to_string().into_bytes(),
            ),
            (TASK_ATTEMPT_COUNT_FIELD.to_string(), b"0".to_vec()),
        ];

        // Set-if-absent keeps a pre-existing row untouched; zero created
        // fields means the row was already there.
        let created = self.kv.hset_nx(&key, &fields).await?;
        if created == 0 {
            return Err(Error::already_exists(format!(
                "task {} already exists",
                task_id
            )));
        }

        let applied = self.kv.expire(&key, constant::TASK_TTL).await?;
        if !applied {
            return Err(Error::data_loss(format!(
                "task {} disappeared before we could set TTL",
                task_id
            )));
        }

        Ok(())
    }

    async fn read(&self, task_id: &str) -> types::Result<PersistedTask> {
        let fields = [
            TASK_PROTO_FIELD,
            TASK_METADATA_FIELD,
            TASK_QUEUED_AT_USEC_FIELD,
            TASK_ATTEMPT_COUNT_FIELD,
        ];
        let vals = self.kv.hmget(&key_for_task(task_id), &fields).await?;
        if vals.len() != fields.len() {
            return Err(Error::failed_precondition(format!(
                "unexpected number of returned values in KV response: {}",
                vals.len()
            )));
        }

        let Some(serialized_task) = vals[0].clone() else {
            return Err(Error::not_found(format!("task '{}' not found", task_id)));
        };

        let metadata_raw = vals[1]
            .as_ref()
            .ok_or_else(|| Error::invalid_argument("missing scheduling metadata field"))?;
        let metadata = SchedulingMetadata::decode(metadata_raw.as_slice())
            .map_err(|e| Error::internal(format!("could not decode scheduling metadata: {}", e)))?;

        let queued_at_raw = vals[2]
            .as_ref()
            .ok_or_else(|| Error::invalid_argument("missing queued at timestamp field"))?;
        let queued_at_usec = Self::parse_i64(queued_at_raw, "queued at timestamp")?;
        let queued_timestamp = Utc
            .timestamp_micros(queued_at_usec)
            .single()
            .ok_or_else(|| {
                Error::invalid_argument(format!(
                    "queued at timestamp {} is out of range",
                    queued_at_usec
                ))
            })?;

        let attempt_count_raw = vals[3]
            .as_ref()
            .ok_or_else(|| Error::invalid_argument("missing attempt count field"))?;
        let attempt_count = Self::parse_i64(attempt_count_raw, "attempt count")?;

        Ok(PersistedTask {
            task_id: task_id.to_string(),
            metadata,
            serialized_task,
            queued_timestamp,
            attempt_count,
        })
    }

    async fn read_many(&self, task_ids: &[String]) -> types::Result<Vec<PersistedTask>> {
        let mut tasks = vec![];

        for task_id in task_ids {
            match self.read(task_id).await {
                Ok(task) => tasks.push(task),
                Err(e) => {
                    // Unclaimed-set entries may point at tasks that are gone.
                    if !e.is_not_found() {
                        tracing::error!("error reading task from KV store: {}", e);
                    }
                }
            }
        }

        Ok(tasks)
    }

    async fn claim(&self, task_id: &str) -> types::Result<()> {
        let key = key_for_task(task_id);
        let result = self.kv.eval_claim(ClaimScript::Acquire, &key).await?;
        if result != 1 {
            // Someone else claimed the task.
            return Err(Error::not_found(format!(
                "unable to claim task: '{}'",
                task_id
            )));
        }

        self.kv.hincr_by(&key, TASK_ATTEMPT_COUNT_FIELD, 1).await?;

        Ok(())
    }

    async fn unclaim(&self, task_id: &str) -> types::Result<()> {
        let result = self
            .kv
            .eval_claim(ClaimScript::Release, &key_for_task(task_id))
            .await?;
        if result != 1 {
            return Err(Error::not_found(format!(
                "unable to release task claim for task '{}'",
                task_id
            )));
        }

        Ok(())
    }

    async fn delete_claimed(&self, task_id: &str) -> types::Result<()> {
        let result = self
            .kv
            .eval_claim(ClaimScript::DeleteClaimed, &key_for_task(task_id))
            .await?;
        if result != 1 {
            return Err(Error::not_found(format!(
                "unable to delete claimed task '{}'",
                task_id
            )));
        }

        Ok(())
    }
}
