use anyhow::anyhow;
use prost::Message;
use taki_core::errors::Error;

use crate::proto;

/// Maps a scheduler error onto the matching gRPC status code.
pub fn error_to_status(value: Error) -> tonic::Status {
    let message = value.to_string();

    match value {
        Error::InvalidArgument { .. } => tonic::Status::invalid_argument(message),
        Error::FailedPrecondition { .. } => tonic::Status::failed_precondition(message),
        Error::AlreadyExists { .. } => tonic::Status::already_exists(message),
        Error::NotFound { .. } => tonic::Status::not_found(message),
        Error::Unavailable { .. } => tonic::Status::unavailable(message),
        Error::ResourceExhausted { .. } => tonic::Status::resource_exhausted(message),
        Error::PermissionDenied { .. } => tonic::Status::permission_denied(message),
        Error::Unauthenticated { .. } => tonic::Status::unauthenticated(message),
        Error::Canceled { .. } => tonic::Status::cancelled(message),
        Error::DataLoss { .. } => tonic::Status::data_loss(message),
        Error::Internal { .. } => tonic::Status::internal(message),
        Error::Unknown { .. } => tonic::Status::unknown(message),
    }
}

impl proto::scheduler::RegisteredExecutionNode {
    pub fn encode_bytes(&self) -> Vec<u8> {
        self.encode_to_vec()
    }

    pub fn decode_bytes(data: &[u8]) -> anyhow::Result<Self> {
        Self::decode(data).map_err(|e| anyhow!("could not decode registered execution node: {}", e))
    }
}

impl proto::scheduler::Acl {
    /// Whether `group_id` may list this entry.
    pub fn authorize_read(&self, group_id: &str) -> bool {
        self.others_read
            || (!self.group_id.is_empty() && self.group_id == group_id && self.group_read)
    }
}

/// Deserializes a task payload and returns the properties needed to route it:
/// the command and the remote instance name. A missing payload routes with
/// empty properties.
pub fn extract_routing_props(
    serialized_task: Option<&[u8]>,
) -> taki_core::types::Result<(Option<proto::scheduler::Command>, String)> {
    let Some(serialized_task) = serialized_task else {
        return Ok((None, String::new()));
    };

    let task = proto::scheduler::ExecutionTask::decode(serialized_task)
        .map_err(|e| Error::internal(format!("failed to decode execution task: {}", e)))?;

    Ok((task.command, task.instance_name))
}
