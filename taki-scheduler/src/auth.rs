use async_trait::async_trait;
use taki_core::types;
use tonic::metadata::MetadataMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    RegisterExecutor,
}

#[derive(Clone, Debug, Default)]
pub struct AuthenticatedUser {
    pub group_id: String,
    pub capabilities: Vec<Capability>,
    pub use_group_owned_executors: bool,
}

impl AuthenticatedUser {
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// Credential-checking oracle. Implementations resolve request metadata to an
/// authenticated user and their capabilities. The scheduler calls this once
/// when a stream opens and again on every revalidation tick, so credentials
/// revoked mid-stream are picked up.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, metadata: &MetadataMap) -> types::Result<AuthenticatedUser>;
}
