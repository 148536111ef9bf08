use async_trait::async_trait;
use rand::seq::SliceRandom;
use taki_rpc::proto::scheduler::Command;

use crate::pool::ExecutionNode;

/// Ranks candidate executors for a task. The dispatcher treats the result as
/// a preference order only: it still cycles through the whole returned list,
/// so implementations must not drop entries.
#[async_trait]
pub trait TaskRouter: Send + Sync {
    async fn rank_nodes(
        &self,
        command: Option<&Command>,
        remote_instance_name: &str,
        nodes: Vec<ExecutionNode>,
    ) -> Vec<ExecutionNode>;
}

/// Router with no affinity policy. A uniform shuffle keeps probes spread
/// across the pool.
pub struct ShuffleRouter;

#[async_trait]
impl TaskRouter for ShuffleRouter {
    async fn rank_nodes(
        &self,
        _command: Option<&Command>,
        _remote_instance_name: &str,
        mut nodes: Vec<ExecutionNode>,
    ) -> Vec<ExecutionNode> {
        nodes.shuffle(&mut rand::thread_rng());
        nodes
    }
}
