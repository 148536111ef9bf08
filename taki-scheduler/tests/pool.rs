mod setup;

use taki_rpc::proto::scheduler::{RegisteredExecutionNode, TaskSize};
use taki_scheduler::pool::{ExecutionNode, NodePool};

use setup::{execution_node, linux_pool_key, shared_kv};

async fn seed_pool_executor(
    kv: &taki_kv::SharedKv,
    executor_id: &str,
    memory_bytes: i64,
    milli_cpu: i64,
) {
    let registered = RegisteredExecutionNode {
        registration: Some(execution_node(executor_id, memory_bytes, milli_cpu)),
        scheduler_host_port: "10.0.0.9:1985".to_string(),
        group_id: String::new(),
        acl: None,
    };
    kv.hset(
        &linux_pool_key().pool_hash_key(),
        &[(executor_id.to_string(), registered.encode_bytes())],
    )
    .await
    .expect("seed pool hash");
}

fn size(memory_bytes: i64, milli_cpu: i64) -> TaskSize {
    TaskSize {
        estimated_memory_bytes: memory_bytes,
        estimated_milli_cpu: milli_cpu,
    }
}

fn connected_node(executor_id: &str) -> ExecutionNode {
    ExecutionNode {
        executor_id: executor_id.to_string(),
        assignable_memory_bytes: 1024,
        assignable_milli_cpu: 1000,
        scheduler_host_port: None,
        handle: None,
    }
}

#[tokio::test]
async fn fit_count_counts_executors_under_capacity_ratio() -> anyhow::Result<()> {
    let kv = shared_kv();
    seed_pool_executor(&kv, "small", 1000, 1000).await;
    seed_pool_executor(&kv, "large", 4000, 4000).await;

    let pool = NodePool::new(kv, linux_pool_key());

    assert_eq!(pool.fit_count(&size(1000, 1000), 1.0).await?, 2);
    assert_eq!(pool.fit_count(&size(2000, 2000), 1.0).await?, 1);

    // An over-subscription ratio of 2 doubles every executor's capacity.
    assert_eq!(pool.fit_count(&size(2000, 2000), 2.0).await?, 2);

    let err = pool
        .fit_count(&size(100_000, 100_000), 1.0)
        .await
        .expect_err("nothing fits");
    assert!(err.is_unavailable(), "unexpected error: {}", err);

    Ok(())
}

#[tokio::test]
async fn fit_count_fails_on_empty_pool() {
    let kv = shared_kv();
    let pool = NodePool::new(kv, linux_pool_key());

    let err = pool
        .fit_count(&size(1, 1), 1.0)
        .await
        .expect_err("empty pool");
    assert!(err.is_unavailable());
}

#[tokio::test]
async fn refresh_serves_fresh_cache_without_refetching() -> anyhow::Result<()> {
    let kv = shared_kv();
    seed_pool_executor(&kv, "executor-1", 1000, 1000).await;

    let pool = NodePool::new(kv.clone(), linux_pool_key());
    assert_eq!(pool.fit_count(&size(1, 1), 1.0).await?, 1);

    // The pool hash is wiped, but the cached list is fresh and non-empty so
    // the next call still sees the old view.
    kv.del(&linux_pool_key().pool_hash_key()).await?;
    assert_eq!(pool.fit_count(&size(1, 1), 1.0).await?, 1);

    Ok(())
}

#[tokio::test]
async fn refresh_refetches_when_cache_is_empty() -> anyhow::Result<()> {
    let kv = shared_kv();
    let pool = NodePool::new(kv.clone(), linux_pool_key());

    assert!(pool.fit_count(&size(1, 1), 1.0).await.is_err());

    // A registration landing after the failed fetch is visible immediately
    // because an empty cache bypasses the staleness window.
    seed_pool_executor(&kv, "executor-1", 1000, 1000).await;
    assert_eq!(pool.fit_count(&size(1, 1), 1.0).await?, 1);

    Ok(())
}

#[tokio::test]
async fn connected_executor_list_is_idempotent_by_id() {
    let kv = shared_kv();
    let pool = NodePool::new(kv, linux_pool_key());

    assert!(pool.add_connected_executor(connected_node("executor-1")).await);
    assert!(!pool.add_connected_executor(connected_node("executor-1")).await);
    assert!(pool.add_connected_executor(connected_node("executor-2")).await);

    assert!(pool.find_connected_executor("executor-1").await.is_some());
    assert!(pool.find_connected_executor("").await.is_none());
    assert!(pool.find_connected_executor("missing").await.is_none());

    assert!(pool.remove_connected_executor("executor-1").await);
    assert!(!pool.remove_connected_executor("executor-1").await);
    assert!(pool.find_connected_executor("executor-1").await.is_none());
}

#[tokio::test]
async fn unclaimed_task_set_is_bounded() -> anyhow::Result<()> {
    let kv = shared_kv();
    let pool = NodePool::new(kv.clone(), linux_pool_key());

    for i in 0..10_050 {
        pool.add_unclaimed_task(&format!("task-{}", i)).await?;
    }

    let n = kv.zcard(&linux_pool_key().unclaimed_tasks_key()).await?;
    assert!(n <= 10_000, "unclaimed set grew to {}", n);

    Ok(())
}

#[tokio::test]
async fn sample_unclaimed_draws_from_the_set() -> anyhow::Result<()> {
    let kv = shared_kv();
    let pool = NodePool::new(kv, linux_pool_key());

    for i in 0..5 {
        pool.add_unclaimed_task(&format!("task-{}", i)).await?;
    }

    let sample = pool.sample_unclaimed_tasks(3).await?;
    assert_eq!(sample.len(), 3);
    for task_id in &sample {
        assert!(task_id.starts_with("task-"));
    }

    // Requesting more than the set holds returns everything.
    let sample = pool.sample_unclaimed_tasks(10).await?;
    assert_eq!(sample.len(), 5);

    pool.remove_unclaimed_task("task-0").await?;
    let sample = pool.sample_unclaimed_tasks(10).await?;
    assert_eq!(sample.len(), 4);
    assert!(!sample.contains(&"task-0".to_string()));

    Ok(())
}
