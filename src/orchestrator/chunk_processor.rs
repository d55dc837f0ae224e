//! 单批处理器 - 编排层
//!
//! ## 职责
//!
//! 把一个批次的模型分发给固定数量的工作线程并等待全部结束。
//!
//! ## 核心功能
//!
//! 1. **工作池**：每批启动 `min(worker_count, 批大小)` 个阻塞线程，从共享队列领取模型
//! 2. **执行上下文**：每个线程只建立一次自己的 `ExecutionContext`，互不共享
//! 3. **失败策略**：`FailFast` 下任一失败后其余线程不再领取新模型
//! 4. **屏障**：所有线程结束后才返回，本层不写任何文件

use crate::config::{FailurePolicy, SolverSettings};
use crate::error::{AppResult, ProcessingError};
use crate::infrastructure::ExecutionContext;
use crate::models::{InputItem, ItemOutcome};
use crate::workflow::{ItemCtx, ItemFlow};
use futures::future::join_all;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

type WorkQueue = Mutex<VecDeque<(usize, InputItem)>>;

/// 一个批次的调度参数
#[derive(Debug, Clone)]
pub struct ChunkJob {
    /// 批次编号（从1开始）
    pub chunk_index: usize,
    /// 本批第一个模型的全局序号（从1开始）
    pub first_item_index: usize,
    pub items: Vec<InputItem>,
}

/// 并行处理一个批次
///
/// # 返回
/// 每个已领取模型的结局；`FailFast` 下中止后未领取的模型不会出现在结果中。
/// 工作线程 panic 时返回错误。
pub async fn process_chunk(
    flow: &ItemFlow,
    settings: &SolverSettings,
    job: ChunkJob,
    worker_count: usize,
    policy: FailurePolicy,
) -> AppResult<Vec<ItemOutcome>> {
    let total = job.items.len();
    if total == 0 {
        return Ok(Vec::new());
    }

    let queue: Arc<WorkQueue> = Arc::new(Mutex::new(
        job.items
            .into_iter()
            .enumerate()
            .map(|(offset, item)| (job.first_item_index + offset, item))
            .collect(),
    ));
    let abort = Arc::new(AtomicBool::new(false));
    let workers = worker_count.clamp(1, total);

    debug!("批次 {} 启动 {} 个工作线程", job.chunk_index, workers);

    let handles = (0..workers).map(|worker_id| {
        let flow = flow.clone();
        let settings = settings.clone();
        let queue = Arc::clone(&queue);
        let abort = Arc::clone(&abort);
        let chunk_index = job.chunk_index;
        tokio::task::spawn_blocking(move || {
            run_worker(worker_id, chunk_index, &flow, &settings, &queue, &abort, policy)
        })
    });

    let mut outcomes = Vec::with_capacity(total);
    for (worker_id, joined) in join_all(handles).await.into_iter().enumerate() {
        match joined {
            Ok(mut worker_outcomes) => outcomes.append(&mut worker_outcomes),
            Err(e) => {
                return Err(ProcessingError::WorkerPanicked {
                    message: format!("worker#{}: {}", worker_id, e),
                }
                .into())
            }
        }
    }

    if abort.load(Ordering::SeqCst) {
        info!(
            "[批次 {}] ⛔ 出现失败，已停止领取新模型 ({}/{} 已领取)",
            job.chunk_index,
            outcomes.len(),
            total
        );
    }

    Ok(outcomes)
}

fn run_worker(
    worker_id: usize,
    chunk_index: usize,
    flow: &ItemFlow,
    settings: &SolverSettings,
    queue: &WorkQueue,
    abort: &AtomicBool,
    policy: FailurePolicy,
) -> Vec<ItemOutcome> {
    let mut outcomes = Vec::new();
    let mut exec: Result<ExecutionContext, ProcessingError> =
        flow.collaborators().refiner.prepare(worker_id, settings);

    loop {
        if policy == FailurePolicy::FailFast && abort.load(Ordering::SeqCst) {
            break;
        }
        let Some((item_index, item)) = next_item(queue) else {
            break;
        };

        let ctx = ItemCtx::new(chunk_index, item_index, item.canonical_id.clone(), worker_id);
        let result = match exec.as_mut() {
            Ok(exec) => flow.process(exec, &ctx, &item),
            Err(e) => Err(ProcessingError::refiner_failed(
                item.canonical_id.as_str(),
                format!("执行上下文初始化失败: {}", e),
            )
            .into()),
        };

        match &result {
            Ok(_) => info!("{} ✓ 完成", ctx),
            Err(e) => {
                error!("{} ❌ 处理失败: {}", ctx, e);
                if policy == FailurePolicy::FailFast {
                    abort.store(true, Ordering::SeqCst);
                }
            }
        }
        outcomes.push(ItemOutcome { item, result });
    }

    outcomes
}

fn next_item(queue: &WorkQueue) -> Option<(usize, InputItem)> {
    queue
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .pop_front()
}
