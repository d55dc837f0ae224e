//! 模型处理上下文
//!
//! 封装"我正在处理第几批的哪个模型"这一信息，仅用于日志

use crate::models::CanonicalId;
use std::fmt::Display;

#[derive(Debug, Clone)]
pub struct ItemCtx {
    /// 批次编号（从1开始）
    pub chunk_index: usize,

    /// 全局序号（从1开始）
    pub item_index: usize,

    pub canonical_id: CanonicalId,

    pub worker_id: usize,
}

impl ItemCtx {
    pub fn new(
        chunk_index: usize,
        item_index: usize,
        canonical_id: CanonicalId,
        worker_id: usize,
    ) -> Self {
        Self {
            chunk_index,
            item_index,
            canonical_id,
            worker_id,
        }
    }
}

impl Display for ItemCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[批次#{} 模型#{} {} worker#{}]",
            self.chunk_index, self.item_index, self.canonical_id, self.worker_id
        )
    }
}
