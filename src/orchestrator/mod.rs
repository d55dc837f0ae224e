//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责工作列表、分批调度与结果提交，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量模型处理器
//! - 扫描源目录、按规范 ID 去重、跳过已完成的模型
//! - 按工作列表长度切分批次
//! - 批次屏障之后合并注册表、保存检查点、写出产物
//! - 运行结束后生成汇总报表，可选导出二次格式
//!
//! ### `chunk_processor` - 单批处理器
//! - 启动固定数量的工作线程，从共享队列领取模型
//! - 每个线程持有自己的 ExecutionContext
//! - 按失败策略决定是否提前停止
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<InputItem>)
//!     ↓
//! chunk_processor (处理一个批次)
//!     ↓
//! workflow::ItemFlow (处理单个模型)
//!     ↓
//! infrastructure (协作者：加载 / 精修 / 转换 / 写出)
//! ```
//!
//! ## 设计原则
//!
//! 1. **唯一写者**：只有 batch_processor 写检查点和输出目录
//! 2. **向下依赖**：编排层 → workflow → infrastructure
//! 3. **无业务逻辑**：只做调度和统计，模型内容由协作者决定

pub mod batch_processor;
pub mod chunk_processor;

// 重新导出主要类型
pub use batch_processor::{chunk_size, plan_chunks, App, RunSummary};
pub use chunk_processor::{process_chunk, ChunkJob};
