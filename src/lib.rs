//! # Model Refinery
//!
//! 一个批量精修代谢模型并汇总诊断信息的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 外部协作者的接口与默认实现，只暴露能力
//! - `ModelLoader` / `ModelRefiner` / `ModelTranslator` / `ModelWriter` - 加载、精修、转换、写出
//! - `CommandRefiner` - 以外部程序作为精修器
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心调度
//! - `input_scanner` - 扫描源目录并去重
//! - `completion_registry` - 识别已完成的模型
//! - `CheckpointStore` - 读写诊断注册表检查点
//! - `SummaryAggregator` / `ReportWriter` - 生成并写出汇总报表
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个模型"的完整处理流程
//! - `ItemCtx` - 上下文封装（批次 + 序号 + 规范 ID）
//! - `ItemFlow` - 流程编排（load → refine → translate）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 工作列表、分批、检查点与汇总
//! - `orchestrator/chunk_processor` - 单批并行处理
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, FailurePolicy, SolverSettings};
pub use error::{AppError, AppResult};
pub use infrastructure::Collaborators;
pub use models::{CanonicalId, DiagnosticRecord, InputItem, ModelFormat, SummaryRegistry};
pub use orchestrator::{App, RunSummary};
pub use workflow::{ItemCtx, ItemFlow};
