//! 批量模型处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个流水线的入口，负责工作列表、分批调度、检查点与最终汇总。
//!
//! ## 核心功能
//!
//! 1. **扫描去重**：列出源目录中的模型，按规范 ID 去重
//! 2. **断点续跑**：跳过输出目录中已有产物的模型，载入上次的检查点
//! 3. **分批处理**：工作列表超过 200 个时每批 100 个，否则每批 25 个
//! 4. **批次屏障**：每批全部结束后，先合并并保存检查点，再写出产物
//! 5. **全量汇总**：所有批次结束后从完整注册表重新生成报表
//!
//! ## 设计特点
//!
//! - **唯一写者**：输出目录与检查点只由本模块在屏障之后写入，工作线程从不写文件
//! - **幂等合并**：注册表按规范 ID 覆盖，重复处理同一模型是安全的
//! - **向下委托**：委托 chunk_processor 并行处理单个批次

use crate::config::{Config, FailurePolicy};
use crate::error::{AppError, AppResult, OutputError};
use crate::infrastructure::Collaborators;
use crate::models::{CanonicalId, InputItem, ItemOutcome, ProcessingResult, SummaryRegistry};
use crate::orchestrator::chunk_processor::{self, ChunkJob};
use crate::services::completion_registry::{
    self, refined_artifact_name, translated_artifact_name,
};
use crate::services::{
    input_scanner, CheckpointStore, ManifestWriter, ReportWriter, SummaryAggregator,
};
use crate::utils::logging;
use crate::workflow::{ItemFlow, SharedInputs};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

/// 工作列表超过该值时使用大批次
const LARGE_WORKLOAD_THRESHOLD: usize = 200;
const LARGE_CHUNK_SIZE: usize = 100;
const SMALL_CHUNK_SIZE: usize = 25;

/// 按工作列表长度选择批大小
pub fn chunk_size(work_len: usize) -> usize {
    if work_len > LARGE_WORKLOAD_THRESHOLD {
        LARGE_CHUNK_SIZE
    } else {
        SMALL_CHUNK_SIZE
    }
}

/// 各批次的大小
pub fn plan_chunks(work_len: usize) -> Vec<usize> {
    let size = chunk_size(work_len);
    (0..work_len)
        .step_by(size)
        .map(|start| size.min(work_len - start))
        .collect()
}

/// 一次运行的统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// 去重后扫描到的模型数
    pub discovered: usize,
    /// 已有产物、被跳过的模型数
    pub already_completed: usize,
    /// 本次计划处理的模型数
    pub scheduled: usize,
    pub processed: usize,
    pub failed: usize,
    pub chunks: usize,
    /// 检查点保存次数，每个提交的批次恰好一次
    pub checkpoints_saved: usize,
    pub reports_written: usize,
    pub exported_dir: Option<PathBuf>,
}

/// 应用主结构
pub struct App {
    config: Config,
    collaborators: Collaborators,
}

impl App {
    /// 初始化应用，按配置选择默认协作者
    pub fn initialize(config: Config) -> AppResult<Self> {
        let collaborators = Collaborators::from_config(&config);
        Self::with_collaborators(config, collaborators)
    }

    /// 使用指定的协作者初始化
    pub fn with_collaborators(config: Config, collaborators: Collaborators) -> AppResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            collaborators,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> AppResult<RunSummary> {
        let config = &self.config;
        let worker_count = config.effective_worker_count();
        logging::log_startup(config, worker_count);

        let items = input_scanner::scan(&config.source_dir)?;
        if items.is_empty() {
            warn!("⚠️ 源目录中没有找到可处理的模型: {}", config.source_dir.display());
        }

        let completed: HashSet<String> =
            completion_registry::load_completed(&config.refined_output_dir)?
                .iter()
                .map(CanonicalId::dedup_key)
                .collect();
        let discovered = items.len();
        let work_list: Vec<InputItem> = items
            .iter()
            .filter(|item| !completed.contains(&item.canonical_id.dedup_key()))
            .cloned()
            .collect();

        let mut summary = RunSummary {
            discovered,
            already_completed: discovered - work_list.len(),
            scheduled: work_list.len(),
            ..Default::default()
        };
        logging::log_work_list(&summary, chunk_size(work_list.len()));

        if config.dry_run {
            for item in &work_list {
                info!("  · {} ← {}", item.canonical_id, item.path().display());
            }
            info!("🔎 dry-run 模式，不做任何处理");
            return Ok(summary);
        }

        let info_file = match &config.item_info_file {
            Some(path) => path.clone(),
            None => ManifestWriter::with_path(config.manifest_path())
                .write(&items)?
                .to_path_buf(),
        };

        let store = CheckpointStore::new(&config.summary_output_dir);
        let mut registry = store.load(&config.resource_version_name)?;

        let flow = ItemFlow::new(
            self.collaborators.clone(),
            SharedInputs {
                info_file,
                reference_data_dir: config.reference_data_dir.clone(),
                translate: config.translate_models,
            },
        );

        let plan = plan_chunks(work_list.len());
        let total_chunks = plan.len();
        let mut remaining = work_list.into_iter();
        let mut first_item_index = 1;

        for (chunk_no, size) in plan.into_iter().enumerate() {
            let chunk_index = chunk_no + 1;
            let chunk_items: Vec<InputItem> = remaining.by_ref().take(size).collect();
            logging::log_chunk_start(
                chunk_index,
                total_chunks,
                first_item_index,
                first_item_index + size - 1,
                summary.scheduled,
            );

            let started = Instant::now();
            let job = ChunkJob {
                chunk_index,
                first_item_index,
                items: chunk_items,
            };
            let outcomes = chunk_processor::process_chunk(
                &flow,
                &config.solver,
                job,
                worker_count,
                config.failure_policy,
            )
            .await?;

            let (succeeded, failed) = self.commit_chunk(&store, &mut registry, outcomes)?;
            summary.processed += succeeded;
            summary.failed += failed;
            summary.chunks += 1;
            summary.checkpoints_saved += 1;
            first_item_index += size;

            logging::log_chunk_complete(chunk_index, succeeded, failed, started.elapsed());
        }

        let aggregator = SummaryAggregator::new(config.anomaly_fields.iter().cloned());
        let reports = aggregator.aggregate(&registry);
        // 清单与报表同在汇总目录，报表不得覆盖清单
        let mut report_writer = ReportWriter::new(&config.summary_output_dir);
        report_writer.reserve(config.manifest_path());
        if let Some(info_file) = &config.item_info_file {
            report_writer.reserve(info_file);
        }
        summary.reports_written = report_writer.write_all(&reports)?.len();

        if config.export_secondary_format {
            summary.exported_dir = Some(self.export()?);
        }

        logging::print_final_stats(&summary, config);
        Ok(summary)
    }

    /// 批次屏障之后提交结果
    ///
    /// 先合并并保存检查点，再写出产物：崩溃在两者之间时，该模型在下一次运行中
    /// 会被重新处理并幂等覆盖，而不会出现"有产物却无诊断记录"的情况。
    fn commit_chunk(
        &self,
        store: &CheckpointStore,
        registry: &mut SummaryRegistry,
        outcomes: Vec<ItemOutcome>,
    ) -> AppResult<(usize, usize)> {
        let mut results: Vec<ProcessingResult> = Vec::with_capacity(outcomes.len());
        let mut first_error: Option<AppError> = None;
        let mut failed = 0;

        for outcome in outcomes {
            match outcome.result {
                Ok(result) => results.push(result),
                Err(e) => {
                    failed += 1;
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        if self.config.failure_policy == FailurePolicy::FailFast {
            if let Some(e) = first_error {
                warn!("⛔ 本批已放弃，之前的检查点保持不变");
                return Err(e);
            }
        }

        for result in &results {
            registry.merge(result.canonical_id.clone(), result.diagnostics.clone());
        }
        store.save(&self.config.resource_version_name, registry)?;

        for result in &results {
            self.write_artifacts(result)?;
        }

        Ok((results.len(), failed))
    }

    fn write_artifacts(&self, result: &ProcessingResult) -> Result<(), OutputError> {
        let writer = &self.collaborators.writer;
        let refined_path = self
            .config
            .refined_output_dir
            .join(refined_artifact_name(&result.canonical_id));
        writer.write(&result.refined_model, &refined_path)?;

        if let Some(translated) = &result.translated_model {
            let translated_path = self
                .config
                .translated_output_dir
                .join(translated_artifact_name(&result.canonical_id));
            writer.write(translated, &translated_path)?;
        }
        Ok(())
    }

    fn export(&self) -> AppResult<PathBuf> {
        let exporter = self.collaborators.exporter.as_ref().ok_or_else(|| OutputError::ExportFailed {
            message: "未配置二次格式导出器".to_string(),
        })?;
        let exported = exporter.export(&self.config.refined_output_dir)?;
        info!("📦 二次格式已导出至: {}", exported.display());
        Ok(exported)
    }
}
