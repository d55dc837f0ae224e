/// 日志工具模块
///
/// 提供订阅器初始化和日志格式化的辅助函数
use crate::config::Config;
use crate::orchestrator::RunSummary;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志订阅器
///
/// `RUST_LOG` 优先；未设置时按 `verbose` 选择 debug 或 info。
/// 重复初始化时静默忽略。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(verbose)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `config`: 本次运行的配置
/// - `worker_count`: 实际工作线程数
pub fn log_startup(config: &Config, worker_count: usize) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 程序启动 - 模型精修批处理 ({})",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("📂 源目录: {}", config.source_dir.display());
    info!("📂 精修输出: {}", config.refined_output_dir.display());
    if config.translate_models {
        info!("📂 转换输出: {}", config.translated_output_dir.display());
    }
    info!("📂 汇总目录: {}", config.summary_output_dir.display());
    info!("🏷️ 资源版本: {}", config.resource_version_name);
    info!("📊 工作线程数: {}", worker_count);
    info!("{}", "=".repeat(60));
}

/// 记录工作列表信息
///
/// # 参数
/// - `summary`: 扫描阶段的统计
/// - `chunk_size`: 每批模型数
pub fn log_work_list(summary: &RunSummary, chunk_size: usize) {
    info!("✓ 找到 {} 个模型", summary.discovered);
    if summary.already_completed > 0 {
        info!("⏭️ 跳过 {} 个已完成的模型", summary.already_completed);
    }
    info!("📋 待处理 {} 个，每批 {} 个", summary.scheduled, chunk_size);
    info!("💡 每批完成后保存检查点，再开始下一批\n");
}

/// 记录批次开始信息
///
/// # 参数
/// - `chunk_num`: 批次编号
/// - `total_chunks`: 批次总数
/// - `start`: 起始模型编号
/// - `end`: 结束模型编号
/// - `total`: 待处理模型总数
pub fn log_chunk_start(
    chunk_num: usize,
    total_chunks: usize,
    start: usize,
    end: usize,
    total: usize,
) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始处理第 {}/{} 批", chunk_num, total_chunks);
    info!("📄 本批模型: {}-{} / 共 {} 个", start, end, total);
    info!("{}", "=".repeat(60));
}

/// 记录批次完成信息
pub fn log_chunk_complete(chunk_num: usize, success: usize, failed: usize, elapsed: Duration) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 第 {} 批完成: 成功 {}/{}，耗时 {:.1}s，检查点已保存",
        chunk_num,
        success,
        success + failed,
        elapsed.as_secs_f64()
    );
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(summary: &RunSummary, config: &Config) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", summary.processed, summary.scheduled);
    info!("❌ 失败: {}", summary.failed);
    info!("⏭️ 已跳过: {}", summary.already_completed);
    info!("💾 检查点保存: {} 次", summary.checkpoints_saved);
    info!("📑 汇总报表: {} 个", summary.reports_written);
    if let Some(dir) = &summary.exported_dir {
        info!("📦 二次格式: {}", dir.display());
    }
    info!("{}", "=".repeat(60));
    info!("\n检查点已保存至: {}", config.checkpoint_path().display());
}
