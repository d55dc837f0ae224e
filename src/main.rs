use anyhow::{Context, Result};
use clap::Parser;
use model_refinery::utils::logging;
use model_refinery::{App, Config, FailurePolicy};
use std::path::PathBuf;

/// 命令行参数
///
/// 优先级：默认值 < 配置文件 < 环境变量 < 命令行
#[derive(Parser, Debug)]
#[command(name = "model-refinery")]
#[command(about = "批量精修代谢模型并汇总诊断信息")]
#[command(version)]
struct Cli {
    /// 原始模型所在目录
    source_dir: Option<PathBuf>,

    /// TOML 配置文件
    #[arg(short, long, env = "REFINERY_CONFIG")]
    config: Option<PathBuf>,

    /// 同时输出转换格式的模型
    #[arg(long)]
    translate: bool,

    #[arg(long)]
    refined_dir: Option<PathBuf>,

    #[arg(long)]
    translated_dir: Option<PathBuf>,

    #[arg(long)]
    summary_dir: Option<PathBuf>,

    /// 模型信息清单，缺省时自动生成
    #[arg(long)]
    item_info: Option<PathBuf>,

    #[arg(long)]
    reference_dir: Option<PathBuf>,

    /// 工作线程数，缺省按 CPU 数，0 为串行
    #[arg(short, long)]
    workers: Option<usize>,

    /// 参考资源版本名
    #[arg(long)]
    resource_version: Option<String>,

    /// 运行结束后导出二次格式
    #[arg(long)]
    export: bool,

    #[arg(long, value_enum)]
    failure_policy: Option<FailurePolicy>,

    /// 只列出待处理模型
    #[arg(long)]
    dry_run: bool,

    /// 显示详细日志
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let base = match &self.config {
            Some(path) => Config::from_toml_file(path)?,
            None => Config::default(),
        };
        let mut config = base.apply_env()?;

        if let Some(v) = self.source_dir {
            config.source_dir = v;
        }
        if let Some(v) = self.refined_dir {
            config.refined_output_dir = v;
        }
        if let Some(v) = self.translated_dir {
            config.translated_output_dir = v;
        }
        if let Some(v) = self.summary_dir {
            config.summary_output_dir = v;
        }
        if let Some(v) = self.item_info {
            config.item_info_file = Some(v);
        }
        if let Some(v) = self.reference_dir {
            config.reference_data_dir = v;
        }
        if let Some(v) = self.workers {
            config.worker_count = Some(v);
        }
        if let Some(v) = self.resource_version {
            config.resource_version_name = v;
        }
        if let Some(v) = self.failure_policy {
            config.failure_policy = v;
        }
        config.translate_models |= self.translate;
        config.export_secondary_format |= self.export;
        config.dry_run |= self.dry_run;
        config.verbose_logging |= self.verbose;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Cli::parse().into_config()?;

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    let summary = App::initialize(config)
        .context("配置无效")?
        .run()
        .await?;

    if summary.failed > 0 {
        anyhow::bail!("{} 个模型处理失败", summary.failed);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_dir_comes_from_positional_argument() {
        let config = Cli::try_parse_from(["model-refinery", "raw", "--workers", "0"])
            .unwrap()
            .into_config()
            .unwrap();
        assert_eq!(config.source_dir, PathBuf::from("raw"));
        assert_eq!(config.effective_worker_count(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_source_dir_is_rejected() {
        let config = Cli::try_parse_from(["model-refinery"])
            .unwrap()
            .into_config()
            .unwrap();
        if std::env::var_os("REFINERY_SOURCE_DIR").is_none() {
            assert!(App::initialize(config).is_err());
        }
    }
}
