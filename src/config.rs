use crate::error::ConfigError;
use crate::services::checkpoint_store::checkpoint_file_name;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// 自动生成的模型清单文件名
const MANIFEST_FILE_NAME: &str = "item_info.csv";

/// 单个模型失败时整批的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// 任一模型失败即中止本批及整个运行
    #[default]
    FailFast,
    /// 记录失败，提交成功的模型并继续
    Continue,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-fast" | "failfast" => Ok(FailurePolicy::FailFast),
            "continue" => Ok(FailurePolicy::Continue),
            other => Err(format!("未知的失败策略: {}", other)),
        }
    }
}

/// 求解器设置
///
/// 不可变，随每个任务传入；每个工作线程据此构建自己的执行上下文。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub solver: String,
    pub feasibility_tolerance: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            solver: "glpk".to_string(),
            feasibility_tolerance: 1e-9,
        }
    }
}

/// 程序配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 原始模型所在目录
    pub source_dir: PathBuf,
    /// 是否同时输出转换格式的模型
    pub translate_models: bool,
    /// 精修模型输出目录
    pub refined_output_dir: PathBuf,
    /// 转换模型输出目录
    pub translated_output_dir: PathBuf,
    /// 检查点与汇总报表目录
    pub summary_output_dir: PathBuf,
    /// 模型信息清单，缺省时自动生成
    pub item_info_file: Option<PathBuf>,
    /// 参考数据目录
    pub reference_data_dir: PathBuf,
    /// 并行工作线程数；缺省时按 CPU 数，0 与 1 均为串行
    pub worker_count: Option<usize>,
    /// 参考资源版本名，用于命名检查点
    pub resource_version_name: String,
    /// 运行结束后是否导出二次格式
    pub export_secondary_format: bool,
    pub failure_policy: FailurePolicy,
    /// 按扁平集合汇总的异常字段
    pub anomaly_fields: Vec<String>,
    pub solver: SolverSettings,
    /// 外部精修程序及其参数，为空时使用直通精修器
    pub refiner_command: Vec<String>,
    /// 外部二次格式导出程序及其参数
    pub exporter_command: Vec<String>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 只列出待处理模型，不实际处理
    pub dry_run: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::new(),
            translate_models: false,
            refined_output_dir: PathBuf::from("output/refined"),
            translated_output_dir: PathBuf::from("output/translated"),
            summary_output_dir: PathBuf::from("output/summaries"),
            item_info_file: None,
            reference_data_dir: PathBuf::from("reference"),
            worker_count: None,
            resource_version_name: "v1".to_string(),
            export_secondary_format: false,
            failure_policy: FailurePolicy::default(),
            anomaly_fields: vec![
                "uncorrected_metabolites".to_string(),
                "uncorrected_reactions".to_string(),
            ],
            solver: SolverSettings::default(),
            refiner_command: Vec::new(),
            exporter_command: Vec::new(),
            verbose_logging: false,
            dry_run: false,
        }
    }
}

impl Config {
    /// 以同一根目录放置所有输出
    pub fn rooted(source_dir: impl Into<PathBuf>, output_root: &Path) -> Self {
        Self {
            source_dir: source_dir.into(),
            refined_output_dir: output_root.join("refined"),
            translated_output_dir: output_root.join("translated"),
            summary_output_dir: output_root.join("summaries"),
            reference_data_dir: output_root.join("reference"),
            ..Self::default()
        }
    }

    /// 从 TOML 文件加载，缺失的项使用默认值
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 用环境变量覆盖配置
    pub fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Some(v) = env_var("REFINERY_SOURCE_DIR") {
            self.source_dir = PathBuf::from(v);
        }
        if let Some(v) = env_parse("REFINERY_TRANSLATE_MODELS", "bool")? {
            self.translate_models = v;
        }
        if let Some(v) = env_var("REFINERY_REFINED_DIR") {
            self.refined_output_dir = PathBuf::from(v);
        }
        if let Some(v) = env_var("REFINERY_TRANSLATED_DIR") {
            self.translated_output_dir = PathBuf::from(v);
        }
        if let Some(v) = env_var("REFINERY_SUMMARY_DIR") {
            self.summary_output_dir = PathBuf::from(v);
        }
        if let Some(v) = env_var("REFINERY_ITEM_INFO_FILE") {
            self.item_info_file = Some(PathBuf::from(v));
        }
        if let Some(v) = env_var("REFINERY_REFERENCE_DIR") {
            self.reference_data_dir = PathBuf::from(v);
        }
        if let Some(v) = env_parse("REFINERY_WORKER_COUNT", "usize")? {
            self.worker_count = Some(v);
        }
        if let Some(v) = env_var("REFINERY_VERSION") {
            self.resource_version_name = v;
        }
        if let Some(v) = env_parse("REFINERY_EXPORT", "bool")? {
            self.export_secondary_format = v;
        }
        if let Some(v) = env_parse("REFINERY_FAILURE_POLICY", "FailurePolicy")? {
            self.failure_policy = v;
        }
        if let Some(v) = env_var("REFINERY_SOLVER") {
            self.solver.solver = v;
        }
        if let Some(v) = env_parse("VERBOSE_LOGGING", "bool")? {
            self.verbose_logging = v;
        }
        Ok(self)
    }

    /// 检查配置是否自洽
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source_dir.as_os_str().is_empty() {
            return Err(ConfigError::invalid(
                "未指定源目录（命令行参数、配置文件 source_dir 或 REFINERY_SOURCE_DIR）",
            ));
        }
        let version = self.resource_version_name.trim();
        if version.is_empty() {
            return Err(ConfigError::invalid("resource_version_name 不能为空"));
        }
        if version.contains(['/', '\\']) {
            return Err(ConfigError::invalid(format!(
                "resource_version_name 不能包含路径分隔符: {}",
                version
            )));
        }
        if self.export_secondary_format && self.exporter_command.is_empty() {
            return Err(ConfigError::invalid(
                "已启用 export_secondary_format，但未配置 exporter_command",
            ));
        }
        let tolerance = self.solver.feasibility_tolerance;
        if tolerance.is_nan() || tolerance <= 0.0 {
            return Err(ConfigError::invalid(format!(
                "feasibility_tolerance 必须为正数: {}",
                self.solver.feasibility_tolerance
            )));
        }
        Ok(())
    }

    /// 实际使用的工作线程数
    pub fn effective_worker_count(&self) -> usize {
        match self.worker_count {
            Some(n) => n.max(1),
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }

    /// 当前版本的检查点文件路径
    pub fn checkpoint_path(&self) -> PathBuf {
        self.summary_output_dir
            .join(checkpoint_file_name(&self.resource_version_name))
    }

    /// 自动生成清单的路径
    pub fn manifest_path(&self) -> PathBuf {
        self.summary_output_dir.join(MANIFEST_FILE_NAME)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: FromStr>(name: &str, expected_type: &str) -> Result<Option<T>, ConfigError> {
    match env_var(name) {
        None => Ok(None),
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_partial_overrides_defaults() {
        let config: Config = toml::from_str(
            r#"
            source_dir = "/data/raw"
            worker_count = 8
            failure_policy = "continue"

            [solver]
            solver = "cplex"
            "#,
        )
        .unwrap();

        assert_eq!(config.source_dir, PathBuf::from("/data/raw"));
        assert_eq!(config.worker_count, Some(8));
        assert_eq!(config.failure_policy, FailurePolicy::Continue);
        assert_eq!(config.solver.solver, "cplex");
        assert_eq!(config.solver.feasibility_tolerance, 1e-9);
        assert_eq!(config.resource_version_name, "v1");
        assert_eq!(config.anomaly_fields.len(), 2);
    }

    #[test]
    fn test_checkpoint_path_uses_version() {
        let config = Config {
            resource_version_name: "bigg_2024".to_string(),
            ..Config::rooted("src", Path::new("/out"))
        };
        assert_eq!(
            config.checkpoint_path(),
            PathBuf::from("/out/summaries/summaries_bigg_2024.json")
        );
    }

    fn rooted() -> Config {
        Config::rooted("raw", Path::new("/out"))
    }

    #[test]
    fn test_validate_rejects_export_without_command() {
        let config = Config {
            export_secondary_format: true,
            ..rooted()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_version_name() {
        let config = Config {
            resource_version_name: "a/b".to_string(),
            ..rooted()
        };
        assert!(config.validate().is_err());
        assert!(rooted().validate().is_ok());
    }

    #[test]
    fn test_validate_requires_source_dir() {
        let err = Config::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().contains("源目录"));
    }

    #[test]
    fn test_validate_rejects_non_positive_tolerance() {
        for tolerance in [0.0, -1e-9, f64::NAN] {
            let mut config = rooted();
            config.solver.feasibility_tolerance = tolerance;
            assert!(config.validate().is_err(), "tolerance {}", tolerance);
        }
    }

    #[test]
    fn test_worker_count_resolution() {
        // 缺省时按 CPU 数
        assert!(Config::default().effective_worker_count() >= 1);

        let with = |n| Config {
            worker_count: Some(n),
            ..Config::default()
        };
        assert_eq!(with(3).effective_worker_count(), 3);
        // 0 表示串行，而不是全部 CPU
        assert_eq!(with(0).effective_worker_count(), 1);
        assert_eq!(with(1).effective_worker_count(), 1);
    }

    #[test]
    fn test_failure_policy_from_str() {
        assert_eq!("fail-fast".parse::<FailurePolicy>(), Ok(FailurePolicy::FailFast));
        assert_eq!("Continue".parse::<FailurePolicy>(), Ok(FailurePolicy::Continue));
        assert!("retry".parse::<FailurePolicy>().is_err());
    }
}
