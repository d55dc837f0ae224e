use std::path::PathBuf;
use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 输入目录扫描错误
    #[error("输入扫描错误: {0}")]
    InputDiscovery(#[from] InputDiscoveryError),
    /// 模型加载错误
    #[error("模型加载错误: {0}")]
    Load(#[from] LoadError),
    /// 单个模型处理错误
    #[error("模型处理错误: {0}")]
    Processing(#[from] ProcessingError),
    /// 检查点读写错误
    #[error("检查点错误: {0}")]
    Checkpoint(#[from] CheckpointError),
    /// 诊断汇总错误
    #[error("汇总错误: {0}")]
    Aggregation(#[from] AggregationError),
    /// 产物输出错误
    #[error("输出错误: {0}")]
    Output(#[from] OutputError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 输入目录扫描错误
#[derive(Debug, Error)]
pub enum InputDiscoveryError {
    /// 目录不存在
    #[error("目录不存在: {}", path.display())]
    DirectoryNotFound { path: PathBuf },
    /// 路径不是目录
    #[error("路径不是目录: {}", path.display())]
    NotADirectory { path: PathBuf },
    /// 遍历目录失败
    #[error("无法读取目录 {}: {source}", path.display())]
    WalkFailed {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// 模型加载错误
#[derive(Debug, Error)]
pub enum LoadError {
    /// 读取文件失败
    #[error("读取模型文件失败 ({}): {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 文件内容无法按格式解析
    #[error("模型文件格式错误 ({}): {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },
    /// 主加载器与备用加载器均失败
    #[error("主加载器与备用加载器均失败 ({}): 主: {primary}; 备用: {fallback}", path.display())]
    FallbackFailed {
        path: PathBuf,
        primary: Box<LoadError>,
        fallback: Box<LoadError>,
    },
}

/// 单个模型处理错误
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// 精修器报告失败
    #[error("[{canonical_id}] 精修失败: {message}")]
    RefinerFailed {
        canonical_id: String,
        message: String,
    },
    /// 精修器输出无法解析
    #[error("[{canonical_id}] 精修器输出无效: {message}")]
    InvalidOutput {
        canonical_id: String,
        message: String,
    },
    /// 无法启动外部程序
    #[error("无法启动外部程序 {program}: {source}")]
    LaunchFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// 格式转换失败
    #[error("[{canonical_id}] 格式转换失败: {message}")]
    TranslationFailed {
        canonical_id: String,
        message: String,
    },
    /// 工作线程异常退出
    #[error("工作线程异常退出: {message}")]
    WorkerPanicked { message: String },
}

/// 检查点读写错误
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// 读取检查点失败
    #[error("读取检查点失败 ({}): {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 写入检查点失败
    #[error("写入检查点失败 ({}): {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 检查点文件已损坏
    #[error("检查点文件已损坏 ({}): {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// 检查点版本与请求版本不一致
    #[error("检查点版本不匹配 ({}): 期望 {expected}, 实际 {found}", path.display())]
    VersionMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },
    /// 序列化检查点失败
    #[error("序列化检查点失败: {source}")]
    EncodeFailed {
        #[source]
        source: serde_json::Error,
    },
}

/// 诊断汇总错误
#[derive(Debug, Error)]
pub enum AggregationError {
    /// 诊断值的结构不受支持
    #[error("字段 {field} 的值结构不受支持: {shape}")]
    UnsupportedShape { field: String, shape: &'static str },
    /// 字段名无法作为报表文件名
    #[error("字段名无法用作报表文件名: {field:?}")]
    InvalidFieldName { field: String },
    /// 报表文件名与汇总目录中的其他产物冲突
    #[error("字段 {field:?} 的报表会覆盖 {}", path.display())]
    ReservedFieldName { field: String, path: PathBuf },
}

/// 产物输出错误
#[derive(Debug, Error)]
pub enum OutputError {
    /// 写入文件失败
    #[error("写入文件失败 ({}): {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 写入 CSV 失败
    #[error("写入CSV失败 ({}): {source}", path.display())]
    CsvFailed {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    /// 扫描输出目录失败
    #[error("扫描输出目录失败 ({}): {source}", path.display())]
    ScanFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 二次格式导出失败
    #[error("二次格式导出失败: {message}")]
    ExportFailed { message: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({}): {source}", path.display())]
    FileReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 解析配置文件失败
    #[error("解析配置文件失败 ({}): {source}", path.display())]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置项不合法
    #[error("配置项不合法: {message}")]
    Invalid { message: String },
}

// ========== 便捷构造函数 ==========

impl OutputError {
    /// 创建文件写入错误
    pub fn write_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        OutputError::WriteFailed {
            path: path.into(),
            source,
        }
    }

    /// 创建 CSV 写入错误
    pub fn csv_failed(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        OutputError::CsvFailed {
            path: path.into(),
            source,
        }
    }
}

impl ProcessingError {
    /// 创建精修失败错误
    pub fn refiner_failed(canonical_id: impl Into<String>, message: impl Into<String>) -> Self {
        ProcessingError::RefinerFailed {
            canonical_id: canonical_id.into(),
            message: message.into(),
        }
    }

    /// 创建精修器输出无效错误
    pub fn invalid_output(canonical_id: impl Into<String>, message: impl Into<String>) -> Self {
        ProcessingError::InvalidOutput {
            canonical_id: canonical_id.into(),
            message: message.into(),
        }
    }
}

impl ConfigError {
    /// 创建配置项不合法错误
    pub fn invalid(message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            message: message.into(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
