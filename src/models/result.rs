use crate::error::AppError;
use crate::models::canonical_id::CanonicalId;
use crate::models::diagnostic::DiagnosticRecord;
use crate::models::item::{InputItem, ModelFormat};
use std::path::PathBuf;

/// 已加载的原始模型
#[derive(Debug, Clone)]
pub struct RawModel {
    pub source: PathBuf,
    pub format: ModelFormat,
    pub content: String,
}

/// 精修或转换后得到的模型文档
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDocument {
    pub content: String,
}

impl ModelDocument {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }
}

/// 单个模型一次运行的处理结果
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    pub canonical_id: CanonicalId,
    pub refined_model: ModelDocument,
    pub diagnostics: DiagnosticRecord,
    /// 仅当输入格式可转换且要求转换时存在
    pub translated_model: Option<ModelDocument>,
}

/// 单个模型的处理结局（成功或失败）
#[derive(Debug)]
pub struct ItemOutcome {
    pub item: InputItem,
    pub result: Result<ProcessingResult, AppError>,
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}
