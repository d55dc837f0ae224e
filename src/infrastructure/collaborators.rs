//! 外部协作者接口
//!
//! 模型加载、精修、格式转换、写出与二次导出都不属于本系统的核心，
//! 这里只约定它们的能力边界。编排层通过 `Collaborators` 持有具体实现。

use crate::config::{Config, SolverSettings};
use crate::error::{LoadError, OutputError, ProcessingError};
use crate::infrastructure::command::{CommandExporter, CommandRefiner};
use crate::infrastructure::model_io::{
    AtomicFileWriter, FormatLoader, GenericLoader, JsonEnvelopeTranslator, PassthroughRefiner,
};
use crate::models::{CanonicalId, DiagnosticRecord, ModelDocument, ModelFormat, RawModel};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// 工作线程独占的执行上下文
///
/// 每个工作线程建立一次，线程之间从不共享。
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub worker_id: usize,
    pub settings: SolverSettings,
    /// 本线程已处理的模型数
    pub items_processed: usize,
}

impl ExecutionContext {
    pub fn new(worker_id: usize, settings: SolverSettings) -> Self {
        Self {
            worker_id,
            settings,
            items_processed: 0,
        }
    }
}

/// 一次精修调用的输入
#[derive(Debug)]
pub struct RefineRequest<'a> {
    pub raw: &'a RawModel,
    pub canonical_id: &'a CanonicalId,
    pub info_file: &'a Path,
    pub reference_data_dir: &'a Path,
    pub translate: bool,
}

/// 精修结果
#[derive(Debug, Clone)]
pub struct Refinement {
    pub model: ModelDocument,
    pub diagnostics: DiagnosticRecord,
}

/// 模型加载器
pub trait ModelLoader: Send + Sync {
    fn load(&self, path: &Path, format: ModelFormat) -> Result<RawModel, LoadError>;
}

/// 模型精修器
pub trait ModelRefiner: Send + Sync {
    /// 为一个工作线程建立执行上下文
    fn prepare(
        &self,
        worker_id: usize,
        settings: &SolverSettings,
    ) -> Result<ExecutionContext, ProcessingError> {
        Ok(ExecutionContext::new(worker_id, settings.clone()))
    }

    fn refine(
        &self,
        ctx: &mut ExecutionContext,
        request: &RefineRequest<'_>,
    ) -> Result<Refinement, ProcessingError>;
}

/// 模型格式转换器
pub trait ModelTranslator: Send + Sync {
    fn translate(
        &self,
        raw: &RawModel,
        canonical_id: &CanonicalId,
    ) -> Result<ModelDocument, ProcessingError>;
}

/// 模型写出器
pub trait ModelWriter: Send + Sync {
    fn write(&self, model: &ModelDocument, path: &Path) -> Result<(), OutputError>;
}

/// 二次格式导出器
pub trait SecondaryFormatExporter: Send + Sync {
    /// 导出精修目录，返回导出结果所在目录
    fn export(&self, refined_dir: &Path) -> Result<PathBuf, OutputError>;
}

/// 全部外部协作者
#[derive(Clone)]
pub struct Collaborators {
    pub loader: Arc<dyn ModelLoader>,
    /// 主加载器失败后使用的通用加载器
    pub fallback_loader: Arc<dyn ModelLoader>,
    pub refiner: Arc<dyn ModelRefiner>,
    pub translator: Arc<dyn ModelTranslator>,
    pub writer: Arc<dyn ModelWriter>,
    pub exporter: Option<Arc<dyn SecondaryFormatExporter>>,
}

impl Collaborators {
    /// 按配置选择默认实现
    pub fn from_config(config: &Config) -> Self {
        let refiner: Arc<dyn ModelRefiner> = match CommandRefiner::from_command(&config.refiner_command) {
            Some(command) => Arc::new(command),
            None => Arc::new(PassthroughRefiner),
        };
        let exporter = CommandExporter::from_command(&config.exporter_command)
            .map(|e| Arc::new(e) as Arc<dyn SecondaryFormatExporter>);

        Self {
            loader: Arc::new(FormatLoader),
            fallback_loader: Arc::new(GenericLoader),
            refiner,
            translator: Arc::new(JsonEnvelopeTranslator),
            writer: Arc::new(AtomicFileWriter),
            exporter,
        }
    }

    /// 替换精修器
    pub fn with_refiner(mut self, refiner: Arc<dyn ModelRefiner>) -> Self {
        self.refiner = refiner;
        self
    }

    /// 替换二次格式导出器
    pub fn with_exporter(mut self, exporter: Arc<dyn SecondaryFormatExporter>) -> Self {
        self.exporter = Some(exporter);
        self
    }
}
