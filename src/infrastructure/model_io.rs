//! 默认的模型读写实现
//!
//! 真正的模型解析与精修算法在系统之外；这里的实现只做最基本的格式检查，
//! 让流水线在没有外部精修程序时也能完整跑通。

use crate::error::{LoadError, OutputError, ProcessingError};
use crate::infrastructure::collaborators::{
    ExecutionContext, ModelLoader, ModelRefiner, ModelTranslator, ModelWriter, RefineRequest,
    Refinement,
};
use crate::models::{CanonicalId, DiagnosticRecord, ModelDocument, ModelFormat, RawModel, Scalar};
use serde_json::{json, Value};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

fn read_model_file(path: &Path) -> Result<Vec<u8>, LoadError> {
    fs::read(path).map_err(|source| LoadError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })
}

/// 按格式严格加载
pub struct FormatLoader;

impl ModelLoader for FormatLoader {
    fn load(&self, path: &Path, format: ModelFormat) -> Result<RawModel, LoadError> {
        let bytes = read_model_file(path)?;
        let malformed = |reason: String| LoadError::Malformed {
            path: path.to_path_buf(),
            reason,
        };

        let content = String::from_utf8(bytes).map_err(|e| malformed(format!("非 UTF-8 内容: {}", e)))?;

        match format {
            ModelFormat::Json => {
                let value: Value = serde_json::from_str(&content)
                    .map_err(|e| malformed(format!("JSON 解析失败: {}", e)))?;
                if !value.is_object() {
                    return Err(malformed("JSON 顶层必须是对象".to_string()));
                }
            }
            ModelFormat::Sbml => {
                if !content.contains("<sbml") {
                    return Err(malformed("缺少 <sbml> 根元素".to_string()));
                }
            }
        }

        Ok(RawModel {
            source: path.to_path_buf(),
            format,
            content,
        })
    }
}

/// 通用加载：不做格式检查，只要求文件非空
pub struct GenericLoader;

impl ModelLoader for GenericLoader {
    fn load(&self, path: &Path, format: ModelFormat) -> Result<RawModel, LoadError> {
        let bytes = read_model_file(path)?;
        let content = String::from_utf8_lossy(&bytes).into_owned();
        if content.trim().is_empty() {
            return Err(LoadError::Malformed {
                path: path.to_path_buf(),
                reason: "文件为空".to_string(),
            });
        }
        Ok(RawModel {
            source: path.to_path_buf(),
            format,
            content,
        })
    }
}

/// 直通精修器：原样返回模型，只报告基本统计
///
/// 未配置外部精修程序时使用。
pub struct PassthroughRefiner;

impl ModelRefiner for PassthroughRefiner {
    fn refine(
        &self,
        ctx: &mut ExecutionContext,
        request: &RefineRequest<'_>,
    ) -> Result<Refinement, ProcessingError> {
        let content = &request.raw.content;
        let diagnostics = DiagnosticRecord::new()
            .with("source_format", Scalar::from(request.raw.format.name()))
            .with("size_bytes", Scalar::from(content.len() as i64))
            .with("line_count", Scalar::from(content.lines().count() as i64))
            .with("solver", Scalar::from(ctx.settings.solver.as_str()));

        ctx.items_processed += 1;
        Ok(Refinement {
            model: ModelDocument::new(content.clone()),
            diagnostics,
        })
    }
}

/// 把原始模型包进 JSON 信封
pub struct JsonEnvelopeTranslator;

impl ModelTranslator for JsonEnvelopeTranslator {
    fn translate(
        &self,
        raw: &RawModel,
        canonical_id: &CanonicalId,
    ) -> Result<ModelDocument, ProcessingError> {
        let envelope = json!({
            "id": canonical_id.as_str(),
            "source_format": raw.format.name(),
            "source": raw.source.to_string_lossy(),
            "content": raw.content,
        });
        serde_json::to_string_pretty(&envelope)
            .map(ModelDocument::new)
            .map_err(|e| ProcessingError::TranslationFailed {
                canonical_id: canonical_id.to_string(),
                message: e.to_string(),
            })
    }
}

/// 原子写出：先写同目录临时文件，再重命名
///
/// 完成登记只看最终文件名，因此半写的产物不会被当作已完成。
pub struct AtomicFileWriter;

impl ModelWriter for AtomicFileWriter {
    fn write(&self, model: &ModelDocument, path: &Path) -> Result<(), OutputError> {
        let write_failed = |e: std::io::Error| OutputError::write_failed(path, e);
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir).map_err(write_failed)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(write_failed)?;
        tmp.write_all(model.content.as_bytes()).map_err(write_failed)?;
        tmp.as_file().sync_all().map_err(write_failed)?;
        tmp.persist(path).map_err(|e| write_failed(e.error))?;
        Ok(())
    }
}
