//! 单个模型处理流程 - 流程层
//!
//! 定义"一个模型"的完整处理：加载（失败时换通用加载器重试一次）→ 精修 → 可选转换。
//! 不写任何文件；产物由编排层在批次屏障之后统一写出。

use crate::error::{AppResult, LoadError};
use crate::infrastructure::{Collaborators, ExecutionContext, RefineRequest};
use crate::models::{InputItem, ProcessingResult, RawModel};
use crate::workflow::ItemCtx;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// 所有任务共享的只读输入，运行前加载一次
#[derive(Debug, Clone)]
pub struct SharedInputs {
    pub info_file: PathBuf,
    pub reference_data_dir: PathBuf,
    pub translate: bool,
}

/// 单个模型处理流程
#[derive(Clone)]
pub struct ItemFlow {
    collaborators: Collaborators,
    inputs: Arc<SharedInputs>,
}

impl ItemFlow {
    pub fn new(collaborators: Collaborators, inputs: SharedInputs) -> Self {
        Self {
            collaborators,
            inputs: Arc::new(inputs),
        }
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// 处理一个模型
    pub fn process(
        &self,
        exec: &mut ExecutionContext,
        ctx: &ItemCtx,
        item: &InputItem,
    ) -> AppResult<ProcessingResult> {
        debug!("{} 开始处理 {}", ctx, item.raw_name);

        let raw = self.load(ctx, item)?;

        let request = RefineRequest {
            raw: &raw,
            canonical_id: &item.canonical_id,
            info_file: &self.inputs.info_file,
            reference_data_dir: &self.inputs.reference_data_dir,
            translate: self.inputs.translate,
        };
        let refinement = self.collaborators.refiner.refine(exec, &request)?;

        let translated_model = if self.inputs.translate && item.format.is_translatable() {
            Some(
                self.collaborators
                    .translator
                    .translate(&raw, &item.canonical_id)?,
            )
        } else {
            None
        };

        debug!(
            "{} ✓ 处理完成，诊断字段 {} 个",
            ctx,
            refinement.diagnostics.len()
        );

        Ok(ProcessingResult {
            canonical_id: item.canonical_id.clone(),
            refined_model: refinement.model,
            diagnostics: refinement.diagnostics,
            translated_model,
        })
    }

    /// 先用主加载器，失败后用通用加载器重试一次
    fn load(&self, ctx: &ItemCtx, item: &InputItem) -> Result<RawModel, LoadError> {
        let path = item.path();
        match self.collaborators.loader.load(&path, item.format) {
            Ok(raw) => Ok(raw),
            Err(primary) => {
                warn!("{} ⚠️ 主加载器失败，改用通用加载器: {}", ctx, primary);
                self.collaborators
                    .fallback_loader
                    .load(&path, item.format)
                    .map_err(|fallback| LoadError::FallbackFailed {
                        path,
                        primary: Box::new(primary),
                        fallback: Box::new(fallback),
                    })
            }
        }
    }
}
