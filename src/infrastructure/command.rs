//! 外部程序协作者
//!
//! 精修器与导出器以独立进程运行，本系统只负责传参和解析输出。

use crate::error::{OutputError, ProcessingError};
use crate::infrastructure::collaborators::{
    ExecutionContext, ModelRefiner, RefineRequest, Refinement, SecondaryFormatExporter,
};
use crate::models::{DiagnosticRecord, ModelDocument};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tracing::debug;

/// 错误信息中保留的 stderr 行数
const STDERR_TAIL_LINES: usize = 20;

/// 精修程序在 stdout 上输出的 JSON
#[derive(Debug, Deserialize)]
struct RefinerOutput {
    model: String,
    #[serde(default)]
    diagnostics: Map<String, Value>,
}

/// 以外部程序作为精修器
///
/// 调用约定：
/// `program [args…] --input <path> --id <id> --info <file> --reference <dir>
///  --solver <name> --tolerance <f64> [--translate]`，
/// 成功时退出码为 0，stdout 为 `{"model": "...", "diagnostics": {...}}`。
#[derive(Debug, Clone)]
pub struct CommandRefiner {
    program: String,
    args: Vec<String>,
}

impl CommandRefiner {
    /// 由 `[program, args...]` 构造，列表为空时返回 `None`
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    fn build_command(&self, ctx: &ExecutionContext, request: &RefineRequest<'_>) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg("--input")
            .arg(&request.raw.source)
            .arg("--id")
            .arg(request.canonical_id.as_str())
            .arg("--info")
            .arg(request.info_file)
            .arg("--reference")
            .arg(request.reference_data_dir)
            .arg("--solver")
            .arg(&ctx.settings.solver)
            .arg("--tolerance")
            .arg(ctx.settings.feasibility_tolerance.to_string());
        if request.translate {
            cmd.arg("--translate");
        }
        cmd
    }
}

impl ModelRefiner for CommandRefiner {
    fn refine(
        &self,
        ctx: &mut ExecutionContext,
        request: &RefineRequest<'_>,
    ) -> Result<Refinement, ProcessingError> {
        let id = request.canonical_id.as_str();
        debug!("[worker {}] ⚙️ 调用精修程序: {}", ctx.worker_id, id);

        let output = self
            .build_command(ctx, request)
            .output()
            .map_err(|source| ProcessingError::LaunchFailed {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ProcessingError::refiner_failed(
                id,
                format!("退出状态 {}: {}", output.status, stderr_tail(&output)),
            ));
        }

        let parsed: RefinerOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| ProcessingError::invalid_output(id, e.to_string()))?;
        let diagnostics = DiagnosticRecord::from_json(Value::Object(parsed.diagnostics))
            .map_err(|e| ProcessingError::invalid_output(id, e.to_string()))?;

        ctx.items_processed += 1;
        Ok(Refinement {
            model: ModelDocument::new(parsed.model),
            diagnostics,
        })
    }
}

/// 以外部程序作为二次格式导出器
///
/// 调用约定：`program [args…] <refined_dir>`，stdout 为导出目录路径。
#[derive(Debug, Clone)]
pub struct CommandExporter {
    program: String,
    args: Vec<String>,
}

impl CommandExporter {
    pub fn from_command(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl SecondaryFormatExporter for CommandExporter {
    fn export(&self, refined_dir: &Path) -> Result<PathBuf, OutputError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(refined_dir)
            .output()
            .map_err(|e| OutputError::ExportFailed {
                message: format!("无法启动 {}: {}", self.program, e),
            })?;

        if !output.status.success() {
            return Err(OutputError::ExportFailed {
                message: format!("退出状态 {}: {}", output.status, stderr_tail(&output)),
            });
        }

        let exported = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if exported.is_empty() {
            return Err(OutputError::ExportFailed {
                message: "导出程序没有输出导出目录".to_string(),
            });
        }
        Ok(PathBuf::from(exported))
    }
}

fn stderr_tail(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let lines: Vec<&str> = stderr.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
