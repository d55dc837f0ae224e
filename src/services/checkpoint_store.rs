//! 检查点存储服务 - 业务能力层
//!
//! 以版本名为键，整体保存 / 读取诊断注册表。
//! 写入先落到同目录的临时文件再原子重命名，崩溃时不会留下半个检查点。

use crate::error::CheckpointError;
use crate::models::SummaryRegistry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// 检查点文件名
pub fn checkpoint_file_name(version: &str) -> String {
    format!("summaries_{}.json", version)
}

#[derive(Serialize)]
struct CheckpointOut<'a> {
    version: &'a str,
    saved_at: DateTime<Utc>,
    item_count: usize,
    records: &'a SummaryRegistry,
}

#[derive(Deserialize)]
struct CheckpointIn {
    version: String,
    records: SummaryRegistry,
}

/// 检查点存储
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    dir: PathBuf,
}

impl CheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// 指定版本的检查点路径
    pub fn path(&self, version: &str) -> PathBuf {
        self.dir.join(checkpoint_file_name(version))
    }

    /// 读取检查点
    ///
    /// 文件不存在时返回空注册表；文件存在但无法解析时报错，绝不静默丢弃已有数据。
    pub fn load(&self, version: &str) -> Result<SummaryRegistry, CheckpointError> {
        let path = self.path(version);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("📭 未找到检查点 {}，从头开始", path.display());
                return Ok(SummaryRegistry::new());
            }
            Err(source) => return Err(CheckpointError::ReadFailed { path, source }),
        };

        let checkpoint: CheckpointIn = serde_json::from_str(&content)
            .map_err(|source| CheckpointError::Corrupt {
                path: path.clone(),
                source,
            })?;

        if checkpoint.version != version {
            return Err(CheckpointError::VersionMismatch {
                path,
                expected: version.to_string(),
                found: checkpoint.version,
            });
        }

        info!(
            "📂 已载入检查点 {}，包含 {} 条记录",
            path.display(),
            checkpoint.records.len()
        );
        Ok(checkpoint.records)
    }

    /// 整体覆盖保存检查点
    pub fn save(&self, version: &str, registry: &SummaryRegistry) -> Result<(), CheckpointError> {
        let path = self.path(version);
        let write_failed = |source: std::io::Error| CheckpointError::WriteFailed {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(write_failed)?;

        let checkpoint = CheckpointOut {
            version,
            saved_at: Utc::now(),
            item_count: registry.len(),
            records: registry,
        };

        let tmp = NamedTempFile::new_in(&self.dir).map_err(write_failed)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            serde_json::to_writer_pretty(&mut writer, &checkpoint)
                .map_err(|source| CheckpointError::EncodeFailed { source })?;
            writer.flush().map_err(write_failed)?;
        }
        tmp.as_file().sync_all().map_err(write_failed)?;
        tmp.persist(&path).map_err(|e| write_failed(e.error))?;

        debug!("💾 检查点已保存: {} ({} 条)", path.display(), registry.len());
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CanonicalId, DiagnosticRecord, Scalar};
    use tempfile::TempDir;

    fn sample_registry() -> SummaryRegistry {
        let mut registry = SummaryRegistry::new();
        registry.merge(
            CanonicalId::from_normalized("m1"),
            DiagnosticRecord::new()
                .with("objective", Scalar::from(3))
                .with("uncorrected_metabolites", vec!["atp_c", "h2o_c"]),
        );
        registry
    }

    #[test]
    fn test_load_missing_starts_fresh() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path().join("summaries"));
        assert!(store.load("v1").unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path().join("summaries"));
        let registry = sample_registry();

        store.save("v1", &registry).unwrap();
        assert!(store.path("v1").exists());
        assert_eq!(store.load("v1").unwrap(), registry);
    }

    #[test]
    fn test_save_overwrites_whole_registry() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        store.save("v1", &sample_registry()).unwrap();
        store.save("v1", &SummaryRegistry::new()).unwrap();
        assert!(store.load("v1").unwrap().is_empty());
    }

    #[test]
    fn test_versions_are_independent() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        store.save("v1", &sample_registry()).unwrap();
        assert!(store.load("v2").unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_checkpoint_fails_loudly() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        fs::write(store.path("v1"), "{ not json").unwrap();
        assert!(matches!(
            store.load("v1"),
            Err(CheckpointError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_version_mismatch_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path());
        store.save("v1", &sample_registry()).unwrap();
        fs::copy(store.path("v1"), store.path("v2")).unwrap();
        assert!(matches!(
            store.load("v2"),
            Err(CheckpointError::VersionMismatch { .. })
        ));
    }
}
