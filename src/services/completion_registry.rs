//! 完成登记服务 - 业务能力层
//!
//! 通过扫描已有的精修产物判断哪些模型已经完成，用于断点续跑

use crate::error::OutputError;
use crate::models::CanonicalId;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

/// 精修产物扩展名
pub const REFINED_ARTIFACT_EXT: &str = "xml";
/// 转换产物扩展名
pub const TRANSLATED_ARTIFACT_EXT: &str = "json";

/// 读取输出目录中已完成的规范 ID
///
/// 目录不存在时返回空集合。
pub fn load_completed(output_dir: &Path) -> Result<HashSet<CanonicalId>, OutputError> {
    let scan_failed = |source: std::io::Error| OutputError::ScanFailed {
        path: output_dir.to_path_buf(),
        source,
    };
    let mut completed = HashSet::new();

    let entries = match fs::read_dir(output_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("输出目录尚不存在: {}", output_dir.display());
            return Ok(completed);
        }
        Err(e) => return Err(scan_failed(e)),
    };

    for entry in entries {
        let entry = entry.map_err(scan_failed)?;
        if !entry.file_type().map_err(scan_failed)?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if let Some(id) = artifact_id(&name) {
            completed.insert(id);
        }
    }

    Ok(completed)
}

/// 精修产物的文件名
pub fn refined_artifact_name(id: &CanonicalId) -> String {
    format!("{}.{}", id, REFINED_ARTIFACT_EXT)
}

/// 转换产物的文件名
pub fn translated_artifact_name(id: &CanonicalId) -> String {
    format!("{}.{}", id, TRANSLATED_ARTIFACT_EXT)
}

fn artifact_id(file_name: &str) -> Option<CanonicalId> {
    // 写入中的临时文件
    if file_name.starts_with(".tmp") {
        return None;
    }
    let stem = file_name.strip_suffix(&format!(".{}", REFINED_ARTIFACT_EXT))?;
    if stem.is_empty() {
        return None;
    }
    Some(CanonicalId::from_normalized(stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(load_completed(&dir.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn test_recovers_ids_from_artifacts() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("m1.xml"), "x").unwrap();
        fs::write(dir.path().join("model_v2.xml"), "x").unwrap();
        fs::write(dir.path().join("m3.json"), "x").unwrap();
        fs::write(dir.path().join(".tmpAbc12"), "x").unwrap();
        fs::create_dir(dir.path().join("sub.xml")).unwrap();

        let completed = load_completed(dir.path()).unwrap();
        assert_eq!(completed.len(), 2);
        assert!(completed.contains(&CanonicalId::from_normalized("m1")));
        assert!(completed.contains(&CanonicalId::from_normalized("model_v2")));
    }

    #[test]
    fn test_artifact_names_round_trip_ids() {
        let id = CanonicalId::derive("Yeast GEM.json").unwrap();
        assert_eq!(artifact_id(&refined_artifact_name(&id)), Some(id.clone()));
        assert_eq!(translated_artifact_name(&id), "Yeast_GEM.json");
    }
}
