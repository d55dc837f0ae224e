//! 清单写入服务 - 业务能力层
//!
//! 未提供模型信息文件时，为本次扫描到的所有模型生成一份清单

use crate::error::OutputError;
use crate::models::InputItem;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// 清单写入服务
///
/// 每个规范 ID 一行：`canonical_id,raw_name,source_path,format`
pub struct ManifestWriter {
    manifest_path: PathBuf,
}

impl ManifestWriter {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            manifest_path: path.into(),
        }
    }

    /// 写入清单，整体覆盖旧文件
    pub fn write(&self, items: &[InputItem]) -> Result<&Path, OutputError> {
        let path = self.manifest_path.as_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| OutputError::write_failed(parent, e))?;
        }

        let csv_failed = |e: csv::Error| OutputError::csv_failed(path, e);
        let mut writer = csv::Writer::from_path(path).map_err(csv_failed)?;
        writer
            .write_record(["canonical_id", "raw_name", "source_path", "format"])
            .map_err(csv_failed)?;

        for item in items {
            let source_path = item.path().to_string_lossy().into_owned();
            writer
                .write_record([
                    item.canonical_id.as_str(),
                    item.raw_name.as_str(),
                    source_path.as_str(),
                    item.format.name(),
                ])
                .map_err(csv_failed)?;
        }
        writer.flush().map_err(|e| OutputError::write_failed(path, e))?;

        info!("📝 已生成模型清单: {} ({} 个模型)", path.display(), items.len());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_manifest_has_one_row_per_item() {
        let dir = TempDir::new().unwrap();
        let items: Vec<InputItem> = ["src/iML1515.xml", "src/sub/e_coli_core.json"]
            .iter()
            .filter_map(|p| InputItem::from_path(Path::new(p)))
            .collect();

        let writer = ManifestWriter::with_path(dir.path().join("summaries/item_info.csv"));
        let path = writer.write(&items).unwrap();

        let content = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "canonical_id,raw_name,source_path,format");
        assert_eq!(lines[1], "iML1515,iML1515.xml,src/iML1515.xml,sbml");
        assert_eq!(lines[2], "e_coli_core,e_coli_core.json,src/sub/e_coli_core.json,json");
    }
}
