//! 报表写入服务 - 业务能力层
//!
//! 只负责把汇总结果写成 CSV，不关心汇总如何得到

use crate::error::{AggregationError, AppResult, OutputError};
use crate::models::AggregatedReport;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 报表写入服务
pub struct ReportWriter {
    output_dir: PathBuf,
    /// 同目录下不得被报表覆盖的文件
    reserved: Vec<PathBuf>,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            reserved: Vec::new(),
        }
    }

    /// 登记一个不得被报表覆盖的文件
    pub fn reserve(&mut self, path: impl Into<PathBuf>) {
        self.reserved.push(path.into());
    }

    /// 字段对应的报表路径
    pub fn report_path(&self, field: &str) -> Result<PathBuf, AggregationError> {
        validate_field_name(field)?;
        let path = self.output_dir.join(format!("{}.csv", field));
        // 大小写不敏感的文件系统上只差大小写的文件名也会冲突
        let key = path.to_string_lossy().to_lowercase();
        if let Some(reserved) = self
            .reserved
            .iter()
            .find(|r| r.to_string_lossy().to_lowercase() == key)
        {
            return Err(AggregationError::ReservedFieldName {
                field: field.to_string(),
                path: reserved.clone(),
            });
        }
        Ok(path)
    }

    /// 写入所有有信息量的报表
    ///
    /// 没有信息量的字段若留有旧报表则删除，使目录内容与本次汇总一致。
    /// 字段名无法用作文件名时记录警告并跳过。
    ///
    /// # 返回
    /// 实际写入的报表路径
    pub fn write_all(&self, reports: &BTreeMap<String, AggregatedReport>) -> AppResult<Vec<PathBuf>> {
        fs::create_dir_all(&self.output_dir)
            .map_err(|e| OutputError::write_failed(&self.output_dir, e))?;

        let mut written = Vec::new();
        for (field, report) in reports {
            let path = match self.report_path(field) {
                Ok(path) => path,
                Err(e) => {
                    warn!("⚠️ 跳过字段报表: {}", e);
                    continue;
                }
            };
            if !report.should_persist() {
                debug!("字段 {} 没有可比较的信息，跳过", field);
                remove_stale(&path)?;
                continue;
            }
            write_report(&path, report)?;
            written.push(path);
        }

        info!(
            "📊 已写入 {} 份汇总报表（共 {} 个字段）",
            written.len(),
            reports.len()
        );
        Ok(written)
    }
}

fn remove_stale(path: &Path) -> Result<(), OutputError> {
    match fs::remove_file(path) {
        Ok(()) => {
            info!("🗑️ 已删除过期报表: {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(OutputError::write_failed(path, e)),
    }
}

fn write_report(path: &Path, report: &AggregatedReport) -> Result<(), OutputError> {
    let csv_failed = |e: csv::Error| OutputError::csv_failed(path, e);
    let mut writer = csv::Writer::from_path(path).map_err(csv_failed)?;

    match report {
        AggregatedReport::Table(table) => {
            writer.write_record(table.header()).map_err(csv_failed)?;
            for row in &table.rows {
                writer.write_record(row.to_record()).map_err(csv_failed)?;
            }
        }
        AggregatedReport::Flattened(set) => {
            writer.write_record([set.field.as_str()]).map_err(csv_failed)?;
            for value in &set.values {
                writer.write_record([value.as_str()]).map_err(csv_failed)?;
            }
        }
    }

    writer
        .flush()
        .map_err(|e| OutputError::write_failed(path, e))
}

fn validate_field_name(field: &str) -> Result<(), AggregationError> {
    let invalid = field.trim().is_empty()
        || field.contains(['/', '\\'])
        || field == "."
        || field == "..";
    if invalid {
        return Err(AggregationError::InvalidFieldName {
            field: field.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CanonicalId, FieldTable, FlattenedSet, ReportRow};
    use tempfile::TempDir;

    fn sample_reports() -> BTreeMap<String, AggregatedReport> {
        let mut reports = BTreeMap::new();
        reports.insert(
            "x".to_string(),
            AggregatedReport::Table(FieldTable {
                field: "x".to_string(),
                width: 2,
                rows: vec![
                    ReportRow {
                        canonical_id: CanonicalId::from_normalized("id1"),
                        cells: vec!["5".to_string(), String::new()],
                    },
                    ReportRow {
                        canonical_id: CanonicalId::from_normalized("id2"),
                        cells: vec!["1".to_string(), "2".to_string()],
                    },
                ],
            }),
        );
        reports.insert(
            "blank".to_string(),
            AggregatedReport::Table(FieldTable {
                field: "blank".to_string(),
                width: 1,
                rows: vec![ReportRow {
                    canonical_id: CanonicalId::from_normalized("id1"),
                    cells: vec![String::new()],
                }],
            }),
        );
        reports.insert(
            "uncorrected_metabolites".to_string(),
            AggregatedReport::Flattened(FlattenedSet {
                field: "uncorrected_metabolites".to_string(),
                values: vec!["a".to_string(), "b, c".to_string()],
            }),
        );
        reports
    }

    #[test]
    fn test_write_all_skips_degenerate_fields() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path().join("summaries"));

        let written = writer.write_all(&sample_reports()).unwrap();
        assert_eq!(written.len(), 2);
        assert!(!dir.path().join("summaries/blank.csv").exists());

        let x = fs::read_to_string(dir.path().join("summaries/x.csv")).unwrap();
        assert_eq!(x, "canonical_id,x_1,x_2\nid1,5,\nid2,1,2\n");

        let set = fs::read_to_string(dir.path().join("summaries/uncorrected_metabolites.csv"))
            .unwrap();
        assert_eq!(set, "uncorrected_metabolites\na\n\"b, c\"\n");
    }

    #[test]
    fn test_stale_report_removed_when_field_becomes_degenerate() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path());

        writer.write_all(&sample_reports()).unwrap();
        assert!(dir.path().join("x.csv").exists());

        let mut reports = sample_reports();
        reports.insert(
            "x".to_string(),
            AggregatedReport::Table(FieldTable {
                field: "x".to_string(),
                width: 1,
                rows: vec![ReportRow {
                    canonical_id: CanonicalId::from_normalized("id1"),
                    cells: vec![String::new()],
                }],
            }),
        );
        let written = writer.write_all(&reports).unwrap();
        assert_eq!(written.len(), 1);
        assert!(!dir.path().join("x.csv").exists());
    }

    #[test]
    fn test_reserved_file_is_never_overwritten() {
        let dir = TempDir::new().unwrap();
        let manifest = dir.path().join("item_info.csv");
        fs::write(&manifest, "canonical_id,raw_name,source_path,format\n").unwrap();

        let mut writer = ReportWriter::new(dir.path());
        writer.reserve(&manifest);
        assert!(matches!(
            writer.report_path("item_info"),
            Err(AggregationError::ReservedFieldName { .. })
        ));
        assert!(writer.report_path("Item_Info").is_err());

        let mut reports = sample_reports();
        if let Some(AggregatedReport::Table(table)) = reports.remove("x") {
            reports.insert(
                "item_info".to_string(),
                AggregatedReport::Table(FieldTable {
                    field: "item_info".to_string(),
                    ..table
                }),
            );
        }
        let written = writer.write_all(&reports).unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(
            fs::read_to_string(&manifest).unwrap(),
            "canonical_id,raw_name,source_path,format\n"
        );
    }

    #[test]
    fn test_rejects_path_like_field_names() {
        let writer = ReportWriter::new("/tmp/unused");
        assert!(writer.report_path("../escape").is_err());
        assert!(writer.report_path("  ").is_err());
        assert!(writer.report_path("growth_rate").is_ok());
    }
}
