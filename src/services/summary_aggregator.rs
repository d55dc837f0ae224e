//! 诊断汇总服务 - 业务能力层
//!
//! 把注册表里所有模型的诊断记录按字段合并成报表。
//! 字段集合在汇总时才确定；每次运行都从完整注册表重新计算。

use crate::models::{
    AggregatedReport, DiagnosticValue, FieldTable, FlattenedSet, ReportRow, SummaryRegistry,
};
use std::collections::{BTreeMap, HashSet};

/// 诊断汇总器
#[derive(Debug, Clone)]
pub struct SummaryAggregator {
    /// 按扁平集合汇总的异常字段
    anomaly_fields: HashSet<String>,
}

impl SummaryAggregator {
    pub fn new<I, S>(anomaly_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            anomaly_fields: anomaly_fields.into_iter().map(Into::into).collect(),
        }
    }

    /// 汇总全部字段
    pub fn aggregate(&self, registry: &SummaryRegistry) -> BTreeMap<String, AggregatedReport> {
        registry
            .field_names()
            .into_iter()
            .map(|field| {
                let report = if self.anomaly_fields.contains(field) {
                    AggregatedReport::Flattened(flatten_field(registry, field))
                } else {
                    AggregatedReport::Table(tabulate_field(registry, field))
                };
                (field.to_string(), report)
            })
            .collect()
    }
}

/// 第一列为 ID，其后按最长序列展开
fn tabulate_field(registry: &SummaryRegistry, field: &str) -> FieldTable {
    let width = registry
        .iter()
        .filter_map(|(_, record)| record.get(field))
        .map(DiagnosticValue::width)
        .max()
        .unwrap_or(0);

    let rows = registry
        .iter()
        .map(|(id, record)| {
            let mut cells: Vec<String> = record
                .get(field)
                .map(|v| v.scalars().iter().map(ToString::to_string).collect())
                .unwrap_or_default();
            cells.resize(width, String::new());
            ReportRow {
                canonical_id: id.clone(),
                cells,
            }
        })
        .collect();

    FieldTable {
        field: field.to_string(),
        width,
        rows,
    }
}

fn flatten_field(registry: &SummaryRegistry, field: &str) -> FlattenedSet {
    let mut seen = HashSet::new();
    let values = registry
        .iter()
        .filter_map(|(_, record)| record.get(field))
        .flat_map(DiagnosticValue::scalars)
        .map(ToString::to_string)
        .filter(|v| !v.trim().is_empty())
        .filter(|v| seen.insert(v.clone()))
        .collect();

    FlattenedSet {
        field: field.to_string(),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CanonicalId, DiagnosticRecord, Scalar};

    fn registry(entries: Vec<(&str, DiagnosticRecord)>) -> SummaryRegistry {
        let mut registry = SummaryRegistry::new();
        for (id, record) in entries {
            registry.merge(CanonicalId::from_normalized(id), record);
        }
        registry
    }

    fn table(report: &AggregatedReport) -> &FieldTable {
        match report {
            AggregatedReport::Table(t) => t,
            other => panic!("期望表格报表，实际: {:?}", other),
        }
    }

    #[test]
    fn test_scalar_and_sequence_spread_across_columns() {
        let registry = registry(vec![
            ("id1", DiagnosticRecord::new().with("x", Scalar::from(5))),
            ("id2", DiagnosticRecord::new().with("x", vec![1i64, 2])),
        ]);
        let reports = SummaryAggregator::new(Vec::<String>::new()).aggregate(&registry);
        let x = table(&reports["x"]);

        assert_eq!(x.column_count(), 3);
        assert_eq!(x.rows[0].to_record(), vec!["id1", "5", ""]);
        assert_eq!(x.rows[1].to_record(), vec!["id2", "1", "2"]);
        assert_eq!(x.header(), vec!["canonical_id", "x_1", "x_2"]);
    }

    #[test]
    fn test_absent_field_gives_empty_cells() {
        let registry = registry(vec![
            ("a", DiagnosticRecord::new().with("x", Scalar::from("ok"))),
            ("b", DiagnosticRecord::new().with("y", Scalar::from(1))),
        ]);
        let reports = SummaryAggregator::new(Vec::<String>::new()).aggregate(&registry);

        assert_eq!(reports.len(), 2);
        let x = table(&reports["x"]);
        assert_eq!(x.header(), vec!["canonical_id", "x"]);
        assert_eq!(x.rows[1].to_record(), vec!["b", ""]);
    }

    #[test]
    fn test_anomaly_fields_are_flattened_and_deduplicated() {
        let registry = registry(vec![
            ("id1", DiagnosticRecord::new().with("uncorrected_metabolites", vec!["a", "b"])),
            ("id2", DiagnosticRecord::new().with("uncorrected_metabolites", vec!["b", "c", ""])),
            ("id3", DiagnosticRecord::new().with("other", Scalar::from(1))),
        ]);
        let reports = SummaryAggregator::new(["uncorrected_metabolites"]).aggregate(&registry);

        match &reports["uncorrected_metabolites"] {
            AggregatedReport::Flattened(set) => {
                let values: HashSet<&str> = set.values.iter().map(String::as_str).collect();
                assert_eq!(values, HashSet::from(["a", "b", "c"]));
                assert_eq!(set.values.len(), 3);
            }
            other => panic!("期望扁平集合，实际: {:?}", other),
        }
    }

    #[test]
    fn test_degenerate_table_is_not_persisted() {
        let registry = registry(vec![
            ("a", DiagnosticRecord::new().with("empty", Vec::<String>::new())),
            ("b", DiagnosticRecord::new().with("blank", Scalar::from(""))),
            ("c", DiagnosticRecord::new().with("kept", Scalar::from(1))),
        ]);
        let reports = SummaryAggregator::new(Vec::<String>::new()).aggregate(&registry);

        assert!(!reports["empty"].should_persist());
        assert!(!reports["blank"].should_persist());
        assert!(reports["kept"].should_persist());
        assert_eq!(table(&reports["empty"]).informative_columns(), 1);
    }

    #[test]
    fn test_empty_anomaly_set_is_not_persisted() {
        let registry = registry(vec![(
            "a",
            DiagnosticRecord::new().with("uncorrected_reactions", Vec::<String>::new()),
        )]);
        let reports = SummaryAggregator::new(["uncorrected_reactions"]).aggregate(&registry);
        assert!(!reports["uncorrected_reactions"].should_persist());
    }

    #[test]
    fn test_empty_registry_has_no_reports() {
        let reports = SummaryAggregator::new(["x"]).aggregate(&SummaryRegistry::new());
        assert!(reports.is_empty());
    }
}
