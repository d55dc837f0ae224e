use crate::models::canonical_id::CanonicalId;

/// 报表中一个模型对应的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub canonical_id: CanonicalId,
    /// 值列，长度恒等于所在表的 `width`，缺失处为空字符串
    pub cells: Vec<String>,
}

impl ReportRow {
    /// 含 ID 列的完整行
    pub fn to_record(&self) -> Vec<String> {
        std::iter::once(self.canonical_id.to_string())
            .chain(self.cells.iter().cloned())
            .collect()
    }
}

/// 按模型逐行展开的字段报表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTable {
    pub field: String,
    /// 值列数，等于所有模型中该字段最长的序列
    pub width: usize,
    pub rows: Vec<ReportRow>,
}

impl FieldTable {
    /// 总列数（含 ID 列）
    pub fn column_count(&self) -> usize {
        self.width + 1
    }

    pub fn header(&self) -> Vec<String> {
        let mut header = vec!["canonical_id".to_string()];
        if self.width == 1 {
            header.push(self.field.clone());
        } else {
            header.extend((1..=self.width).map(|i| format!("{}_{}", self.field, i)));
        }
        header
    }

    /// 至少有一个非空单元格的列数（含 ID 列）
    pub fn informative_columns(&self) -> usize {
        if self.rows.is_empty() {
            return 0;
        }
        let informative_values = (0..self.width)
            .filter(|&col| self.rows.iter().any(|row| !row.cells[col].is_empty()))
            .count();
        1 + informative_values
    }

    /// 除 ID 列外是否还有可比较的信息
    pub fn is_informative(&self) -> bool {
        self.informative_columns() > 1
    }
}

/// 异常字段的去重扁平集合
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenedSet {
    pub field: String,
    /// 首次出现顺序，无重复、无空值
    pub values: Vec<String>,
}

/// 单个字段的汇总结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregatedReport {
    Table(FieldTable),
    Flattened(FlattenedSet),
}

impl AggregatedReport {
    pub fn field(&self) -> &str {
        match self {
            AggregatedReport::Table(t) => &t.field,
            AggregatedReport::Flattened(s) => &s.field,
        }
    }

    /// 是否值得写入磁盘
    pub fn should_persist(&self) -> bool {
        match self {
            AggregatedReport::Table(t) => t.is_informative(),
            AggregatedReport::Flattened(s) => !s.values.is_empty(),
        }
    }
}
