//! 诊断记录数据模型
//!
//! 精修器为每个模型返回一份自由结构的诊断记录：字段名 → 标量或标量序列。
//! 字段集合因模型而异，只在汇总时才被发现。

use crate::error::AggregationError;
use crate::models::canonical_id::CanonicalId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::btree_map;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;

/// 标量诊断值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    /// 是否为空值（空字符串）
    pub fn is_empty(&self) -> bool {
        matches!(self, Scalar::Text(s) if s.is_empty())
    }
}

impl Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Number(value.into())
    }
}

/// 诊断字段值：标量或有序标量序列
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DiagnosticValue {
    Scalar(Scalar),
    Sequence(Vec<Scalar>),
}

impl DiagnosticValue {
    /// 在报表中占用的列数
    pub fn width(&self) -> usize {
        match self {
            DiagnosticValue::Scalar(_) => 1,
            DiagnosticValue::Sequence(values) => values.len(),
        }
    }

    /// 按列展开的标量
    pub fn scalars(&self) -> &[Scalar] {
        match self {
            DiagnosticValue::Scalar(s) => std::slice::from_ref(s),
            DiagnosticValue::Sequence(values) => values,
        }
    }

    /// 从 JSON 值解析，`null` 视为字段缺失
    pub fn from_json(field: &str, value: Value) -> Result<Option<Self>, AggregationError> {
        match value {
            Value::Null => Ok(None),
            Value::Array(items) => {
                let scalars = items
                    .into_iter()
                    .map(|item| match item {
                        Value::Null => Ok(Scalar::Text(String::new())),
                        other => scalar_from_json(field, other),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Some(DiagnosticValue::Sequence(scalars)))
            }
            other => scalar_from_json(field, other).map(|s| Some(DiagnosticValue::Scalar(s))),
        }
    }
}

impl From<Scalar> for DiagnosticValue {
    fn from(value: Scalar) -> Self {
        DiagnosticValue::Scalar(value)
    }
}

impl<T: Into<Scalar>> From<Vec<T>> for DiagnosticValue {
    fn from(values: Vec<T>) -> Self {
        DiagnosticValue::Sequence(values.into_iter().map(Into::into).collect())
    }
}

fn scalar_from_json(field: &str, value: Value) -> Result<Scalar, AggregationError> {
    let shape = match value {
        Value::Number(n) => return Ok(Scalar::Number(n)),
        Value::String(s) => return Ok(Scalar::Text(s)),
        Value::Bool(_) => "布尔值",
        Value::Array(_) => "嵌套序列",
        Value::Object(_) => "对象",
        Value::Null => "空值",
    };
    Err(AggregationError::UnsupportedShape {
        field: field.to_string(),
        shape,
    })
}

/// 单个模型的诊断记录
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiagnosticRecord(BTreeMap<String, DiagnosticValue>);

impl DiagnosticRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 对象解析诊断记录
    pub fn from_json(value: Value) -> Result<Self, AggregationError> {
        let Value::Object(map) = value else {
            return Err(AggregationError::UnsupportedShape {
                field: "<record>".to_string(),
                shape: "非对象",
            });
        };

        let mut record = Self::new();
        for (field, value) in map {
            if let Some(v) = DiagnosticValue::from_json(&field, value)? {
                record.0.insert(field, v);
            }
        }
        Ok(record)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<DiagnosticValue>) {
        self.0.insert(field.into(), value.into());
    }

    /// 链式插入，便于构造测试数据
    pub fn with(mut self, field: impl Into<String>, value: impl Into<DiagnosticValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn get(&self, field: &str) -> Option<&DiagnosticValue> {
        self.0.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// 全局诊断注册表：规范 ID → 诊断记录
///
/// 跨运行只增不减，每个检查点整体持久化。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SummaryRegistry(BTreeMap<CanonicalId, DiagnosticRecord>);

impl SummaryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 合并一条记录，同一 ID 直接覆盖
    pub fn merge(&mut self, id: CanonicalId, record: DiagnosticRecord) {
        self.0.insert(id, record);
    }

    pub fn get(&self, id: &CanonicalId) -> Option<&DiagnosticRecord> {
        self.0.get(id)
    }

    pub fn contains(&self, id: &CanonicalId) -> bool {
        self.0.contains_key(id)
    }

    /// 按 ID 排序遍历
    pub fn iter(&self) -> btree_map::Iter<'_, CanonicalId, DiagnosticRecord> {
        self.0.iter()
    }

    /// 所有记录中出现过的字段名并集
    pub fn field_names(&self) -> BTreeSet<&str> {
        self.0.values().flat_map(DiagnosticRecord::fields).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
