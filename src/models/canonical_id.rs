//! 规范 ID 推导
//!
//! 把原始文件名映射为稳定的规范 ID。去重和断点续跑都以此为键，
//! 因此同一输入在任何一次运行中都必须得到同一结果。

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

/// 可被剥离的模型扩展名（小写）
const MODEL_EXTENSIONS: [&str; 3] = ["xml", "sbml", "json"];

static INVALID_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z0-9_-]+").expect("静态正则表达式合法")
});

/// 规范 ID
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalId(String);

impl CanonicalId {
    /// 由原始文件名推导规范 ID
    ///
    /// 规则：
    /// 1. 只取路径最后一段
    /// 2. 去掉一个模型扩展名（不区分大小写）
    /// 3. 去掉首尾空白
    /// 4. 非 `[A-Za-z0-9_-]` 的连续字符替换为单个 `_`，再去掉首尾 `_`
    ///
    /// 大小写保持不变。结果为空时返回 `None`。
    pub fn derive(raw_name: &str) -> Option<Self> {
        let file_name = Path::new(raw_name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| raw_name.to_string());

        let stem = strip_model_extension(&file_name).trim();
        let normalized = INVALID_RUN.replace_all(stem, "_");
        let normalized = normalized.trim_matches('_');

        if normalized.is_empty() {
            None
        } else {
            Some(Self(normalized.to_string()))
        }
    }

    /// 从已经规范化的字符串构造（例如从产物文件名恢复）
    pub fn from_normalized(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 去重与完成判断使用的键
    ///
    /// 产物按 ID 命名，而大小写不敏感的文件系统会把只有大小写不同的两个
    /// 文件名视为同一个文件，因此比较时忽略大小写；ID 本身保留原样用于展示和命名。
    pub fn dedup_key(&self) -> String {
        self.0.to_lowercase()
    }
}

impl Display for CanonicalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn strip_model_extension(file_name: &str) -> &str {
    if let Some((stem, ext)) = file_name.rsplit_once('.') {
        let ext = ext.to_ascii_lowercase();
        if MODEL_EXTENSIONS.contains(&ext.as_str()) {
            return stem;
        }
    }
    file_name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(raw: &str) -> String {
        CanonicalId::derive(raw).map(|c| c.to_string()).unwrap_or_default()
    }

    #[test]
    fn test_strips_supported_extensions() {
        assert_eq!(id("iML1515.xml"), "iML1515");
        assert_eq!(id("iML1515.JSON"), "iML1515");
        assert_eq!(id("e_coli_core.sbml"), "e_coli_core");
    }

    #[test]
    fn test_only_last_extension_is_stripped() {
        assert_eq!(id("model.v2.xml"), "model_v2");
        assert_eq!(id("archive.xml.gz"), "archive_xml_gz");
    }

    #[test]
    fn test_uses_final_path_component() {
        assert_eq!(id("nested/dir/Recon3D.xml"), "Recon3D");
    }

    #[test]
    fn test_normalizes_separators() {
        assert_eq!(id("  Yeast  GEM (v8).xml"), "Yeast_GEM_v8");
        assert_eq!(id("--strain-A--.json"), "--strain-A--");
        assert_eq!(id("a..b.json"), "a_b");
    }

    #[test]
    fn test_same_input_same_output() {
        let a = CanonicalId::derive("Some Model.xml");
        let b = CanonicalId::derive("Some Model.xml");
        assert_eq!(a, b);
        assert_eq!(CanonicalId::derive("Some Model.xml"), CanonicalId::derive("Some_Model.json"));
    }

    #[test]
    fn test_dedup_key_ignores_case() {
        let a = CanonicalId::derive("iJO1366.xml").unwrap();
        let b = CanonicalId::derive("ijo1366.json").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.dedup_key(), b.dedup_key());
        assert_eq!(a.as_str(), "iJO1366");
    }

    #[test]
    fn test_empty_result_is_rejected() {
        assert!(CanonicalId::derive(".xml").is_none());
        assert!(CanonicalId::derive("   .json").is_none());
        assert!(CanonicalId::derive("###.xml").is_none());
    }
}
