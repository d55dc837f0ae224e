use crate::models::canonical_id::CanonicalId;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::{Path, PathBuf};

/// 支持的模型序列化格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFormat {
    /// SBML（`.xml` / `.sbml`）
    Sbml,
    /// JSON（`.json`）
    Json,
}

impl ModelFormat {
    /// 根据文件名判断格式，不支持的格式返回 `None`
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, ext) = file_name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "xml" | "sbml" => Some(ModelFormat::Sbml),
            "json" => Some(ModelFormat::Json),
            _ => None,
        }
    }

    /// 是否可以转换为二次格式
    pub fn is_translatable(self) -> bool {
        matches!(self, ModelFormat::Sbml)
    }

    pub fn name(self) -> &'static str {
        match self {
            ModelFormat::Sbml => "sbml",
            ModelFormat::Json => "json",
        }
    }
}

impl Display for ModelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 一个待处理的输入模型
///
/// 在扫描时创建，之后不再修改。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputItem {
    /// 原始文件名
    pub raw_name: String,
    /// 文件所在目录
    pub source_dir: PathBuf,
    pub canonical_id: CanonicalId,
    pub format: ModelFormat,
}

impl InputItem {
    /// 原始文件的完整路径
    pub fn path(&self) -> PathBuf {
        self.source_dir.join(&self.raw_name)
    }

    /// 由路径构造输入项，不受支持的文件返回 `None`
    pub fn from_path(path: &Path) -> Option<Self> {
        let raw_name = path.file_name()?.to_string_lossy().into_owned();
        let format = ModelFormat::from_file_name(&raw_name)?;
        let canonical_id = CanonicalId::derive(&raw_name)?;
        let source_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();

        Some(Self {
            raw_name,
            source_dir,
            canonical_id,
            format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(ModelFormat::from_file_name("a.xml"), Some(ModelFormat::Sbml));
        assert_eq!(ModelFormat::from_file_name("a.SBML"), Some(ModelFormat::Sbml));
        assert_eq!(ModelFormat::from_file_name("a.json"), Some(ModelFormat::Json));
        assert_eq!(ModelFormat::from_file_name("a.mat"), None);
        assert_eq!(ModelFormat::from_file_name("README"), None);
    }

    #[test]
    fn test_from_path() {
        let item = InputItem::from_path(Path::new("/data/models/iJO1366.xml")).unwrap();
        assert_eq!(item.raw_name, "iJO1366.xml");
        assert_eq!(item.source_dir, PathBuf::from("/data/models"));
        assert_eq!(item.canonical_id.as_str(), "iJO1366");
        assert_eq!(item.format, ModelFormat::Sbml);
        assert_eq!(item.path(), PathBuf::from("/data/models/iJO1366.xml"));
    }

    #[test]
    fn test_only_sbml_is_translatable() {
        assert!(ModelFormat::Sbml.is_translatable());
        assert!(!ModelFormat::Json.is_translatable());
    }
}
