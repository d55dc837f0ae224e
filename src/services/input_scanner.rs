//! 输入扫描服务 - 业务能力层
//!
//! 只负责"找出要处理的模型"能力：递归扫描、格式过滤、按规范 ID 去重

use crate::error::InputDiscoveryError;
use crate::models::InputItem;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// 操作系统生成的元数据文件
const OS_METADATA_FILES: [&str; 3] = [".DS_Store", "Thumbs.db", "desktop.ini"];
/// 不进入的目录
const IGNORED_DIRS: [&str; 2] = [".git", ".svn"];

/// 扫描源目录，返回去重后的输入项
///
/// 遍历按文件名排序，因此同一目录树总是得到同一顺序；
/// 规范 ID 冲突（忽略大小写）时保留最先出现的文件。
pub fn scan(source_dir: &Path) -> Result<Vec<InputItem>, InputDiscoveryError> {
    if !source_dir.exists() {
        return Err(InputDiscoveryError::DirectoryNotFound {
            path: source_dir.to_path_buf(),
        });
    }
    if !source_dir.is_dir() {
        return Err(InputDiscoveryError::NotADirectory {
            path: source_dir.to_path_buf(),
        });
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut items = Vec::new();

    let walker = WalkDir::new(source_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_ignored_dir(e));

    for entry in walker {
        let entry = entry.map_err(|source| InputDiscoveryError::WalkFailed {
            path: source_dir.to_path_buf(),
            source,
        })?;

        if !entry.file_type().is_file() || is_os_metadata(&entry) {
            continue;
        }

        let Some(item) = InputItem::from_path(entry.path()) else {
            if crate::models::ModelFormat::from_file_name(&entry.file_name().to_string_lossy())
                .is_some()
            {
                warn!("⚠️ 无法从文件名推导规范ID，已跳过: {}", entry.path().display());
            }
            continue;
        };

        if seen.insert(item.canonical_id.dedup_key()) {
            items.push(item);
        } else {
            debug!(
                "重复的规范ID {}，忽略: {}",
                item.canonical_id,
                entry.path().display()
            );
        }
    }

    Ok(items)
}

fn is_ignored_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && IGNORED_DIRS
            .iter()
            .any(|d| entry.file_name().to_string_lossy() == *d)
}

fn is_os_metadata(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with("._") || OS_METADATA_FILES.iter().any(|m| name == *m)
}
