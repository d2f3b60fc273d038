use crate::core::record::{DiffEntry, DiffStatus, FileRecord};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, warn};

/// 相对路径的大小写匹配策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathCase {
    /// 区分大小写
    Sensitive,
    /// 不区分大小写
    Insensitive,
}

impl PathCase {
    /// 当前平台的默认策略：Windows 和 macOS 不区分大小写
    pub fn platform_default() -> Self {
        if cfg!(any(target_os = "windows", target_os = "macos")) {
            PathCase::Insensitive
        } else {
            PathCase::Sensitive
        }
    }
}

impl Default for PathCase {
    fn default() -> Self {
        Self::platform_default()
    }
}

/// 比较配置
#[derive(Debug, Clone, Default)]
pub struct CompareConfig {
    pub path_case: PathCase,
}

/// 文件比较器
///
/// 只比较大小和最后修改时间，不读取文件内容。
#[derive(Debug, Clone, Default)]
pub struct FileComparator {
    config: CompareConfig,
}

impl FileComparator {
    pub fn with_config(config: CompareConfig) -> Self {
        Self { config }
    }

    /// 路径匹配用的键
    fn key(&self, relative_path: &str) -> String {
        match self.config.path_case {
            PathCase::Sensitive => relative_path.to_string(),
            PathCase::Insensitive => relative_path.to_lowercase(),
        }
    }

    /// 判断两个同路径的文件是否相同
    pub fn is_identical(source: &FileRecord, target: &FileRecord) -> bool {
        source.size == target.size && source.modified_time == target.modified_time
    }

    /// 按匹配键建立索引，同一列表内键冲突时保留路径序中的第一个
    fn index<'a>(
        &self,
        records: &'a [FileRecord],
        side: TreeSide,
        collisions: &mut Vec<CaseCollision>,
    ) -> BTreeMap<String, &'a FileRecord> {
        let mut sorted: Vec<&FileRecord> = records.iter().collect();
        sorted.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        let mut index = BTreeMap::new();
        for record in sorted {
            match index.entry(self.key(&record.relative_path)) {
                Entry::Vacant(slot) => {
                    slot.insert(record);
                }
                Entry::Occupied(existing) => {
                    let kept: &FileRecord = existing.get();
                    warn!(
                        "{}中的路径仅大小写不同，忽略 {} (保留 {})",
                        side, record.relative_path, kept.relative_path
                    );
                    collisions.push(CaseCollision {
                        side,
                        kept: kept.relative_path.clone(),
                        ignored: record.relative_path.clone(),
                    });
                }
            }
        }
        index
    }

    /// 比较两个文件列表，每个相对路径恰好产生一个条目
    ///
    /// 结果按匹配键排序，与输入顺序无关。
    pub fn compare(&self, source: &[FileRecord], target: &[FileRecord]) -> Vec<DiffEntry> {
        self.compare_with_collisions(source, target).0
    }

    /// 同 [`compare`](Self::compare)，同时返回因大小写冲突被忽略的路径
    pub fn compare_with_collisions(
        &self,
        source: &[FileRecord],
        target: &[FileRecord],
    ) -> (Vec<DiffEntry>, Vec<CaseCollision>) {
        let mut collisions = Vec::new();
        let source = self.index(source, TreeSide::Source, &mut collisions);
        let target = self.index(target, TreeSide::Target, &mut collisions);

        let all_keys: BTreeSet<&String> = source.keys().chain(target.keys()).collect();
        let mut entries = Vec::with_capacity(all_keys.len());

        for key in all_keys {
            let entry = match (source.get(key), target.get(key)) {
                (Some(src), Some(dst)) => {
                    let status = if Self::is_identical(src, dst) {
                        DiffStatus::Identical
                    } else {
                        debug!(
                            "文件已修改: {} (size {} -> {}, mtime {} -> {})",
                            dst.relative_path, src.size, dst.size, src.modified_time, dst.modified_time
                        );
                        DiffStatus::Modified
                    };
                    DiffEntry::from_record(dst, status)
                }
                (Some(src), None) => DiffEntry::from_record(src, DiffStatus::Removed),
                (None, Some(dst)) => DiffEntry::from_record(dst, DiffStatus::Added),
                // 键来自两个索引的并集
                (None, None) => continue,
            };
            entries.push(entry);
        }

        (entries, collisions)
    }

    /// 统计比较结果
    pub fn summarize(entries: &[DiffEntry]) -> DiffSummary {
        let mut summary = DiffSummary::default();

        for entry in entries {
            match entry.status {
                DiffStatus::Identical => summary.identical_count += 1,
                DiffStatus::Modified => summary.modified_count += 1,
                DiffStatus::Added => summary.added_count += 1,
                DiffStatus::Removed => summary.removed_count += 1,
            }
            if entry.status.is_staged() {
                summary.staged_bytes += entry.size;
            }
        }

        summary
    }
}

/// 文件所在的目录树
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeSide {
    Source,
    Target,
}

impl fmt::Display for TreeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeSide::Source => write!(f, "源目录"),
            TreeSide::Target => write!(f, "目标目录"),
        }
    }
}

/// 不区分大小写时，同一目录树内与已有路径冲突而被忽略的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseCollision {
    pub side: TreeSide,
    pub kept: String,
    pub ignored: String,
}

/// 比较结果统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffSummary {
    pub identical_count: usize,
    pub modified_count: usize,
    pub added_count: usize,
    pub removed_count: usize,
    /// 新增和修改文件的总字节数
    pub staged_bytes: u64,
}

impl DiffSummary {
    pub fn total_files(&self) -> usize {
        self.identical_count + self.modified_count + self.added_count + self.removed_count
    }

    pub fn staged_count(&self) -> usize {
        self.modified_count + self.added_count
    }

    pub fn has_differences(&self) -> bool {
        self.modified_count + self.added_count + self.removed_count > 0
    }
}
