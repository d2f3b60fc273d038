//! 文件记录与差异条目

use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};

/// 扫描得到的文件记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// 扫描根目录（绝对路径）
    pub root: PathBuf,
    /// 相对于根目录的路径，统一使用 `/` 分隔
    pub relative_path: String,
    pub size: u64,
    /// 最后修改时间（UTC），只用于相等比较
    pub modified_time: DateTime<Utc>,
}

impl FileRecord {
    /// 文件的完整路径
    pub fn full_path(&self) -> PathBuf {
        join_relative(&self.root, &self.relative_path)
    }
}

/// 比较状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffStatus {
    Identical,
    Modified,
    Added,
    Removed,
}

impl DiffStatus {
    /// 是否需要复制到镜像目录
    pub fn is_staged(&self) -> bool {
        matches!(self, DiffStatus::Added | DiffStatus::Modified)
    }
}

impl fmt::Display for DiffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffStatus::Identical => write!(f, "identical"),
            DiffStatus::Modified => write!(f, "modified"),
            DiffStatus::Added => write!(f, "added"),
            DiffStatus::Removed => write!(f, "removed"),
        }
    }
}

/// 差异条目（比较结果，创建后不再修改）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    /// 条目所属的扫描根目录：Removed 为源目录，其余为目标目录
    pub root: PathBuf,
    pub relative_path: String,
    pub size: u64,
    pub modified_time: DateTime<Utc>,
    pub status: DiffStatus,
}

impl DiffEntry {
    pub fn from_record(record: &FileRecord, status: DiffStatus) -> Self {
        Self {
            root: record.root.clone(),
            relative_path: record.relative_path.clone(),
            size: record.size,
            modified_time: record.modified_time,
            status,
        }
    }

    pub fn full_path(&self) -> PathBuf {
        join_relative(&self.root, &self.relative_path)
    }
}

/// 按 `/` 拆分相对路径后逐段拼接到 base 上
pub fn join_relative(base: &Path, relative_path: &str) -> PathBuf {
    relative_path
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(base.to_path_buf(), |path, segment| path.join(segment))
}
