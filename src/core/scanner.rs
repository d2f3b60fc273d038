use crate::core::record::FileRecord;
use crate::error::ScanError;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

/// 文件扫描器配置
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// 排除的目录名（按名称匹配，任意层级生效）
    pub exclude_dirs: HashSet<String>,
    /// 排除的文件名（精确匹配文件名，不匹配路径）
    pub exclude_files: HashSet<String>,
}

impl ScanConfig {
    pub fn new<D, F>(exclude_dirs: D, exclude_files: F) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self {
            exclude_dirs: exclude_dirs.into_iter().map(Into::into).collect(),
            exclude_files: exclude_files.into_iter().map(Into::into).collect(),
        }
    }
}

/// 文件扫描器
#[derive(Debug, Clone, Default)]
pub struct FileScanner {
    config: ScanConfig,
}

impl FileScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ScanConfig) -> Self {
        Self { config }
    }

    /// 检查目录是否应该被排除（根目录本身不参与排除）
    fn is_excluded_dir(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .is_some_and(|name| self.config.exclude_dirs.contains(name))
    }

    fn is_excluded_file(&self, entry: &DirEntry) -> bool {
        entry
            .file_name()
            .to_str()
            .is_some_and(|name| self.config.exclude_files.contains(name))
    }

    /// 递归扫描目录，返回所有未被排除的文件
    ///
    /// 任何子目录读取失败都会使整个扫描失败，不返回部分结果。
    pub fn scan(&self, root: &Path) -> Result<Vec<FileRecord>, ScanError> {
        let root = fs::canonicalize(root).map_err(|source| ScanError::RootNotFound {
            path: root.to_path_buf(),
            source,
        })?;
        if !root.is_dir() {
            return Err(ScanError::NotADirectory { path: root });
        }

        info!("开始扫描目录: {}", root.display());

        let mut records = Vec::new();
        let mut excluded_dirs = 0usize;
        let mut excluded_files = 0usize;

        let walker = WalkDir::new(&root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if self.is_excluded_dir(entry) {
                    debug!("排除目录: {}", entry.path().display());
                    excluded_dirs += 1;
                    false
                } else {
                    true
                }
            });

        for entry in walker {
            let entry = entry.map_err(|source| ScanError::Unreadable {
                path: source
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.clone()),
                source,
            })?;

            // 只记录普通文件，不跟随符号链接
            if !entry.file_type().is_file() {
                continue;
            }

            if self.is_excluded_file(&entry) {
                debug!("排除文件: {}", entry.path().display());
                excluded_files += 1;
                continue;
            }

            records.push(Self::read_record(&root, &entry)?);
        }

        info!(
            "扫描完成: {}, {} 个文件, 排除 {} 个目录, {} 个文件",
            root.display(),
            records.len(),
            excluded_dirs,
            excluded_files
        );

        Ok(records)
    }

    fn read_record(root: &Path, entry: &DirEntry) -> Result<FileRecord, ScanError> {
        let path = entry.path();
        let metadata = entry.metadata().map_err(|source| ScanError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let modified = metadata.modified().map_err(|source| ScanError::Metadata {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(FileRecord {
            root: root.to_path_buf(),
            relative_path: relative_path(root, path)?,
            size: metadata.len(),
            modified_time: DateTime::<Utc>::from(modified),
        })
    }
}

/// 计算相对路径并统一使用 `/` 分隔
pub fn relative_path(root: &Path, path: &Path) -> Result<String, ScanError> {
    let relative = path
        .strip_prefix(root)
        .map_err(|_| ScanError::OutsideRoot {
            path: path.to_path_buf(),
        })?;

    let mut segments = Vec::new();
    for component in relative.components() {
        if let Component::Normal(segment) = component {
            let segment = segment.to_str().ok_or_else(|| ScanError::NonUtf8Path {
                path: path.to_path_buf(),
            })?;
            segments.push(segment);
        }
    }

    Ok(segments.join("/"))
}
