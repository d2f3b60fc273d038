//! 将新增和修改的文件复制到镜像目录

use crate::core::record::{join_relative, DiffEntry};
use crate::error::CopyError;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// 复制结果
#[derive(Debug, Clone, Default)]
pub struct StageReport {
    /// 镜像目录
    pub destination_root: PathBuf,
    /// 已复制文件的相对路径
    pub staged: Vec<String>,
    pub bytes_copied: u64,
}

impl StageReport {
    pub fn count(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }
}

/// 镜像目录复制器
#[derive(Debug, Clone)]
pub struct Stager {
    destination_root: PathBuf,
}

impl Stager {
    pub fn new(destination_root: impl Into<PathBuf>) -> Self {
        Self {
            destination_root: destination_root.into(),
        }
    }

    /// 复制所有新增和修改的文件，遇到第一个错误立即中止
    ///
    /// 已存在的目标文件会被覆盖。中止后镜像目录处于不完整状态，调用方不应再使用它。
    pub fn stage(&self, entries: &[DiffEntry]) -> Result<StageReport, CopyError> {
        let mut report = StageReport {
            destination_root: self.destination_root.clone(),
            ..Default::default()
        };

        for entry in entries.iter().filter(|e| e.status.is_staged()) {
            let source = entry.full_path();
            let destination = self.destination_for(&entry.relative_path)?;

            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent).map_err(|source| CopyError::CreateDirectory {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }

            debug!("复制: {} -> {}", source.display(), destination.display());

            let bytes = fs::copy(&source, &destination).map_err(|err| CopyError::CopyFile {
                from: source.clone(),
                to: destination.clone(),
                source: err,
            })?;

            report.bytes_copied += bytes;
            report.staged.push(entry.relative_path.clone());
        }

        info!(
            "复制完成: {} 个文件, {} 字节 -> {}",
            report.count(),
            report.bytes_copied,
            self.destination_root.display()
        );

        Ok(report)
    }

    /// 确认镜像目录不存在或为空
    ///
    /// 镜像目录打包后会被整个删除，不能混入不属于本次运行的文件。
    pub fn ensure_destination_unused(&self) -> Result<(), CopyError> {
        let in_use = self.destination_root.is_dir()
            && fs::read_dir(&self.destination_root)
                .map(|mut dir| dir.next().is_some())
                .unwrap_or(true);
        if in_use {
            return Err(CopyError::MirrorNotEmpty {
                path: self.destination_root.clone(),
            });
        }
        Ok(())
    }

    /// 计算目标路径，拒绝任何可能越出镜像目录的相对路径
    fn destination_for(&self, relative_path: &str) -> Result<PathBuf, CopyError> {
        let invalid = || CopyError::InvalidPath {
            path: relative_path.to_string(),
        };

        if relative_path.is_empty() {
            return Err(invalid());
        }
        for segment in relative_path.split('/') {
            let mut components = Path::new(segment).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(_)), None) => {}
                _ => return Err(invalid()),
            }
        }

        Ok(join_relative(&self.destination_root, relative_path))
    }
}
