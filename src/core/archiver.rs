//! 将镜像目录打包为 zip

use crate::error::ArchiveError;
use chrono::Local;
use scopeguard::ScopeGuard;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// 压缩包扩展名
pub const ARCHIVE_EXTENSION: &str = "zip";

/// 超过该大小的文件需要 zip64
const ZIP64_THRESHOLD: u64 = u32::MAX as u64;

/// 待打包的条目
struct ArchiveItem {
    path: PathBuf,
    name: String,
    is_dir: bool,
    size: u64,
}

/// 打包器
#[derive(Debug, Clone)]
pub struct Archiver {
    compression: CompressionMethod,
}

impl Default for Archiver {
    fn default() -> Self {
        Self {
            compression: CompressionMethod::Deflated,
        }
    }
}

impl Archiver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 压缩包路径：与源目录同级，`<archive_name>.zip`
    pub fn archive_path(source_dir: &Path, archive_name: &str) -> Result<PathBuf, ArchiveError> {
        let parent = source_dir
            .parent()
            .ok_or_else(|| ArchiveError::NoParentDirectory {
                path: source_dir.to_path_buf(),
            })?;
        Ok(parent.join(format!("{}.{}", archive_name, ARCHIVE_EXTENSION)))
    }

    /// 打包整个目录，返回压缩包路径
    ///
    /// 失败时删除写了一半的压缩包，源目录保持不变。
    pub fn archive(&self, source_dir: &Path, archive_name: &str) -> Result<PathBuf, ArchiveError> {
        if !source_dir.is_dir() {
            return Err(ArchiveError::SourceNotFound {
                path: source_dir.to_path_buf(),
            });
        }

        let items = Self::collect_items(source_dir)?;
        if !items.iter().any(|item| !item.is_dir) {
            return Err(ArchiveError::EmptySource {
                path: source_dir.to_path_buf(),
            });
        }

        let archive_path = Self::archive_path(source_dir, archive_name)?;
        info!(
            "开始打包: {} -> {} ({} 个条目)",
            source_dir.display(),
            archive_path.display(),
            items.len()
        );

        let io_err = |source: io::Error| ArchiveError::Io {
            path: archive_path.clone(),
            source,
        };
        let zip_err = |source: zip::result::ZipError| ArchiveError::Zip {
            path: archive_path.clone(),
            source,
        };

        let file = File::create(&archive_path).map_err(io_err)?;
        // 写入失败时删除不完整的压缩包
        let cleanup = scopeguard::guard(archive_path.clone(), |path| {
            if let Err(e) = fs::remove_file(&path) {
                warn!("删除不完整的压缩包失败: {} - {}", path.display(), e);
            }
        });

        let mut zip = ZipWriter::new(BufWriter::new(file));
        for item in &items {
            let options = SimpleFileOptions::default()
                .compression_method(self.compression)
                .large_file(item.size >= ZIP64_THRESHOLD);

            if item.is_dir {
                zip.add_directory(item.name.as_str(), options).map_err(zip_err)?;
                continue;
            }

            debug!("添加到压缩包: {}", item.name);
            zip.start_file(item.name.as_str(), options).map_err(zip_err)?;
            let mut input = File::open(&item.path).map_err(|source| ArchiveError::Io {
                path: item.path.clone(),
                source,
            })?;
            io::copy(&mut input, &mut zip).map_err(io_err)?;
        }

        zip.set_comment(format!(
            "This archive was created at {}",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ));
        let mut writer = zip.finish().map_err(zip_err)?;
        io::Write::flush(&mut writer).map_err(io_err)?;
        drop(writer);

        let archive_path = ScopeGuard::into_inner(cleanup);
        info!("压缩包已创建: {}", archive_path.display());
        Ok(archive_path)
    }

    /// 删除已打包的源目录
    pub fn remove_source(source_dir: &Path) -> Result<(), ArchiveError> {
        fs::remove_dir_all(source_dir).map_err(|source| ArchiveError::Cleanup {
            path: source_dir.to_path_buf(),
            source,
        })?;
        info!("已删除临时目录: {}", source_dir.display());
        Ok(())
    }

    /// 收集目录下所有条目，名称为 `/` 分隔的相对路径
    fn collect_items(source_dir: &Path) -> Result<Vec<ArchiveItem>, ArchiveError> {
        let mut items = Vec::new();

        for entry in WalkDir::new(source_dir)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|source| ArchiveError::Walk {
                path: source_dir.to_path_buf(),
                source,
            })?;

            let file_type = entry.file_type();
            if !file_type.is_dir() && !file_type.is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(source_dir)
                .unwrap_or(entry.path());
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            let size = if file_type.is_file() {
                entry
                    .metadata()
                    .map_err(|source| ArchiveError::Walk {
                        path: entry.path().to_path_buf(),
                        source,
                    })?
                    .len()
            } else {
                0
            };

            items.push(ArchiveItem {
                path: entry.path().to_path_buf(),
                name,
                is_dir: file_type.is_dir(),
                size,
            });
        }

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;
    use zip::ZipArchive;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_archive_preserves_relative_paths() {
        let parent = tempdir().unwrap();
        let mirror = parent.path().join("Diff");
        write(&mirror, "top.txt", "top");
        write(&mirror, "sub/dir/file.txt", "nested");

        let archive_path = Archiver::new().archive(&mirror, "Diff").unwrap();

        assert_eq!(archive_path, parent.path().join("Diff.zip"));
        let mut archive = ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
        let mut content = String::new();
        archive
            .by_name("sub/dir/file.txt")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "nested");
        assert!(archive.by_name("top.txt").is_ok());
        let files = archive.file_names().filter(|n| !n.ends_with('/')).count();
        assert_eq!(files, 2);
        let comment = String::from_utf8_lossy(archive.comment()).to_string();
        assert!(comment.starts_with("This archive was created at "));
        assert!(mirror.is_dir());
    }

    #[test]
    fn test_archive_of_empty_dir_fails() {
        let parent = tempdir().unwrap();
        let mirror = parent.path().join("Diff");
        fs::create_dir_all(mirror.join("only").join("dirs")).unwrap();

        let err = Archiver::new().archive(&mirror, "Diff").unwrap_err();

        assert!(matches!(err, ArchiveError::EmptySource { .. }));
        assert!(!parent.path().join("Diff.zip").exists());
        assert!(mirror.is_dir());
    }

    #[test]
    fn test_archive_of_missing_dir_fails() {
        let parent = tempdir().unwrap();
        let err = Archiver::new()
            .archive(&parent.path().join("missing"), "Diff")
            .unwrap_err();
        assert!(matches!(err, ArchiveError::SourceNotFound { .. }));
    }

    #[test]
    fn test_remove_source() {
        let parent = tempdir().unwrap();
        let mirror = parent.path().join("Diff");
        write(&mirror, "a/b.txt", "b");

        Archiver::remove_source(&mirror).unwrap();

        assert!(!mirror.exists());
    }
}
