use crate::core::archiver::Archiver;
use crate::core::comparator::{CaseCollision, CompareConfig, DiffSummary, FileComparator};
use crate::core::record::{DiffEntry, FileRecord};
use crate::core::scanner::{FileScanner, ScanConfig};
use crate::core::stager::{StageReport, Stager};
use crate::error::DiffError;
use std::path::PathBuf;
use tracing::{debug, info};

/// 默认的压缩包名称
pub const DEFAULT_ARCHIVE_NAME: &str = "Diff";

/// 复制与打包配置
#[derive(Debug, Clone)]
pub struct StagingConfig {
    /// 镜像目录和压缩包所在的目录
    pub copy_dir: PathBuf,
    /// 压缩包名称（不含扩展名），同时也是镜像目录名
    pub archive_name: String,
}

impl StagingConfig {
    /// 镜像目录：`<copy_dir>/<archive_name>`
    pub fn mirror_dir(&self) -> PathBuf {
        self.copy_dir.join(&self.archive_name)
    }
}

/// 一次比较任务的配置
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub source_root: PathBuf,
    pub target_root: PathBuf,
    pub scan_config: ScanConfig,
    pub compare_config: CompareConfig,
    /// 为 None 时只比较，不复制
    pub staging: Option<StagingConfig>,
}

/// 比较结果
#[derive(Debug, Clone)]
pub struct Comparison {
    pub source_records: Vec<FileRecord>,
    pub target_records: Vec<FileRecord>,
    pub entries: Vec<DiffEntry>,
    pub summary: DiffSummary,
    /// 因大小写冲突未参与比较的路径
    pub collisions: Vec<CaseCollision>,
}

impl Comparison {
    /// 需要复制的条目
    pub fn staged_entries(&self) -> impl Iterator<Item = &DiffEntry> {
        self.entries.iter().filter(|e| e.status.is_staged())
    }
}

/// 差异引擎：扫描、比较、复制、打包
///
/// 各阶段严格按顺序执行，前一阶段完成后才开始下一阶段。
pub struct DiffEngine {
    config: RunConfig,
}

impl DiffEngine {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// 扫描两个目录并比较
    ///
    /// 两个目录互不相关，在阻塞线程池上并行扫描，全部完成后才比较。
    pub async fn analyze(&self) -> Result<Comparison, DiffError> {
        let scanner = FileScanner::with_config(self.config.scan_config.clone());

        let source_scanner = scanner.clone();
        let source_root = self.config.source_root.clone();
        let source_task = tokio::task::spawn_blocking(move || source_scanner.scan(&source_root));

        let target_root = self.config.target_root.clone();
        let target_task = tokio::task::spawn_blocking(move || scanner.scan(&target_root));

        let (source_result, target_result) = tokio::try_join!(source_task, target_task)?;
        let source_records = source_result?;
        let target_records = target_result?;

        debug!(
            "扫描完成: 源 {} 文件, 目标 {} 文件",
            source_records.len(),
            target_records.len()
        );

        let comparator = FileComparator::with_config(self.config.compare_config.clone());
        let (entries, collisions) =
            comparator.compare_with_collisions(&source_records, &target_records);
        let summary = FileComparator::summarize(&entries);

        info!(
            "比较完成: {} 个路径, 相同 {}, 修改 {}, 新增 {}, 删除 {}",
            summary.total_files(),
            summary.identical_count,
            summary.modified_count,
            summary.added_count,
            summary.removed_count
        );

        Ok(Comparison {
            source_records,
            target_records,
            entries,
            summary,
            collisions,
        })
    }

    /// 将新增和修改的文件复制到镜像目录，未配置复制时返回 None
    pub async fn stage(&self, comparison: &Comparison) -> Result<Option<StageReport>, DiffError> {
        let Some(staging) = &self.config.staging else {
            debug!("已跳过复制");
            return Ok(None);
        };

        let stager = Stager::new(staging.mirror_dir());
        let entries: Vec<DiffEntry> = comparison.staged_entries().cloned().collect();
        if entries.is_empty() {
            debug!("没有需要复制的文件");
            return Ok(Some(StageReport {
                destination_root: staging.mirror_dir(),
                ..Default::default()
            }));
        }

        let report = tokio::task::spawn_blocking(move || {
            stager.ensure_destination_unused()?;
            stager.stage(&entries)
        })
        .await??;
        Ok(Some(report))
    }

    /// 打包镜像目录并删除它，没有复制任何文件时返回 None
    ///
    /// 只有打包成功才会删除镜像目录。
    pub async fn package(&self, report: &StageReport) -> Result<Option<PathBuf>, DiffError> {
        let Some(staging) = &self.config.staging else {
            return Ok(None);
        };
        if report.is_empty() {
            debug!("没有复制任何文件，跳过打包");
            return Ok(None);
        }

        let mirror_dir = report.destination_root.clone();
        let archive_name = staging.archive_name.clone();

        let archive_path = tokio::task::spawn_blocking(move || {
            let archive_path = Archiver::new().archive(&mirror_dir, &archive_name)?;
            Archiver::remove_source(&mirror_dir)?;
            Ok::<_, DiffError>(archive_path)
        })
        .await??;

        Ok(Some(archive_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::comparator::PathCase;
    use crate::core::record::DiffStatus;
    use crate::error::{CopyError, ScanError};
    use std::fs::{self, File};
    use std::path::Path;
    use std::time::{Duration, SystemTime};
    use tempfile::{tempdir, TempDir};

    fn write(root: &Path, relative: &str, content: &str, modified: SystemTime) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(modified)
            .unwrap();
    }

    struct Fixture {
        source: TempDir,
        target: TempDir,
        output: TempDir,
    }

    fn fixture() -> Fixture {
        let fixed = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let later = fixed + Duration::from_secs(60);

        let source = tempdir().unwrap();
        let target = tempdir().unwrap();
        write(source.path(), "same.txt", "same", fixed);
        write(source.path(), "docs/changed.md", "old", fixed);
        write(source.path(), "gone.txt", "bye", fixed);
        write(source.path(), "node_modules/lib.js", "x", fixed);

        write(target.path(), "same.txt", "same", fixed);
        write(target.path(), "docs/changed.md", "newer", later);
        write(target.path(), "src/deep/new.rs", "fn main() {}", later);
        write(target.path(), "node_modules/lib.js", "changed", later);

        Fixture {
            source,
            target,
            output: tempdir().unwrap(),
        }
    }

    fn config(fixture: &Fixture, staging: bool) -> RunConfig {
        RunConfig {
            source_root: fixture.source.path().to_path_buf(),
            target_root: fixture.target.path().to_path_buf(),
            scan_config: ScanConfig::new(["node_modules"], Vec::<String>::new()),
            compare_config: CompareConfig {
                path_case: PathCase::Sensitive,
            },
            staging: staging.then(|| StagingConfig {
                copy_dir: fixture.output.path().to_path_buf(),
                archive_name: DEFAULT_ARCHIVE_NAME.to_string(),
            }),
        }
    }

    #[tokio::test]
    async fn test_full_pipeline() {
        let fixture = fixture();
        let engine = DiffEngine::new(config(&fixture, true));

        let comparison = engine.analyze().await.unwrap();
        let statuses: Vec<(&str, DiffStatus)> = comparison
            .entries
            .iter()
            .map(|e| (e.relative_path.as_str(), e.status))
            .collect();
        assert_eq!(
            statuses,
            vec![
                ("docs/changed.md", DiffStatus::Modified),
                ("gone.txt", DiffStatus::Removed),
                ("same.txt", DiffStatus::Identical),
                ("src/deep/new.rs", DiffStatus::Added),
            ]
        );
        assert_eq!(comparison.source_records.len(), 3);
        assert_eq!(comparison.target_records.len(), 3);
        assert!(comparison.collisions.is_empty());

        let report = engine.stage(&comparison).await.unwrap().unwrap();
        assert_eq!(report.staged, vec!["docs/changed.md", "src/deep/new.rs"]);

        let archive = engine.package(&report).await.unwrap().unwrap();
        assert_eq!(archive, fixture.output.path().join("Diff.zip"));
        assert!(archive.is_file());
        assert!(!fixture.output.path().join("Diff").exists());

        let packed = zip::ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        let mut names: Vec<&str> = packed.file_names().filter(|n| !n.ends_with('/')).collect();
        names.sort();
        assert_eq!(names, vec!["docs/changed.md", "src/deep/new.rs"]);
    }

    #[tokio::test]
    async fn test_nothing_staged_skips_archive() {
        let fixture = fixture();
        let mut config = config(&fixture, true);
        config.target_root = fixture.source.path().to_path_buf();
        let engine = DiffEngine::new(config);

        let comparison = engine.analyze().await.unwrap();
        assert!(!comparison.summary.has_differences());

        let report = engine.stage(&comparison).await.unwrap().unwrap();
        assert!(report.is_empty());
        assert_eq!(engine.package(&report).await.unwrap(), None);
        assert!(!fixture.output.path().join("Diff.zip").exists());
    }

    #[tokio::test]
    async fn test_existing_mirror_is_left_untouched() {
        let fixture = fixture();
        let user_dir = fixture.output.path().join("Diff");
        fs::create_dir_all(&user_dir).unwrap();
        fs::write(user_dir.join("precious.doc"), "user data").unwrap();
        let engine = DiffEngine::new(config(&fixture, true));

        let comparison = engine.analyze().await.unwrap();
        let err = engine.stage(&comparison).await.unwrap_err();

        assert!(matches!(err, DiffError::Copy(CopyError::MirrorNotEmpty { .. })));
        let names: Vec<String> = fs::read_dir(&user_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["precious.doc"]);
        assert!(!fixture.output.path().join("Diff.zip").exists());
    }

    #[tokio::test]
    async fn test_skip_copy() {
        let fixture = fixture();
        let engine = DiffEngine::new(config(&fixture, false));

        let comparison = engine.analyze().await.unwrap();

        assert_eq!(engine.stage(&comparison).await.unwrap().map(|r| r.count()), None);
        assert!(fs::read_dir(fixture.output.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_missing_root_fails_analysis() {
        let fixture = fixture();
        let mut config = config(&fixture, false);
        config.target_root = fixture.target.path().join("missing");

        let err = DiffEngine::new(config).analyze().await.unwrap_err();

        assert!(matches!(err, DiffError::Scan(ScanError::RootNotFound { .. })));
    }
}
