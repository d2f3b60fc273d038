//! 命令行参数

use crate::config::DefaultsConfig;
use crate::core::{CompareConfig, PathCase, RunConfig, ScanConfig, StagingConfig, DEFAULT_ARCHIVE_NAME};
use crate::error::ArgumentError;
use crate::report::ReportConfig;
use clap::{Parser, ValueEnum};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

/// 比较两个目录，打包新增和修改的文件
#[derive(Parser, Debug, Clone)]
#[command(name = "filediff", version, about)]
pub struct Args {
    /// 源目录（旧版本）
    #[arg(short = 's', long)]
    pub source: PathBuf,

    /// 目标目录（新版本）
    #[arg(short = 't', long)]
    pub target: PathBuf,

    /// 排除的目录名，可重复或用逗号分隔
    #[arg(short = 'd', long = "exclude-dir", value_delimiter = ',')]
    pub exclude_dirs: Vec<String>,

    /// 排除的文件名，可重复或用逗号分隔
    #[arg(short = 'f', long = "exclude-file", value_delimiter = ',')]
    pub exclude_files: Vec<String>,

    /// 镜像目录和压缩包的存放位置，默认为当前目录
    #[arg(short = 'c', long)]
    pub copy_dir: Option<PathBuf>,

    /// 压缩包名称（不含扩展名）
    #[arg(short = 'z', long)]
    pub archive_name: Option<String>,

    /// 不列出差异文件
    #[arg(long)]
    pub hide_diff: bool,

    /// 只比较，不复制也不打包
    #[arg(long)]
    pub skip_copy: bool,

    /// 安静模式，只输出错误
    #[arg(short, long)]
    pub quiet: bool,

    /// 写入本次运行的日志文件
    #[arg(short, long)]
    pub log: bool,

    /// 路径大小写策略，默认跟随平台
    #[arg(long, value_enum)]
    pub path_case: Option<PathCaseArg>,

    /// 配置目录
    #[arg(long)]
    pub config_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PathCaseArg {
    Sensitive,
    Insensitive,
}

impl From<PathCaseArg> for PathCase {
    fn from(arg: PathCaseArg) -> Self {
        match arg {
            PathCaseArg::Sensitive => PathCase::Sensitive,
            PathCaseArg::Insensitive => PathCase::Insensitive,
        }
    }
}

impl Args {
    pub fn report_config(&self) -> ReportConfig {
        ReportConfig {
            quiet: self.quiet,
            show_diff: !self.hide_diff,
            color: std::io::stdout().is_terminal(),
        }
    }

    /// 合并配置文件中的默认值并校验，生成本次运行的配置
    ///
    /// 命令行的排除项追加到默认值之后；压缩包名称和大小写策略以命令行为准。
    pub fn into_run_config(
        self,
        defaults: &DefaultsConfig,
        cwd: &Path,
    ) -> Result<RunConfig, ArgumentError> {
        let exclude_dirs = merge_names("目录", &defaults.exclude_dirs, self.exclude_dirs)?;
        let exclude_files = merge_names("文件", &defaults.exclude_files, self.exclude_files)?;

        let path_case = self
            .path_case
            .map(PathCase::from)
            .or(defaults.path_case)
            .unwrap_or_default();

        let staging = if self.skip_copy {
            None
        } else {
            let archive_name = self
                .archive_name
                .or_else(|| defaults.archive_name.clone())
                .unwrap_or_else(|| DEFAULT_ARCHIVE_NAME.to_string());
            validate_archive_name(&archive_name)?;

            let copy_dir = match self.copy_dir {
                Some(dir) if dir.is_absolute() => dir,
                Some(dir) => cwd.join(dir),
                None => cwd.to_path_buf(),
            };
            Some(StagingConfig {
                copy_dir,
                archive_name,
            })
        };

        Ok(RunConfig {
            source_root: self.source,
            target_root: self.target,
            scan_config: ScanConfig::new(exclude_dirs, exclude_files),
            compare_config: CompareConfig { path_case },
            staging,
        })
    }
}

fn merge_names(
    kind: &'static str,
    defaults: &[String],
    extra: Vec<String>,
) -> Result<Vec<String>, ArgumentError> {
    let names: Vec<String> = defaults.iter().cloned().chain(extra).collect();
    for name in &names {
        if name.trim().is_empty() {
            return Err(ArgumentError::EmptyExclusion { kind });
        }
        if name.contains(['/', '\\']) {
            return Err(ArgumentError::PathLikeExclusion {
                kind,
                name: name.clone(),
            });
        }
    }
    Ok(names)
}

fn validate_archive_name(name: &str) -> Result<(), ArgumentError> {
    let invalid = name.trim().is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\']);
    if invalid {
        return Err(ArgumentError::InvalidArchiveName {
            name: name.to_string(),
        });
    }
    Ok(())
}
