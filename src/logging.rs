//! 日志模块 - 日志配置和本次运行的日志文件

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};

/// 报告输出使用的日志 target，控制台层会过滤掉它
pub const REPORT_TARGET: &str = "filediff::report";

/// 日志文件名前缀
const LOG_FILE_PREFIX: &str = "filediff";

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogConfig {
    /// 日志级别: "error", "warn", "info", "debug", "trace"
    #[serde(default = "default_level")]
    pub level: String,
    /// 日志文件目录，未设置时使用当前目录
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            directory: None,
        }
    }
}

impl LogConfig {
    /// 从配置文件加载日志配置
    pub fn load(config_dir: &Path) -> Self {
        crate::config::load_section(config_dir, "log").unwrap_or_default()
    }

    /// 将配置的日志级别转换为 tracing Level
    pub fn tracing_level(&self) -> tracing::Level {
        match self.level.to_lowercase().as_str() {
            "error" => tracing::Level::ERROR,
            "warn" => tracing::Level::WARN,
            "debug" => tracing::Level::DEBUG,
            "trace" => tracing::Level::TRACE,
            _ => tracing::Level::INFO,
        }
    }

    /// 日志目录，相对路径基于 `cwd`
    pub fn log_dir(&self, cwd: &Path) -> PathBuf {
        match &self.directory {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => cwd.join(dir),
            None => cwd.to_path_buf(),
        }
    }
}

/// 本次运行的日志文件名（不含扩展名）: `filediff-YYYYMMDD-HHMMSS`
pub fn session_log_stem(now: DateTime<Local>) -> String {
    format!("{}-{}", LOG_FILE_PREFIX, now.format("%Y%m%d-%H%M%S"))
}

/// 本次运行的日志文件
pub struct SessionLog {
    pub path: PathBuf,
    pub writer: NonBlocking,
    pub guard: WorkerGuard,
}

/// 创建本次运行的日志文件，写入在后台线程完成
///
/// `guard` 被丢弃时才会刷新剩余的日志，需要保留到进程退出前。
pub fn open_session_log(log_dir: &Path, now: DateTime<Local>) -> Result<SessionLog, InitError> {
    let stem = session_log_stem(now);
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(&stem)
        .filename_suffix("log")
        .build(log_dir)?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    Ok(SessionLog {
        path: log_dir.join(format!("{}.log", stem)),
        writer,
        guard,
    })
}
