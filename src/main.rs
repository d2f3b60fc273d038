use clap::Parser;
use filediff_lib::cli::Args;
use filediff_lib::config::{default_config_dir, DefaultsConfig};
use filediff_lib::logging::{open_session_log, LogConfig, REPORT_TARGET};
use filediff_lib::report::Reporter;
use std::path::Path;
use std::process::ExitCode;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// 初始化日志系统
///
/// 控制台只输出 `RUST_LOG` 指定的日志（默认 warn），报告内容由 Reporter 直接输出。
/// 启用日志文件时，返回的 guard 需要保留到退出前。
fn init_logging(enable_file: bool, config_dir: &Path, cwd: &Path) -> Option<WorkerGuard> {
    let mut console_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    if let Ok(directive) = format!("{}=off", REPORT_TARGET).parse() {
        console_filter = console_filter.add_directive(directive);
    }

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    if !enable_file {
        let _ = tracing_subscriber::registry().with(console_layer).try_init();
        return None;
    }

    let config = LogConfig::load(config_dir);
    let log_dir = config.log_dir(cwd);
    let session = match std::fs::create_dir_all(&log_dir)
        .map_err(|e| e.to_string())
        .and_then(|_| open_session_log(&log_dir, chrono::Local::now()).map_err(|e| e.to_string()))
    {
        Ok(session) => session,
        Err(e) => {
            // 日志文件创建失败，只输出到控制台
            let _ = tracing_subscriber::registry().with(console_layer).try_init();
            tracing::warn!("无法创建日志文件 {}: {}", log_dir.display(), e);
            return None;
        }
    };

    let file_filter = Targets::new()
        .with_default(config.tracing_level())
        .with_target(REPORT_TARGET, tracing::Level::INFO);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(session.writer)
        .with_ansi(false)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_filter(file_filter);

    let _ = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init();

    tracing::debug!("日志文件: {}", session.path.display());
    Some(session.guard)
}

async fn run(args: Args, config_dir: &Path, cwd: &Path, reporter: &Reporter) -> anyhow::Result<()> {
    let defaults = DefaultsConfig::load(config_dir);
    let config = args.into_run_config(&defaults, cwd)?;
    filediff_lib::commands::diff::execute(config, reporter).await
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let reporter = Reporter::new(args.report_config());
    let config_dir = args.config_dir.clone().unwrap_or_else(default_config_dir);
    let cwd = std::env::current_dir().unwrap_or_else(|_| ".".into());

    let _log_guard = init_logging(args.log, &config_dir, &cwd);

    let code = match run(args, &config_dir, &cwd, &reporter).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            reporter.error(format!("{:#}", e));
            ExitCode::FAILURE
        }
    };

    reporter.exiting();
    code
}
