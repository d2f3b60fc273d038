use crate::core::{DiffEngine, RunConfig};
use crate::report::Reporter;
use anyhow::Context;
use tracing::info;

/// 执行一次比较：扫描、比较、复制、打包
///
/// 每个阶段的结果由 `reporter` 输出，任何阶段失败都会中止后续阶段。
pub async fn execute(config: RunConfig, reporter: &Reporter) -> anyhow::Result<()> {
    info!(
        "开始比较: {} -> {}",
        config.source_root.display(),
        config.target_root.display()
    );

    let engine = DiffEngine::new(config);

    let comparison = engine.analyze().await.context("比较目录失败")?;
    reporter.scanned(&comparison.source_records);
    reporter.scanned(&comparison.target_records);
    reporter.collisions(&comparison.collisions);
    reporter.diff_listing(&comparison.entries, &comparison.summary);
    reporter.summary(&comparison);

    let Some(report) = engine.stage(&comparison).await.context("复制文件失败")? else {
        return Ok(());
    };
    reporter.staged(&report.destination_root, &report.staged);

    if let Some(archive_path) = engine.package(&report).await.context("打包失败")? {
        reporter.archived(&archive_path, &report.destination_root);
    }

    Ok(())
}
