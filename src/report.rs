//! 控制台输出
//!
//! 所有输出同时记录到 [`REPORT_TARGET`]，日志文件中保留完整的输出内容。

use crate::core::{CaseCollision, Comparison, DiffEntry, DiffStatus, DiffSummary, FileRecord};
use chrono::{DateTime, Utc};
use crate::logging::REPORT_TARGET;
use nu_ansi_term::Color;
use std::path::Path;

const SEPARATOR: &str = "---------------------------";

/// 修改时间的显示格式，`%.f` 按实际精度输出小数秒
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f UTC";

/// 输出配置
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportConfig {
    /// 只输出错误
    pub quiet: bool,
    /// 列出差异文件
    pub show_diff: bool,
    /// 使用颜色
    pub color: bool,
}

/// 输出器
#[derive(Debug, Clone)]
pub struct Reporter {
    config: ReportConfig,
}

impl Reporter {
    pub fn new(config: ReportConfig) -> Self {
        Self { config }
    }

    /// 输出一行，安静模式下只写日志
    pub fn line(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::info!(target: REPORT_TARGET, "{}", message);
        if !self.config.quiet {
            println!("{}", message);
        }
    }

    /// 输出错误，安静模式下也会输出
    pub fn error(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        tracing::error!(target: REPORT_TARGET, "{}", message);
        if self.config.color {
            eprintln!("{}", Color::Red.bold().paint(message));
        } else {
            eprintln!("{}", message);
        }
    }

    pub fn separator(&self) {
        self.line(SEPARATOR);
    }

    /// 列出一个目录树扫描到的所有文件
    pub fn scanned(&self, records: &[FileRecord]) {
        self.separator();
        for record in records {
            self.line(format_record(record));
        }
    }

    /// 因大小写冲突被忽略的文件，这些文件不会被比较或复制
    pub fn collisions(&self, collisions: &[CaseCollision]) {
        if collisions.is_empty() {
            return;
        }
        self.separator();
        for collision in collisions {
            let text = format_collision(collision);
            tracing::info!(target: REPORT_TARGET, "{}", text);
            if !self.config.quiet {
                if self.config.color {
                    println!("{}", Color::Purple.paint(text));
                } else {
                    println!("{}", text);
                }
            }
        }
    }

    /// 列出所有非相同的条目
    pub fn diff_listing(&self, entries: &[DiffEntry], summary: &DiffSummary) {
        if !self.config.show_diff {
            return;
        }

        self.separator();
        if !summary.has_differences() {
            self.line("两个目录之间没有差异。");
            return;
        }

        for entry in entries.iter().filter(|e| e.status != DiffStatus::Identical) {
            let text = format_entry(entry);
            tracing::info!(target: REPORT_TARGET, "{}", text);
            if !self.config.quiet {
                if self.config.color {
                    println!("{}", status_color(entry.status).paint(text));
                } else {
                    println!("{}", text);
                }
            }
        }
    }

    pub fn summary(&self, comparison: &Comparison) {
        let summary = &comparison.summary;
        self.separator();
        self.line(format!(
            "源目录 {} 个文件, 目标目录 {} 个文件",
            comparison.source_records.len(),
            comparison.target_records.len()
        ));
        self.line(format!(
            "共 {} 个文件: 相同 {}, 修改 {}, 新增 {}, 删除 {}",
            summary.total_files(),
            summary.identical_count,
            summary.modified_count,
            summary.added_count,
            summary.removed_count
        ));
        if summary.staged_count() > 0 {
            self.line(format!(
                "待复制 {} 个文件, {} 字节",
                summary.staged_count(),
                summary.staged_bytes
            ));
        }
    }

    /// 复制结果
    pub fn staged(&self, destination_root: &Path, staged: &[String]) {
        self.separator();
        if staged.is_empty() {
            self.line("没有复制任何文件");
            return;
        }
        for relative_path in staged {
            self.line(format!("已复制 {}", relative_path));
        }
        self.line(format!(
            "共复制 {} 个文件到 {}",
            staged.len(),
            destination_root.display()
        ));
    }

    pub fn archived(&self, archive_path: &Path, mirror_dir: &Path) {
        self.line(format!("压缩包已创建: {}", archive_path.display()));
        self.line(format!("临时目录已删除: {}", mirror_dir.display()));
    }

    pub fn exiting(&self) {
        self.separator();
        self.line("退出。");
    }
}

fn status_label(status: DiffStatus) -> &'static str {
    match status {
        DiffStatus::Identical => "相同",
        DiffStatus::Modified => "修改",
        DiffStatus::Added => "新增",
        DiffStatus::Removed => "删除",
    }
}

fn status_color(status: DiffStatus) -> Color {
    match status {
        DiffStatus::Added => Color::Green,
        DiffStatus::Removed => Color::Red,
        DiffStatus::Modified => Color::Yellow,
        DiffStatus::Identical => Color::Default,
    }
}

fn format_time(time: &DateTime<Utc>) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// `<完整路径> - <修改时间> - <大小> bytes`
pub fn format_record(record: &FileRecord) -> String {
    format!(
        "{} - {} - {} bytes",
        record.full_path().display(),
        format_time(&record.modified_time),
        record.size
    )
}

/// `<状态> <完整路径> - <修改时间> - <大小> bytes`
pub fn format_entry(entry: &DiffEntry) -> String {
    format!(
        "{} {} - {} - {} bytes",
        status_label(entry.status),
        entry.full_path().display(),
        format_time(&entry.modified_time),
        entry.size
    )
}

pub fn format_collision(collision: &CaseCollision) -> String {
    format!(
        "忽略 {}中的 {}: 与 {} 仅大小写不同",
        collision.side, collision.ignored, collision.kept
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::TreeSide;
    use chrono::{Duration, TimeZone};
    use std::path::PathBuf;

    #[test]
    fn test_format_entry() {
        let entry = DiffEntry {
            root: PathBuf::from("/data/new"),
            relative_path: "docs/readme.md".to_string(),
            size: 42,
            modified_time: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
            status: DiffStatus::Added,
        };

        let expected = format!(
            "新增 {} - 2024-01-02 03:04:05 UTC - 42 bytes",
            entry.full_path().display()
        );
        assert_eq!(format_entry(&entry), expected);
    }

    #[test]
    fn test_sub_second_times_are_shown() {
        let base = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let record = FileRecord {
            root: PathBuf::from("/data/old"),
            relative_path: "a.bin".to_string(),
            size: 7,
            modified_time: base + Duration::milliseconds(250),
        };
        let newer = DiffEntry {
            root: PathBuf::from("/data/new"),
            relative_path: "a.bin".to_string(),
            size: 7,
            modified_time: base + Duration::milliseconds(750),
            status: DiffStatus::Modified,
        };

        assert!(format_record(&record).contains(" - 2024-01-02 03:04:05.250 UTC - 7 bytes"));
        assert!(format_entry(&newer).contains(" - 2024-01-02 03:04:05.750 UTC - 7 bytes"));
        assert_ne!(format_time(&record.modified_time), format_time(&newer.modified_time));
    }

    #[test]
    fn test_format_collision() {
        let collision = CaseCollision {
            side: TreeSide::Target,
            kept: "A.txt".to_string(),
            ignored: "a.txt".to_string(),
        };

        assert_eq!(
            format_collision(&collision),
            "忽略 目标目录中的 a.txt: 与 A.txt 仅大小写不同"
        );
    }

    #[test]
    fn test_status_colors() {
        assert_eq!(status_color(DiffStatus::Added), Color::Green);
        assert_eq!(status_color(DiffStatus::Removed), Color::Red);
        assert_eq!(status_color(DiffStatus::Modified), Color::Yellow);
    }
}
