pub mod archiver;
pub mod comparator;
pub mod engine;
pub mod record;
pub mod scanner;
pub mod stager;

pub use archiver::{Archiver, ARCHIVE_EXTENSION};
pub use comparator::{CaseCollision, CompareConfig, DiffSummary, FileComparator, PathCase, TreeSide};
pub use engine::{Comparison, DiffEngine, RunConfig, StagingConfig, DEFAULT_ARCHIVE_NAME};
pub use record::{DiffEntry, DiffStatus, FileRecord};
pub use scanner::{FileScanner, ScanConfig};
pub use stager::{StageReport, Stager};
