//! 各阶段的错误类型

use std::path::PathBuf;

/// 扫描目录失败
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("扫描目录不存在: {}", path.display())]
    RootNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("扫描路径不是目录: {}", path.display())]
    NotADirectory { path: PathBuf },
    #[error("无法读取目录: {}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("无法获取文件元数据: {}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("文件不在扫描目录内: {}", path.display())]
    OutsideRoot { path: PathBuf },
    #[error("路径不是有效的 UTF-8: {}", path.display())]
    NonUtf8Path { path: PathBuf },
}

/// 复制到镜像目录失败
#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    #[error("创建目录失败: {}", path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("复制文件失败: {} -> {}", from.display(), to.display())]
    CopyFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("非法的相对路径: {path}")]
    InvalidPath { path: String },
    #[error("镜像目录已存在且不为空: {}", path.display())]
    MirrorNotEmpty { path: PathBuf },
}

/// 打包失败
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("待打包目录不存在: {}", path.display())]
    SourceNotFound { path: PathBuf },
    #[error("待打包目录为空: {}", path.display())]
    EmptySource { path: PathBuf },
    #[error("无法确定压缩包位置: {}", path.display())]
    NoParentDirectory { path: PathBuf },
    #[error("读取待打包目录失败: {}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("写入压缩包失败: {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("写入压缩包失败: {}", path.display())]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("删除临时目录失败: {}", path.display())]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 参数错误（在任何文件操作之前检查）
#[derive(Debug, thiserror::Error)]
pub enum ArgumentError {
    #[error("排除的{kind}名称不能为空")]
    EmptyExclusion { kind: &'static str },
    #[error("排除的{kind}名称只能是单个名称，不能是路径: {name}")]
    PathLikeExclusion { kind: &'static str, name: String },
    #[error("非法的压缩包名称: {name:?}")]
    InvalidArchiveName { name: String },
}

/// 一次比较任务中的错误
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Copy(#[from] CopyError),
    #[error(transparent)]
    Archive(#[from] ArchiveError),
    #[error("后台任务失败: {0}")]
    Task(#[from] tokio::task::JoinError),
}
