//! 应用配置模块

use crate::core::PathCase;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 配置文件名
pub const CONFIG_FILE: &str = "config.json";

/// 获取应用配置目录
pub fn default_config_dir() -> PathBuf {
    crate::dirs::config_dir()
        .map(|p| p.join("filediff"))
        .unwrap_or_else(|| PathBuf::from(".filediff"))
}

/// 读取配置文件中的某一节，文件不存在或内容无效时返回 None
pub(crate) fn load_section<T>(config_dir: &Path, section: &str) -> Option<T>
where
    T: for<'de> Deserialize<'de>,
{
    let content = fs::read_to_string(config_dir.join(CONFIG_FILE)).ok()?;
    let config = serde_json::from_str::<serde_json::Value>(&content).ok()?;
    let value = config.get(section)?.clone();
    match serde_json::from_value::<T>(value) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::warn!("配置项 {} 无效，使用默认值: {}", section, e);
            None
        }
    }
}

/// 默认参数配置，与命令行参数合并
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultsConfig {
    /// 总是排除的目录名
    #[serde(default)]
    pub exclude_dirs: Vec<String>,
    /// 总是排除的文件名
    #[serde(default)]
    pub exclude_files: Vec<String>,
    /// 压缩包名称
    #[serde(default)]
    pub archive_name: Option<String>,
    /// 路径大小写策略，未设置时使用平台默认
    #[serde(default)]
    pub path_case: Option<PathCase>,
}

impl DefaultsConfig {
    /// 从配置文件加载默认参数
    pub fn load(config_dir: &Path) -> Self {
        load_section(config_dir, "defaults").unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_defaults_section() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{
                "defaults": {
                    "excludeDirs": [".git", "node_modules"],
                    "excludeFiles": ["Thumbs.db"],
                    "archiveName": "Release",
                    "pathCase": "insensitive"
                },
                "log": { "level": "debug" }
            }"#,
        )
        .unwrap();

        let config = DefaultsConfig::load(dir.path());

        assert_eq!(config.exclude_dirs, vec![".git", "node_modules"]);
        assert_eq!(config.exclude_files, vec!["Thumbs.db"]);
        assert_eq!(config.archive_name.as_deref(), Some("Release"));
        assert_eq!(config.path_case, Some(PathCase::Insensitive));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = DefaultsConfig::load(dir.path());
        assert!(config.exclude_dirs.is_empty());
        assert!(config.archive_name.is_none());
    }

    #[test]
    fn test_invalid_section_uses_defaults() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{ "defaults": { "pathCase": "sometimes" } }"#,
        )
        .unwrap();

        let config = DefaultsConfig::load(dir.path());
        assert!(config.path_case.is_none());
    }
}
