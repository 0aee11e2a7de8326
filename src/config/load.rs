use crate::config::types::{Config, FileTypeTable, UserSettings};
use anyhow::{Context, Result};
use log::warn;
use std::fs;
use std::path::Path;

/// 編譯時嵌入的影片副檔名設定（不需要外部檔案）
const FILE_TYPE_TABLE_JSON: &str = include_str!("../data/file_type_table.json");

/// 設定檔位置：程式執行的當前目錄
pub const SETTINGS_FILE: &str = "settings.json";

impl Config {
    pub fn new() -> Result<Self> {
        let file_type_table = Self::embedded_file_type_table()?;
        let settings = Self::load_settings(Path::new(SETTINGS_FILE)).unwrap_or_else(|e| {
            warn!("無法讀取設定檔，改用預設值: {e:#}");
            UserSettings::default()
        });

        Ok(Self {
            file_type_table,
            settings,
        })
    }

    pub fn load_settings(path: &Path) -> Result<UserSettings> {
        if !path.exists() {
            return Ok(UserSettings::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings from {}", path.display()))
    }

    /// 從編譯時嵌入的 JSON 載入副檔名表
    pub fn embedded_file_type_table() -> Result<FileTypeTable> {
        serde_json::from_str(FILE_TYPE_TABLE_JSON).context("無法解析嵌入的檔案類型設定")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Language;

    #[test]
    fn test_embedded_table_contains_common_containers() {
        let table = Config::embedded_file_type_table().unwrap();
        for name in ["a.mp4", "b.AVI", "c.mov", "d.mkv"] {
            assert!(table.is_video_file(Path::new(name)), "{name}");
        }
        assert!(!table.is_video_file(Path::new("e.jpg")));
    }

    #[test]
    fn test_missing_settings_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Config::load_settings(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, UserSettings::default());
    }

    #[test]
    fn test_partial_settings_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"language": "zh-TW", "analysis": {"sampling_rate_fps": 2.0}}"#)
            .unwrap();

        let settings = Config::load_settings(&path).unwrap();
        assert_eq!(settings.language, Language::TraditionalChinese);
        assert!((settings.analysis.sampling_rate_fps - 2.0).abs() < f64::EPSILON);
        assert_eq!(settings.analysis.weights, crate::analyzer::WeightConfig::default());
        assert!(settings.export.write_metadata);
    }

    #[test]
    fn test_invalid_settings_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();
        assert!(Config::load_settings(&path).is_err());
    }
}
