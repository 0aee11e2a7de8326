use crate::analyzer::{
    AnalyzerConfig, DEFAULT_SAMPLING_RATE_FPS, SamplingConfig, SharpnessNormalization,
    WeightConfig,
};
use crate::tools::ExportFormat;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// 最近使用路徑的保留數量
pub const MAX_RECENT_PATHS: usize = 5;

/// 分析時預設縮放的寬度
pub const DEFAULT_ANALYSIS_WIDTH: u32 = 640;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileTypeTable {
    #[serde(rename = "VIDEO_FILE")]
    pub video_file: Vec<String>,
}

impl FileTypeTable {
    #[must_use]
    pub fn video_extensions_set(&self) -> HashSet<String> {
        self.video_file
            .iter()
            .map(|ext| ext.to_lowercase())
            .collect()
    }

    #[must_use]
    pub fn is_video_file(&self, path: &Path) -> bool {
        let video_extensions = self.video_extensions_set();
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| video_extensions.contains(&format!(".{}", ext.to_lowercase())))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "en-US")]
    English,
    #[serde(rename = "zh-TW")]
    TraditionalChinese,
}

impl Language {
    pub const ALL: [Self; 2] = [Self::English, Self::TraditionalChinese];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::English => "en-US",
            Self::TraditionalChinese => "zh-TW",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::English => write!(f, "English"),
            Self::TraditionalChinese => write!(f, "繁體中文"),
        }
    }
}

/// 分析相關設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub sampling_rate_fps: f64,
    pub weights: WeightConfig,
    /// 分析前縮放的寬度，`None` 使用原始解析度
    pub analysis_width: Option<u32>,
    pub sharpness_normalization: SharpnessNormalization,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            sampling_rate_fps: DEFAULT_SAMPLING_RATE_FPS,
            weights: WeightConfig::default(),
            analysis_width: Some(DEFAULT_ANALYSIS_WIDTH),
            sharpness_normalization: SharpnessNormalization::RunMax,
        }
    }
}

impl AnalysisSettings {
    #[must_use]
    pub fn to_analyzer_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            sampling: SamplingConfig {
                rate_fps: self.sampling_rate_fps,
            },
            weights: self.weights,
            analysis_width: self.analysis_width,
            sharpness_normalization: self.sharpness_normalization,
            ..AnalyzerConfig::default()
        }
    }
}

/// 輸出相關設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    pub format: ExportFormat,
    /// JPG 品質（1-100）
    pub jpeg_quality: u8,
    pub write_metadata: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            jpeg_quality: 95,
            write_metadata: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UserSettings {
    pub language: Language,
    pub analysis: AnalysisSettings,
    pub export: ExportSettings,
    pub recent_paths: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub file_type_table: FileTypeTable,
    pub settings: UserSettings,
}
