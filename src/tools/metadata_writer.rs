use super::ffprobe_info::VideoInfo;
use crate::analyzer::{AnalysisResult, ScoreVector, WeightConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 縮圖附帶的中繼資料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThumbnailMetadata {
    pub source_file: String,
    pub video: VideoInfo,
    pub frame_timestamp: f64,
    /// MM:SS 格式
    pub frame_time: String,
    pub overall_score: f64,
    pub scores: ScoreVector,
    pub face_count: usize,
    pub weights: WeightConfig,
    pub frames_analyzed: usize,
    /// 人臉偵測失敗的幀數
    pub detector_failures: usize,
    pub cancelled: bool,
    pub processing_seconds: f64,
}

impl ThumbnailMetadata {
    #[must_use]
    pub fn new(
        source_file: &Path,
        video: &VideoInfo,
        result: &AnalysisResult,
        processing_seconds: f64,
    ) -> Self {
        let best = &result.best;
        Self {
            source_file: source_file.display().to_string(),
            video: video.clone(),
            frame_timestamp: best.timestamp,
            frame_time: format_timestamp(best.timestamp),
            overall_score: best.combined,
            scores: best.scores,
            face_count: best.face_count,
            weights: result.weights,
            frames_analyzed: result.frames_sampled,
            detector_failures: result.detector_failures,
            cancelled: result.cancelled,
            processing_seconds,
        }
    }
}

/// 秒數轉為 MM:SS
#[must_use]
pub fn format_timestamp(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

pub fn write_metadata(metadata: &ThumbnailMetadata, output_path: &Path) -> Result<()> {
    let content =
        serde_json::to_string_pretty(metadata).context("Failed to serialize thumbnail metadata")?;

    fs::write(output_path, content)
        .with_context(|| format!("Failed to write metadata to {}", output_path.display()))?;

    Ok(())
}
