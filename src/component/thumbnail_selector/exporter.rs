use crate::analyzer::AnalysisResult;
use crate::config::ExportSettings;
use crate::tools::{
    ThumbnailMetadata, VideoInfo, ensure_directory_exists, grab_frame, save_frame,
    thumbnail_file_name, write_metadata,
};
use anyhow::{Context, Result};
use log::info;
use std::path::{Path, PathBuf};

/// 輸出的檔案
#[derive(Debug, Clone)]
pub struct ExportedFiles {
    pub image_path: PathBuf,
    pub metadata_path: Option<PathBuf>,
}

/// 縮圖檔案的完整路徑
#[must_use]
pub fn thumbnail_output_path(
    output_dir: &Path,
    video_stem: &str,
    timestamp: f64,
    settings: &ExportSettings,
) -> PathBuf {
    output_dir.join(thumbnail_file_name(video_stem, timestamp, settings.format))
}

#[must_use]
pub fn metadata_output_path(output_dir: &Path, video_stem: &str) -> PathBuf {
    output_dir.join(format!("{video_stem}_metadata.json"))
}

/// 以原始解析度重新擷取最佳幀，存檔並寫入中繼資料
pub fn export_thumbnail(
    video_path: &Path,
    video_info: &VideoInfo,
    result: &AnalysisResult,
    output_dir: &Path,
    settings: &ExportSettings,
    processing_seconds: f64,
) -> Result<ExportedFiles> {
    ensure_directory_exists(output_dir)?;

    let video_stem = video_path
        .file_stem()
        .map_or_else(|| "video".to_string(), |s| s.to_string_lossy().to_string());
    let timestamp = result.best.timestamp;

    let image = grab_frame(video_path, timestamp, video_info)
        .with_context(|| format!("無法擷取 {timestamp:.2}s 的影格"))?;

    let image_path = save_frame(
        &image,
        &thumbnail_output_path(output_dir, &video_stem, timestamp, settings),
        settings.format,
        settings.jpeg_quality,
    )?;
    info!("縮圖已儲存: {}", image_path.display());

    let metadata_path = if settings.write_metadata {
        let path = metadata_output_path(output_dir, &video_stem);
        let metadata = ThumbnailMetadata::new(video_path, video_info, result, processing_seconds);
        write_metadata(&metadata, &path)?;
        Some(path)
    } else {
        None
    };

    Ok(ExportedFiles {
        image_path,
        metadata_path,
    })
}
