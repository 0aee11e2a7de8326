use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use super::path_validator::ensure_directory_exists;

/// 輸出圖片格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpg,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpg",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Png => write!(f, "PNG"),
            Self::Jpg => write!(f, "JPG"),
        }
    }
}

/// 縮圖檔名：`{影片名}_thumbnail_{秒數}s.{副檔名}`
#[must_use]
pub fn thumbnail_file_name(video_stem: &str, timestamp: f64, format: ExportFormat) -> String {
    format!(
        "{video_stem}_thumbnail_{}s.{}",
        timestamp.max(0.0).floor() as u64,
        format.extension()
    )
}

/// 將影格存成 PNG 或 JPG；`quality` 只對 JPG 有效（1-100）
pub fn save_frame(
    image: &RgbImage,
    output_path: &Path,
    format: ExportFormat,
    quality: u8,
) -> Result<PathBuf> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_directory_exists(parent)?;
    }

    match format {
        ExportFormat::Png => image
            .save_with_format(output_path, ImageFormat::Png)
            .with_context(|| format!("無法儲存 PNG: {}", output_path.display()))?,
        ExportFormat::Jpg => {
            let file = File::create(output_path)
                .with_context(|| format!("無法建立檔案: {}", output_path.display()))?;
            let mut encoder =
                JpegEncoder::new_with_quality(BufWriter::new(file), quality.clamp(1, 100));
            encoder
                .encode_image(image)
                .with_context(|| format!("無法儲存 JPG: {}", output_path.display()))?;
        }
    }

    Ok(output_path.to_path_buf())
}
