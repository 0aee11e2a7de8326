//! 亮度平衡評分
//!
//! 以灰階直方圖判斷曝光：截斷像素越多、對比越低，分數越低。

use super::frame::Frame;
use image::GrayImage;
use serde::{Deserialize, Serialize};

/// 強度 <= 此值視為死黑
const DARK_CLIP_MAX: usize = 9;
/// 強度 >= 此值視為過曝
const BRIGHT_CLIP_MIN: usize = 246;
/// 標準差達此值時對比分數為滿分
const FULL_SPREAD_STD: f64 = 50.0;
/// 截斷比例達此值時截斷分數歸零
const MAX_CLIPPED_FRACTION: f64 = 0.30;
const MID_GRAY: f64 = 127.5;

/// 亮度統計
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrightnessStats {
    pub mean: f64,
    pub std_dev: f64,
    pub min: u8,
    pub max: u8,
    pub dark_fraction: f64,
    pub bright_fraction: f64,
}

impl BrightnessStats {
    #[must_use]
    pub fn clipped_fraction(&self) -> f64 {
        self.dark_fraction + self.bright_fraction
    }
}

/// 計算灰階直方圖統計，空影像回傳 `None`
#[must_use]
pub fn brightness_stats(gray: &GrayImage) -> Option<BrightnessStats> {
    let pixels = gray.as_raw();
    if pixels.is_empty() {
        return None;
    }

    let mut histogram = [0u64; 256];
    for &value in pixels {
        histogram[usize::from(value)] += 1;
    }

    let total = pixels.len() as f64;
    let (sum, sum_sq) = histogram
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(sum, sum_sq), (level, &count)| {
            let level = level as f64;
            let count = count as f64;
            (sum + level * count, sum_sq + level * level * count)
        });
    let mean = sum / total;
    let variance = (sum_sq / total - mean * mean).max(0.0);

    let dark: u64 = histogram[..=DARK_CLIP_MAX].iter().sum();
    let bright: u64 = histogram[BRIGHT_CLIP_MIN..].iter().sum();
    let min = histogram.iter().position(|&c| c > 0).unwrap_or(0) as u8;
    let max = histogram.iter().rposition(|&c| c > 0).unwrap_or(0) as u8;

    Some(BrightnessStats {
        mean,
        std_dev: variance.sqrt(),
        min,
        max,
        dark_fraction: dark as f64 / total,
        bright_fraction: bright as f64 / total,
    })
}

/// 由統計值計算 [0,1] 分數
///
/// `spread × (0.5·exposure + 0.5·clip)`，單色畫面 spread 為 0，分數必為 0。
#[must_use]
pub fn score_from_stats(stats: &BrightnessStats) -> f64 {
    let spread = (stats.std_dev / FULL_SPREAD_STD).min(1.0);
    let exposure = 1.0 - (stats.mean - MID_GRAY).abs() / MID_GRAY;
    let clip = (1.0 - stats.clipped_fraction() / MAX_CLIPPED_FRACTION).clamp(0.0, 1.0);

    (spread * (0.5 * exposure + 0.5 * clip)).clamp(0.0, 1.0)
}

#[must_use]
pub fn brightness_score(frame: &Frame) -> f64 {
    brightness_stats(frame.gray()).map_or(0.0, |stats| score_from_stats(&stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn test_solid_frames_score_zero() {
        for level in [0u8, 30, 128, 255] {
            let gray = GrayImage::from_pixel(20, 20, Luma([level]));
            let stats = brightness_stats(&gray).unwrap();
            assert!(score_from_stats(&stats).abs() < f64::EPSILON, "level {level}");
        }
    }

    #[test]
    fn test_mid_range_spread_scores_high() {
        // 強度在 40..=215 之間均勻分布，沒有截斷
        let gray = GrayImage::from_fn(176, 10, |x, _| Luma([40 + x as u8]));
        let stats = brightness_stats(&gray).unwrap();
        assert!(stats.clipped_fraction().abs() < f64::EPSILON);
        let score = score_from_stats(&stats);
        assert!(score > 0.9, "score = {score}");
    }

    #[test]
    fn test_black_and_white_halves_are_penalized() {
        let gray = GrayImage::from_fn(20, 20, |x, _| if x < 10 { Luma([0]) } else { Luma([255]) });
        let stats = brightness_stats(&gray).unwrap();
        assert!((stats.clipped_fraction() - 1.0).abs() < f64::EPSILON);
        // 截斷分數為 0，只剩曝光分數
        let score = score_from_stats(&stats);
        assert!(score <= 0.5 + 1e-9);
    }

    #[test]
    fn test_dark_frame_scores_lower_than_balanced() {
        let dark = GrayImage::from_fn(64, 8, |x, _| Luma([(x / 4) as u8 + 5]));
        let balanced = GrayImage::from_fn(64, 8, |x, _| Luma([(x * 3) as u8 + 30]));

        let dark_score = score_from_stats(&brightness_stats(&dark).unwrap());
        let balanced_score = score_from_stats(&brightness_stats(&balanced).unwrap());
        assert!(dark_score < balanced_score);
    }

    #[test]
    fn test_stats_min_max() {
        let gray = GrayImage::from_fn(3, 1, |x, _| Luma([[12, 90, 200][x as usize]]));
        let stats = brightness_stats(&gray).unwrap();
        assert_eq!(stats.min, 12);
        assert_eq!(stats.max, 200);
    }

    #[test]
    fn test_empty_image_has_no_stats() {
        let gray = GrayImage::new(0, 0);
        assert!(brightness_stats(&gray).is_none());
    }
}
