//! 清晰度評分（Laplacian 變異數）

use super::frame::Frame;
use image::GrayImage;
use serde::{Deserialize, Serialize};

/// 固定飽和值：變異數達 1000 即視為滿分
pub const DEFAULT_ABSOLUTE_SATURATION: f64 = 1000.0;

/// 原始變異數轉換為 [0,1] 分數的方式
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SharpnessNormalization {
    /// 除以本次分析中觀察到的最大變異數
    #[default]
    RunMax,
    /// 除以固定飽和值並截斷為 1
    Absolute { saturation: f64 },
}

impl SharpnessNormalization {
    /// 以整批原始變異數計算正規化分母
    #[must_use]
    pub fn denominator(&self, variances: impl IntoIterator<Item = f64>) -> f64 {
        match self {
            Self::RunMax => variances.into_iter().fold(0.0, f64::max),
            Self::Absolute { saturation } => *saturation,
        }
    }
}

/// 將單一原始變異數換算成分數
#[must_use]
pub fn normalize_variance(variance: f64, denominator: f64) -> f64 {
    if denominator <= 0.0 || !denominator.is_finite() || variance <= 0.0 {
        return 0.0;
    }
    (variance / denominator).clamp(0.0, 1.0)
}

/// 計算一幀的 Laplacian 變異數（未正規化）
#[must_use]
pub fn laplacian_variance(frame: &Frame) -> f64 {
    laplacian_variance_of(frame.gray())
}

/// 對灰階影像套用 3x3 Laplacian：
///
/// ```text
/// [ 0  1  0 ]
/// [ 1 -4  1 ]
/// [ 0  1  0 ]
/// ```
///
/// 只計算內部像素，回傳母體變異數。小於 3x3 的影像回傳 0。
#[must_use]
pub fn laplacian_variance_of(gray: &GrayImage) -> f64 {
    let (width, height) = gray.dimensions();
    if width < 3 || height < 3 {
        return 0.0;
    }

    let w = width as usize;
    let pixels = gray.as_raw();
    let mut count = 0u64;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;

    for y in 1..height as usize - 1 {
        let row = y * w;
        for x in 1..w - 1 {
            let center = i32::from(pixels[row + x]);
            let response = i32::from(pixels[row - w + x])
                + i32::from(pixels[row + w + x])
                + i32::from(pixels[row + x - 1])
                + i32::from(pixels[row + x + 1])
                - 4 * center;
            let value = f64::from(response);
            sum += value;
            sum_sq += value * value;
            count += 1;
        }
    }

    let n = count as f64;
    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0)
}
