use image::{GrayImage, RgbImage};

/// 取樣後的單一影格
///
/// 建立時一併計算灰階平面，之後不再變動，評分器只會以唯讀方式借用。
#[derive(Debug, Clone)]
pub struct Frame {
    /// 在取樣序列中的位置（從 0 開始）
    pub index: usize,
    /// 原始影片中的幀編號
    pub source_index: u64,
    /// 距離影片開頭的秒數
    pub timestamp: f64,
    rgb: RgbImage,
    gray: GrayImage,
}

impl Frame {
    #[must_use]
    pub fn new(index: usize, source_index: u64, timestamp: f64, rgb: RgbImage) -> Self {
        let gray = image::imageops::grayscale(&rgb);
        Self {
            index,
            source_index,
            timestamp,
            rgb,
            gray,
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.rgb.width()
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.rgb.height()
    }

    /// 像素總數
    #[must_use]
    pub fn area(&self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    #[must_use]
    pub const fn rgb(&self) -> &RgbImage {
        &self.rgb
    }

    #[must_use]
    pub const fn gray(&self) -> &GrayImage {
        &self.gray
    }
}
