//! 影格取樣器
//!
//! 依序解碼影片，以固定時間間隔挑出要評分的幀，不做任何 seek。

use super::frame::Frame;
use crate::error::{AnalysisError, Result};
use image::RgbImage;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// 預設取樣率（每秒 0.5 幀）
pub const DEFAULT_SAMPLING_RATE_FPS: f64 = 0.5;

/// 解碼來源的串流資訊
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamInfo {
    pub width: u32,
    pub height: u32,
    /// 原生幀率
    pub fps: f64,
    /// 原生總幀數（部分容器無法提供）
    pub frame_count: Option<u64>,
}

impl StreamInfo {
    /// 影片長度（秒），需要總幀數
    #[must_use]
    pub fn duration_seconds(&self) -> Option<f64> {
        self.frame_count
            .filter(|_| self.fps > 0.0)
            .map(|count| count as f64 / self.fps)
    }
}

/// 解碼器介面：依序提供原生幀，`None` 代表串流結束
pub trait FrameSource {
    fn info(&self) -> &StreamInfo;

    fn next_frame(&mut self) -> Result<Option<RgbImage>>;
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn info(&self) -> &StreamInfo {
        (**self).info()
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        (**self).next_frame()
    }
}

/// 記憶體內的影格來源，用於合成影片分析與測試
#[derive(Debug, Clone)]
pub struct MemorySource {
    info: StreamInfo,
    frames: VecDeque<RgbImage>,
}

impl MemorySource {
    /// 以固定幀率建立來源，尺寸取自第一張影像
    #[must_use]
    pub fn new(frames: Vec<RgbImage>, fps: f64) -> Self {
        let (width, height) = frames.first().map_or((0, 0), RgbImage::dimensions);
        let info = StreamInfo {
            width,
            height,
            fps,
            frame_count: Some(frames.len() as u64),
        };
        Self {
            info,
            frames: frames.into(),
        }
    }
}

impl FrameSource for MemorySource {
    fn info(&self) -> &StreamInfo {
        &self.info
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        Ok(self.frames.pop_front())
    }
}

/// 取樣設定
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// 目標取樣率（每秒幀數），必須大於 0
    pub rate_fps: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            rate_fps: DEFAULT_SAMPLING_RATE_FPS,
        }
    }
}

impl SamplingConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.rate_fps.is_finite() || self.rate_fps <= 0.0 {
            return Err(AnalysisError::invalid_config(format!(
                "取樣率必須為正數，目前為 {}",
                self.rate_fps
            )));
        }
        Ok(())
    }

    /// 實際取樣率：不超過原生幀率
    #[must_use]
    pub fn effective_rate(&self, native_fps: f64) -> f64 {
        if native_fps > 0.0 && self.rate_fps > native_fps {
            debug!(
                "取樣率 {:.3} 超過原生幀率 {:.3}，改用原生幀率",
                self.rate_fps, native_fps
            );
            native_fps
        } else {
            self.rate_fps
        }
    }

    /// 預估取樣數量：⌈D·R⌉
    #[must_use]
    pub fn estimate_samples(&self, duration_seconds: f64, native_fps: f64) -> usize {
        if duration_seconds <= 0.0 {
            return 0;
        }
        (duration_seconds * self.effective_rate(native_fps)).ceil() as usize
    }
}

/// 依時間間隔從來源挑出影格的迭代器
///
/// 第 n 個原生幀的時間點為 `n / fps`；當時間點到達第 k 個取樣點
/// `k / rate`（容許半個原生幀的誤差）時輸出。
pub struct FrameSampler<S: FrameSource> {
    source: S,
    fps: f64,
    interval: f64,
    tolerance: f64,
    native_index: u64,
    emitted: usize,
    finished: bool,
}

impl<S: FrameSource> FrameSampler<S> {
    pub fn new(source: S, config: &SamplingConfig) -> Result<Self> {
        config.validate()?;

        let fps = source.info().fps;
        if !fps.is_finite() || fps <= 0.0 {
            return Err(AnalysisError::invalid_config(format!(
                "來源幀率無效: {fps}"
            )));
        }

        let rate = config.effective_rate(fps);
        debug!("取樣器: 原生 {fps:.3} fps, 取樣 {rate:.3} fps");

        Ok(Self {
            source,
            fps,
            interval: 1.0 / rate,
            tolerance: 0.5 / fps,
            native_index: 0,
            emitted: 0,
            finished: false,
        })
    }

    #[must_use]
    pub fn info(&self) -> &StreamInfo {
        self.source.info()
    }

    /// 已輸出的取樣數
    #[must_use]
    pub const fn emitted(&self) -> usize {
        self.emitted
    }

    fn next_sample_time(&self) -> f64 {
        self.emitted as f64 * self.interval
    }
}

impl<S: FrameSource> Iterator for FrameSampler<S> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let image = match self.source.next_frame() {
                Ok(Some(image)) => image,
                Ok(None) => {
                    self.finished = true;
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            };

            let source_index = self.native_index;
            self.native_index += 1;
            let timestamp = source_index as f64 / self.fps;

            if timestamp + self.tolerance >= self.next_sample_time() {
                let frame = Frame::new(self.emitted, source_index, timestamp, image);
                self.emitted += 1;
                return Some(Ok(frame));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn blank_video(frame_count: usize) -> Vec<RgbImage> {
        (0..frame_count)
            .map(|_| RgbImage::from_pixel(4, 4, Rgb([10, 10, 10])))
            .collect()
    }

    fn sample_timestamps(frame_count: usize, fps: f64, rate: f64) -> Vec<f64> {
        let source = MemorySource::new(blank_video(frame_count), fps);
        FrameSampler::new(source, &SamplingConfig { rate_fps: rate })
            .unwrap()
            .map(|frame| frame.unwrap().timestamp)
            .collect()
    }

    #[test]
    fn test_sampling_count_matches_duration_times_rate() {
        // 10 秒、30 fps、0.5 fps 取樣 => ⌈10 × 0.5⌉ = 5
        let timestamps = sample_timestamps(300, 30.0, 0.5);
        assert_eq!(timestamps.len(), 5);
        assert!(timestamps[0].abs() < 1e-9);
        for (i, t) in timestamps.iter().enumerate() {
            assert!((t - i as f64 * 2.0).abs() < 0.05);
        }
    }

    #[test]
    fn test_sampling_ntsc_rate() {
        // 29.97 fps、10 秒、1 fps 取樣
        let timestamps = sample_timestamps(300, 30000.0 / 1001.0, 1.0);
        assert!((9..=11).contains(&timestamps.len()));
        for window in timestamps.windows(2) {
            assert!(window[1] > window[0]);
        }
    }

    #[test]
    fn test_rate_above_native_emits_every_frame() {
        let timestamps = sample_timestamps(24, 24.0, 120.0);
        assert_eq!(timestamps.len(), 24);
    }

    #[test]
    fn test_sequence_index_and_source_index() {
        let source = MemorySource::new(blank_video(90), 30.0);
        let frames: Vec<Frame> = FrameSampler::new(source, &SamplingConfig { rate_fps: 1.0 })
            .unwrap()
            .map(|f| f.unwrap())
            .collect();

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[1].index, 1);
        assert_eq!(frames[1].source_index, 30);
        assert_eq!(frames[2].source_index, 60);
    }

    #[test]
    fn test_invalid_rate_rejected() {
        let source = MemorySource::new(blank_video(10), 30.0);
        for rate in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let result = FrameSampler::new(source.clone(), &SamplingConfig { rate_fps: rate });
            assert!(matches!(result, Err(AnalysisError::InvalidConfig(_))));
        }
    }

    #[test]
    fn test_empty_source_yields_nothing() {
        let source = MemorySource::new(Vec::new(), 30.0);
        let mut sampler = FrameSampler::new(source, &SamplingConfig::default()).unwrap();
        assert!(sampler.next().is_none());
        assert_eq!(sampler.emitted(), 0);
    }

    #[test]
    fn test_estimate_samples() {
        let config = SamplingConfig { rate_fps: 0.5 };
        assert_eq!(config.estimate_samples(10.0, 30.0), 5);
        assert_eq!(config.estimate_samples(0.0, 30.0), 0);

        let fast = SamplingConfig { rate_fps: 100.0 };
        assert_eq!(fast.estimate_samples(2.0, 25.0), 50);
    }
}
