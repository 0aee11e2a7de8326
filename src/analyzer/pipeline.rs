//! 分析流程
//!
//! 第一階段依序從取樣器讀取影格，每批以 rayon 平行評分並只保留原始分數；
//! 第二階段再統一正規化清晰度、合併分數並選出最佳幀。
//! 每取一幀前檢查中斷旗標，中斷時回傳目前為止的最佳結果。

use super::aggregator::{AnalysisResult, RawFrameScore, WeightConfig, build_result};
use super::brightness::brightness_score;
use super::composition::composition_score;
use super::face::{FaceDetector, FaceScoringConfig, SkinToneDetector, evaluate_faces};
use super::frame::Frame;
use super::sampler::{FrameSampler, FrameSource, SamplingConfig};
use super::sharpness::{SharpnessNormalization, laplacian_variance};
use crate::error::{AnalysisError, Result};
use crate::tools::FfmpegDecoder;
use log::{debug, info, warn};
use rayon::prelude::*;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 分析設定，進入流程時驗證一次
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    pub sampling: SamplingConfig,
    pub weights: WeightConfig,
    /// 分析時縮放到的寬度，`None` 使用原始解析度
    pub analysis_width: Option<u32>,
    pub sharpness_normalization: SharpnessNormalization,
    pub face_scoring: FaceScoringConfig,
    /// 是否在結果中保留每一幀的評分
    pub keep_all_frames: bool,
    /// 是否以多執行緒評分
    pub parallel: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            sampling: SamplingConfig::default(),
            weights: WeightConfig::default(),
            analysis_width: None,
            sharpness_normalization: SharpnessNormalization::default(),
            face_scoring: FaceScoringConfig::default(),
            keep_all_frames: false,
            parallel: true,
        }
    }
}

impl AnalyzerConfig {
    pub fn validate(&self) -> Result<()> {
        self.sampling.validate()?;
        self.weights.validate()?;

        if self.analysis_width == Some(0) {
            return Err(AnalysisError::invalid_config("分析寬度不可為 0"));
        }
        if let SharpnessNormalization::Absolute { saturation } = self.sharpness_normalization
            && (!saturation.is_finite() || saturation <= 0.0)
        {
            return Err(AnalysisError::invalid_config(format!(
                "清晰度飽和值必須為正數，目前為 {saturation}"
            )));
        }

        let face = &self.face_scoring;
        if !(face.min_fraction >= 0.0
            && face.min_fraction < face.max_fraction
            && face.ideal_fraction > 0.0
            && face.sigma > 0.0)
        {
            return Err(AnalysisError::invalid_config("人臉評分參數無效"));
        }

        Ok(())
    }
}

/// 縮圖分析器
pub struct Analyzer {
    config: AnalyzerConfig,
    detector: Arc<dyn FaceDetector>,
    cancel_signal: Option<Arc<AtomicBool>>,
}

impl Analyzer {
    /// 使用預設的膚色人臉偵測器
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        Self::with_detector(config, Arc::new(SkinToneDetector::default()))
    }

    pub fn with_detector(config: AnalyzerConfig, detector: Arc<dyn FaceDetector>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            detector,
            cancel_signal: None,
        })
    }

    /// 設定中斷旗標，在每個取樣幀之間檢查
    #[must_use]
    pub fn with_cancel_signal(mut self, signal: Arc<AtomicBool>) -> Self {
        self.cancel_signal = Some(signal);
        self
    }

    #[must_use]
    pub const fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_signal
            .as_ref()
            .is_some_and(|signal| signal.load(Ordering::SeqCst))
    }

    /// 開啟影片檔並分析
    pub fn analyze_file(
        &self,
        path: &Path,
        progress: impl FnMut(usize),
    ) -> Result<AnalysisResult> {
        let decoder = FfmpegDecoder::open(path, self.config.analysis_width)?;
        self.analyze_with_progress(decoder, progress)
    }

    pub fn analyze<S: FrameSource>(&self, source: S) -> Result<AnalysisResult> {
        self.analyze_with_progress(source, |_| {})
    }

    /// 分析任一影格來源；`progress` 在每批評分後收到已評分幀數
    pub fn analyze_with_progress<S: FrameSource>(
        &self,
        source: S,
        mut progress: impl FnMut(usize),
    ) -> Result<AnalysisResult> {
        let mut sampler = FrameSampler::new(source, &self.config.sampling)?;
        let batch_size = if self.config.parallel {
            rayon::current_num_threads().max(1)
        } else {
            1
        };

        let mut raw_scores: Vec<RawFrameScore> = Vec::new();
        let mut batch: Vec<Frame> = Vec::with_capacity(batch_size);
        let mut cancelled = false;

        loop {
            batch.clear();
            while batch.len() < batch_size {
                if self.is_cancelled() {
                    cancelled = true;
                    break;
                }
                match sampler.next() {
                    Some(Ok(frame)) => batch.push(frame),
                    // Ctrl-C 也會中斷解碼子程序，此時視為取消
                    Some(Err(e)) if self.is_cancelled() => {
                        debug!("中斷後解碼器結束: {e}");
                        cancelled = true;
                        break;
                    }
                    Some(Err(e)) => return Err(e),
                    None => break,
                }
            }

            if batch.is_empty() {
                break;
            }

            if self.config.parallel {
                let scored: Vec<RawFrameScore> =
                    batch.par_iter().map(|frame| self.score_frame(frame)).collect();
                raw_scores.extend(scored);
            } else {
                raw_scores.extend(batch.iter().map(|frame| self.score_frame(frame)));
            }

            progress(raw_scores.len());

            if cancelled || batch.len() < batch_size {
                break;
            }
        }

        if raw_scores.is_empty() {
            return Err(if cancelled {
                AnalysisError::Cancelled
            } else {
                AnalysisError::EmptyStream
            });
        }

        if cancelled {
            info!("分析已中斷，以前 {} 幀的結果為準", raw_scores.len());
        }

        let result = build_result(
            &raw_scores,
            self.config.sharpness_normalization,
            &self.config.weights,
            cancelled,
            self.config.keep_all_frames,
        )?;

        if result.detector_failures > 0 {
            warn!(
                "{}/{} 幀的人臉偵測失敗，這些幀的人臉分數記為 0",
                result.detector_failures, result.frames_sampled
            );
        }

        debug!(
            "最佳幀 #{} @ {:.2}s，總分 {:.3}",
            result.best.index, result.best.timestamp, result.best.combined
        );

        Ok(result)
    }

    /// 對單一幀執行四項評分（清晰度尚未正規化）
    #[must_use]
    pub fn score_frame(&self, frame: &Frame) -> RawFrameScore {
        let faces = evaluate_faces(frame, self.detector.as_ref(), &self.config.face_scoring);

        RawFrameScore {
            index: frame.index,
            source_index: frame.source_index,
            timestamp: frame.timestamp,
            laplacian_variance: laplacian_variance(frame),
            face: faces.score,
            face_count: faces.face_count,
            detector_failed: faces.detector_failed,
            brightness: brightness_score(frame),
            composition: composition_score(frame),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{BoundingBox, MemorySource};
    use crate::error::DetectorError;
    use image::{Rgb, RgbImage};

    fn textured(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            let v = ((x * 37 + y * 91) % 200 + 30) as u8;
            Rgb([v, v, v])
        })
    }

    fn solid(width: u32, height: u32, level: u8) -> RgbImage {
        RgbImage::from_pixel(width, height, Rgb([level, level, level]))
    }

    #[test]
    fn test_config_validation_runs_before_decoding() {
        let config = AnalyzerConfig {
            sampling: SamplingConfig { rate_fps: 0.0 },
            ..AnalyzerConfig::default()
        };
        assert!(matches!(
            Analyzer::new(config),
            Err(AnalysisError::InvalidConfig(_))
        ));

        let config = AnalyzerConfig {
            analysis_width: Some(0),
            ..AnalyzerConfig::default()
        };
        assert!(Analyzer::new(config).is_err());
    }

    #[test]
    fn test_solid_frame_scores_zero_on_three_metrics() {
        let analyzer = Analyzer::new(AnalyzerConfig::default()).unwrap();
        let frame = Frame::new(0, 0, 0.0, solid(64, 48, 120));
        let raw = analyzer.score_frame(&frame);

        assert!(raw.laplacian_variance.abs() < f64::EPSILON);
        assert!(raw.brightness.abs() < f64::EPSILON);
        assert!(raw.composition.abs() < f64::EPSILON);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let frames: Vec<RgbImage> = (0..40)
            .map(|i| if i % 7 == 3 { textured(48, 32) } else { solid(48, 32, (i * 5) as u8) })
            .collect();

        let run = |parallel: bool| {
            let config = AnalyzerConfig {
                sampling: SamplingConfig { rate_fps: 10.0 },
                parallel,
                keep_all_frames: true,
                ..AnalyzerConfig::default()
            };
            Analyzer::new(config)
                .unwrap()
                .analyze(MemorySource::new(frames.clone(), 10.0))
                .unwrap()
        };

        let sequential = run(false);
        let parallel = run(true);
        assert_eq!(sequential, parallel);
        assert_eq!(sequential.frames_sampled, 40);
    }

    #[test]
    fn test_empty_source_is_empty_stream() {
        let analyzer = Analyzer::new(AnalyzerConfig::default()).unwrap();
        let result = analyzer.analyze(MemorySource::new(Vec::new(), 30.0));
        assert!(matches!(result, Err(AnalysisError::EmptyStream)));
    }

    #[test]
    fn test_cancel_before_first_frame() {
        let signal = Arc::new(AtomicBool::new(true));
        let analyzer = Analyzer::new(AnalyzerConfig::default())
            .unwrap()
            .with_cancel_signal(signal);
        let result = analyzer.analyze(MemorySource::new(vec![solid(8, 8, 0)], 30.0));
        assert!(matches!(result, Err(AnalysisError::Cancelled)));
    }

    #[test]
    fn test_progress_reports_total() {
        let analyzer = Analyzer::new(AnalyzerConfig {
            sampling: SamplingConfig { rate_fps: 30.0 },
            ..AnalyzerConfig::default()
        })
        .unwrap();
        let mut last = 0;
        analyzer
            .analyze_with_progress(MemorySource::new(vec![solid(8, 8, 9); 12], 30.0), |done| {
                assert!(done >= last);
                last = done;
            })
            .unwrap();
        assert_eq!(last, 12);
    }

    struct BrokenDetector;

    impl FaceDetector for BrokenDetector {
        fn detect(&self, _frame: &Frame) -> std::result::Result<Vec<BoundingBox>, DetectorError> {
            Err(DetectorError::new("backend unavailable"))
        }
    }

    #[test]
    fn test_detector_failures_do_not_abort() {
        let config = AnalyzerConfig {
            sampling: SamplingConfig { rate_fps: 10.0 },
            ..AnalyzerConfig::default()
        };
        let result = Analyzer::with_detector(config, Arc::new(BrokenDetector))
            .unwrap()
            .analyze(MemorySource::new(vec![textured(32, 32); 6], 10.0))
            .unwrap();

        assert_eq!(result.frames_sampled, 6);
        assert_eq!(result.detector_failures, 6);
        assert!(result.best.scores.face.abs() < f64::EPSILON);
    }
}
