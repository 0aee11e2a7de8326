//! 加權合併與最佳幀選取

use super::sharpness::{SharpnessNormalization, normalize_variance};
use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

/// 四項指標的權重，不需加總為 1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightConfig {
    pub sharpness: f64,
    pub face: f64,
    pub brightness: f64,
    pub composition: f64,
}

impl Default for WeightConfig {
    /// 預設權重：清晰 0.30、人臉 0.25、亮度 0.20、構圖 0.25
    fn default() -> Self {
        Self {
            sharpness: 0.30,
            face: 0.25,
            brightness: 0.20,
            composition: 0.25,
        }
    }
}

impl WeightConfig {
    #[must_use]
    pub const fn equal() -> Self {
        Self {
            sharpness: 0.25,
            face: 0.25,
            brightness: 0.25,
            composition: 0.25,
        }
    }

    const fn as_array(&self) -> [f64; 4] {
        [self.sharpness, self.face, self.brightness, self.composition]
    }

    pub fn validate(&self) -> Result<()> {
        let names = ["sharpness", "face", "brightness", "composition"];
        for (name, value) in names.iter().zip(self.as_array()) {
            if !value.is_finite() || value < 0.0 {
                return Err(AnalysisError::invalid_config(format!(
                    "權重 {name} 必須為非負數，目前為 {value}"
                )));
            }
        }
        Ok(())
    }

    /// 正規化為總和 1；全部為 0 時改用平均權重
    #[must_use]
    pub fn normalized(&self) -> Self {
        let total: f64 = self.as_array().iter().sum();
        if total <= 0.0 {
            return Self::equal();
        }
        Self {
            sharpness: self.sharpness / total,
            face: self.face / total,
            brightness: self.brightness / total,
            composition: self.composition / total,
        }
    }

    /// 加權平均
    #[must_use]
    pub fn combine(&self, scores: &ScoreVector) -> f64 {
        let w = self.normalized();
        (w.sharpness * scores.sharpness
            + w.face * scores.face
            + w.brightness * scores.brightness
            + w.composition * scores.composition)
            .clamp(0.0, 1.0)
    }
}

/// 四項正規化分數，皆在 [0,1]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScoreVector {
    pub sharpness: f64,
    pub face: f64,
    pub brightness: f64,
    pub composition: f64,
}

/// 第一階段產生的原始評分（清晰度尚未正規化）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawFrameScore {
    pub index: usize,
    pub source_index: u64,
    pub timestamp: f64,
    pub laplacian_variance: f64,
    pub face: f64,
    pub face_count: usize,
    /// 人臉偵測器在這一幀回報錯誤
    pub detector_failed: bool,
    pub brightness: f64,
    pub composition: f64,
}

/// 單幀的完整評分
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameScore {
    pub index: usize,
    pub source_index: u64,
    pub timestamp: f64,
    pub scores: ScoreVector,
    pub face_count: usize,
    pub laplacian_variance: f64,
    pub combined: f64,
}

/// 一次分析的結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub best: FrameScore,
    pub frames_sampled: usize,
    /// 是否因中斷而提前結束
    pub cancelled: bool,
    pub weights: WeightConfig,
    /// 人臉偵測失敗（人臉分數記為 0）的幀數
    #[serde(default)]
    pub detector_failures: usize,
    /// 依時間排序的所有幀評分（需在設定中開啟）
    pub frames: Option<Vec<FrameScore>>,
}

/// 第二階段：正規化清晰度、計算合併分數
#[must_use]
pub fn finalize_scores(
    raw: &[RawFrameScore],
    normalization: SharpnessNormalization,
    weights: &WeightConfig,
) -> Vec<FrameScore> {
    let denominator = normalization.denominator(raw.iter().map(|r| r.laplacian_variance));

    raw.iter()
        .map(|r| {
            let scores = ScoreVector {
                sharpness: normalize_variance(r.laplacian_variance, denominator),
                face: r.face,
                brightness: r.brightness,
                composition: r.composition,
            };
            FrameScore {
                index: r.index,
                source_index: r.source_index,
                timestamp: r.timestamp,
                scores,
                face_count: r.face_count,
                laplacian_variance: r.laplacian_variance,
                combined: weights.combine(&scores),
            }
        })
        .collect()
}

/// 選出最高分的幀；同分時取時間最早者
#[must_use]
pub fn select_best(scores: &[FrameScore]) -> Option<&FrameScore> {
    let mut ordered: Vec<&FrameScore> = scores.iter().collect();
    ordered.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp).then(a.index.cmp(&b.index)));

    let mut best: Option<&FrameScore> = None;
    for candidate in ordered {
        if best.is_none_or(|current| candidate.combined > current.combined) {
            best = Some(candidate);
        }
    }
    best
}

/// 組合最終結果
pub fn build_result(
    raw: &[RawFrameScore],
    normalization: SharpnessNormalization,
    weights: &WeightConfig,
    cancelled: bool,
    keep_all_frames: bool,
) -> Result<AnalysisResult> {
    let scores = finalize_scores(raw, normalization, weights);
    let best = *select_best(&scores).ok_or(AnalysisError::EmptyStream)?;

    Ok(AnalysisResult {
        best,
        frames_sampled: scores.len(),
        cancelled,
        weights: *weights,
        detector_failures: raw.iter().filter(|r| r.detector_failed).count(),
        frames: keep_all_frames.then_some(scores),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(index: usize, variance: f64, face: f64, brightness: f64, composition: f64) -> RawFrameScore {
        RawFrameScore {
            index,
            source_index: index as u64 * 60,
            timestamp: index as f64 * 2.0,
            laplacian_variance: variance,
            face,
            face_count: usize::from(face > 0.0),
            detector_failed: false,
            brightness,
            composition,
        }
    }

    #[test]
    fn test_equal_weights_give_mean() {
        let scores = ScoreVector {
            sharpness: 0.8,
            face: 0.2,
            brightness: 0.5,
            composition: 0.1,
        };
        for w in [0.25, 1.0, 7.5] {
            let weights = WeightConfig {
                sharpness: w,
                face: w,
                brightness: w,
                composition: w,
            };
            assert!((weights.combine(&scores) - 0.4).abs() < 1e-12);
        }
    }

    #[test]
    fn test_zero_weights_fall_back_to_equal() {
        let zero = WeightConfig {
            sharpness: 0.0,
            face: 0.0,
            brightness: 0.0,
            composition: 0.0,
        };
        let scores = ScoreVector {
            sharpness: 1.0,
            face: 1.0,
            brightness: 0.0,
            composition: 0.0,
        };
        let combined = zero.combine(&scores);
        assert!((combined - 0.5).abs() < 1e-12);
        assert_eq!(zero.normalized(), WeightConfig::equal());
    }

    #[test]
    fn test_weights_do_not_need_to_sum_to_one() {
        let weights = WeightConfig {
            sharpness: 3.0,
            face: 1.0,
            brightness: 0.0,
            composition: 0.0,
        };
        let scores = ScoreVector {
            sharpness: 1.0,
            face: 0.0,
            brightness: 1.0,
            composition: 1.0,
        };
        assert!((weights.combine(&scores) - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let mut weights = WeightConfig::default();
        weights.face = -0.1;
        assert!(weights.validate().is_err());
        weights.face = f64::NAN;
        assert!(weights.validate().is_err());
        assert!(WeightConfig::default().validate().is_ok());
    }

    #[test]
    fn test_tie_prefers_earliest_frame() {
        let raws = vec![
            raw(0, 10.0, 0.0, 0.2, 0.0),
            raw(1, 40.0, 0.5, 0.5, 0.5),
            raw(2, 40.0, 0.5, 0.5, 0.5),
        ];
        for _ in 0..3 {
            let result =
                build_result(&raws, SharpnessNormalization::RunMax, &WeightConfig::equal(), false, false)
                    .unwrap();
            assert_eq!(result.best.index, 1);
        }
    }

    #[test]
    fn test_selection_ignores_input_order() {
        let mut scores = finalize_scores(
            &[raw(0, 5.0, 0.0, 0.9, 0.0), raw(1, 5.0, 0.0, 0.9, 0.0)],
            SharpnessNormalization::RunMax,
            &WeightConfig::equal(),
        );
        scores.reverse();
        assert_eq!(select_best(&scores).unwrap().index, 0);
    }

    #[test]
    fn test_sharpness_is_run_relative() {
        let scores = finalize_scores(
            &[raw(0, 50.0, 0.0, 0.0, 0.0), raw(1, 200.0, 0.0, 0.0, 0.0)],
            SharpnessNormalization::RunMax,
            &WeightConfig::default(),
        );
        assert!((scores[0].scores.sharpness - 0.25).abs() < 1e-12);
        assert!((scores[1].scores.sharpness - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_input_is_empty_stream() {
        let result = build_result(&[], SharpnessNormalization::RunMax, &WeightConfig::default(), false, true);
        assert!(matches!(result, Err(AnalysisError::EmptyStream)));
    }

    #[test]
    fn test_keep_all_frames() {
        let raws = vec![raw(0, 1.0, 0.0, 0.0, 0.0), raw(1, 2.0, 0.0, 0.0, 0.0)];
        let result =
            build_result(&raws, SharpnessNormalization::RunMax, &WeightConfig::default(), true, true)
                .unwrap();
        assert!(result.cancelled);
        assert_eq!(result.frames_sampled, 2);
        assert_eq!(result.frames.unwrap().len(), 2);
    }

    #[test]
    fn test_detector_failures_are_counted() {
        let failed = RawFrameScore {
            detector_failed: true,
            ..raw(1, 5.0, 0.0, 0.4, 0.4)
        };
        let raws = vec![raw(0, 5.0, 0.6, 0.4, 0.4), failed, raw(2, 5.0, 0.0, 0.4, 0.4)];
        let result =
            build_result(&raws, SharpnessNormalization::RunMax, &WeightConfig::equal(), false, false)
                .unwrap();
        assert_eq!(result.detector_failures, 1);
        assert_eq!(result.frames_sampled, 3);
        assert_eq!(result.best.index, 0);
    }
}
