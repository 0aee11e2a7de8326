//! 縮圖美感分析核心
//!
//! 流程：
//! 1. 取樣器依設定的取樣率逐幀輸出
//! 2. 四項評分器（清晰度、人臉、亮度、構圖）各自獨立評分
//! 3. 合併器正規化、加權並選出最佳幀

mod aggregator;
mod brightness;
mod composition;
mod face;
mod frame;
mod pipeline;
mod sampler;
mod sharpness;

pub use aggregator::{
    AnalysisResult, FrameScore, RawFrameScore, ScoreVector, WeightConfig, build_result,
    finalize_scores, select_best,
};
pub use brightness::{BrightnessStats, brightness_score, brightness_stats, score_from_stats};
pub use composition::{
    CompositionBreakdown, EDGE_MAGNITUDE_THRESHOLD, EdgeMap, analyze_edges,
    composition_breakdown, composition_score, thirds_points,
};
pub use face::{
    BoundingBox, FaceDetector, FaceEvaluation, FaceScoringConfig, SkinToneDetector,
    evaluate_faces,
};
pub use frame::Frame;
pub use pipeline::{Analyzer, AnalyzerConfig};
pub use sampler::{
    DEFAULT_SAMPLING_RATE_FPS, FrameSampler, FrameSource, MemorySource, SamplingConfig,
    StreamInfo,
};
pub use sharpness::{
    DEFAULT_ABSOLUTE_SATURATION, SharpnessNormalization, laplacian_variance,
    laplacian_variance_of, normalize_variance,
};
