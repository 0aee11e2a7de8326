//! 單一影片縮圖選取元件
//!
//! 流程：
//! A. 讀取影片資訊（ffprobe）並預估取樣數
//! B. 串流解碼、四項評分（進度條顯示）
//! C. 以原始解析度重新擷取最佳幀並輸出

mod exporter;
mod main;

pub use exporter::{ExportedFiles, export_thumbnail, metadata_output_path, thumbnail_output_path};
pub use main::{ThumbnailSelector, VideoAnalysis, analyze_video, print_score_breakdown};
