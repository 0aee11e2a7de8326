use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub duration_seconds: f64,
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    /// 容器記錄的總幀數，缺少時以長度 × 幀率估算
    pub frame_count: u64,
    pub codec_name: Option<String>,
}

impl VideoInfo {
    #[must_use]
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FormatInfo>,
    streams: Option<Vec<StreamInfo>>,
}

#[derive(Deserialize)]
struct FormatInfo {
    duration: Option<String>,
}

#[derive(Deserialize)]
struct StreamInfo {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
    nb_frames: Option<String>,
    duration: Option<String>,
}

/// 使用 ffprobe 取得影片資訊
pub fn get_video_info(path: &Path) -> Result<VideoInfo> {
    if !path.is_file() {
        return Err(AnalysisError::decode(path, "檔案不存在"));
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .map_err(|e| AnalysisError::decode(path, format!("無法執行 ffprobe: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AnalysisError::decode(
            path,
            format!("ffprobe 執行失敗: {}", stderr.trim()),
        ));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_ffprobe_output(&stdout).map_err(|message| AnalysisError::decode(path, message))
}

fn parse_ffprobe_output(json: &str) -> std::result::Result<VideoInfo, String> {
    let probe: FfprobeOutput =
        serde_json::from_str(json).map_err(|e| format!("無法解析 ffprobe 輸出: {e}"))?;

    // 找到視訊串流
    let video_stream = probe
        .streams
        .as_ref()
        .and_then(|streams| {
            streams
                .iter()
                .find(|s| s.codec_type.as_deref() == Some("video"))
        })
        .ok_or("找不到視訊串流")?;

    let width = video_stream.width.ok_or("無法取得影片寬度")?;
    let height = video_stream.height.ok_or("無法取得影片高度")?;
    if width == 0 || height == 0 {
        return Err("影片尺寸為 0".to_string());
    }

    // 取得影片長度（優先從 format，其次從 stream）
    let duration_seconds = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .or(video_stream.duration.as_ref())
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    // 優先用 avg_frame_rate；r_frame_rate 在交錯或變動幀率影片會偏高
    let frame_rate = [&video_stream.avg_frame_rate, &video_stream.r_frame_rate]
        .into_iter()
        .flatten()
        .filter_map(|r| parse_frame_rate(r))
        .find(|&fps| fps > 0.0)
        .ok_or("無法取得影片幀率")?;

    let frame_count = video_stream
        .nb_frames
        .as_ref()
        .and_then(|n| n.parse::<u64>().ok())
        .filter(|&n| n > 0)
        .unwrap_or_else(|| (duration_seconds * frame_rate).round() as u64);

    Ok(VideoInfo {
        duration_seconds,
        width,
        height,
        frame_rate,
        frame_count,
        codec_name: video_stream.codec_name.clone(),
    })
}

/// 解析幀率字串（例如 "30/1" 或 "30000/1001"）
fn parse_frame_rate(rate: &str) -> Option<f64> {
    if let Some((num_str, den_str)) = rate.split_once('/') {
        let num: f64 = num_str.parse().ok()?;
        let den: f64 = den_str.parse().ok()?;
        if den > 0.0 {
            return Some(num / den);
        }
        return None;
    }
    rate.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_frame_rate_fraction() {
        assert!((parse_frame_rate("30/1").unwrap() - 30.0).abs() < 0.01);
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
    }

    #[test]
    fn test_parse_frame_rate_invalid() {
        assert!(parse_frame_rate("invalid").is_none());
        assert!(parse_frame_rate("30/0").is_none());
    }

    #[test]
    fn test_parse_ffprobe_output_full() {
        let json = r#"{
            "streams": [
                {"codec_type": "audio", "codec_name": "aac"},
                {"codec_type": "video", "codec_name": "h264", "width": 1920, "height": 1080,
                 "r_frame_rate": "30/1", "avg_frame_rate": "30/1", "nb_frames": "300"}
            ],
            "format": {"duration": "10.000000"}
        }"#;
        let info = parse_ffprobe_output(json).unwrap();
        assert_eq!(info.resolution(), "1920x1080");
        assert_eq!(info.frame_count, 300);
        assert_eq!(info.codec_name.as_deref(), Some("h264"));
        assert!((info.duration_seconds - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_ffprobe_output_falls_back_to_r_rate_and_estimated_count() {
        let json = r#"{
            "streams": [
                {"codec_type": "video", "width": 640, "height": 360,
                 "r_frame_rate": "25/1", "avg_frame_rate": "0/0"}
            ],
            "format": {"duration": "4.0"}
        }"#;
        let info = parse_ffprobe_output(json).unwrap();
        assert!((info.frame_rate - 25.0).abs() < 1e-9);
        assert_eq!(info.frame_count, 100);
    }

    #[test]
    fn test_parse_ffprobe_output_prefers_avg_rate() {
        let json = r#"{
            "streams": [
                {"codec_type": "video", "width": 1920, "height": 1080,
                 "r_frame_rate": "60/1", "avg_frame_rate": "30000/1001"}
            ],
            "format": {"duration": "10.0"}
        }"#;
        let info = parse_ffprobe_output(json).unwrap();
        assert!((info.frame_rate - 29.97).abs() < 0.01);
        assert_eq!(info.frame_count, 300);
    }

    #[test]
    fn test_parse_ffprobe_output_without_video() {
        let json = r#"{"streams": [{"codec_type": "audio"}], "format": {}}"#;
        assert!(parse_ffprobe_output(json).is_err());
    }

    #[test]
    fn test_missing_file_is_decode_error() {
        let result = get_video_info(Path::new("/definitely/not/here.mp4"));
        assert!(matches!(result, Err(AnalysisError::Decode { .. })));
    }
}
