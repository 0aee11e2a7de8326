use super::ffprobe_info::VideoInfo;
use anyhow::{Context, Result, bail};
use image::RgbImage;
use log::debug;
use std::path::Path;
use std::process::Command;

/// 兩段式 seek 的前置緩衝時間（秒）
const SEEK_MARGIN: f64 = 2.0;

/// 建立兩段式 seek 的 ffmpeg 參數
///
/// 1. `-ss` 在 `-i` 前：快速跳轉到最近的關鍵幀
/// 2. `-ss` 在 `-i` 後：精準解碼到目標時間點
fn build_grab_args(video_path: &Path, timestamp: f64) -> Vec<String> {
    let t0 = (timestamp - SEEK_MARGIN).max(0.0);
    let delta = timestamp - t0;

    let mut args = vec![
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-noautorotate".to_string(),
    ];

    if t0 > 0.0 {
        args.push("-ss".to_string());
        args.push(format!("{t0:.3}"));
    }

    args.push("-i".to_string());
    args.push(video_path.to_string_lossy().to_string());

    if delta > 0.0 {
        args.push("-ss".to_string());
        args.push(format!("{delta:.3}"));
    }

    args.extend([
        "-frames:v".to_string(),
        "1".to_string(),
        "-an".to_string(),
        "-sn".to_string(),
        "-dn".to_string(),
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pix_fmt".to_string(),
        "rgb24".to_string(),
        "-".to_string(),
    ]);

    args
}

/// 以原始解析度擷取指定時間點的影格
pub fn grab_frame(video_path: &Path, timestamp: f64, info: &VideoInfo) -> Result<RgbImage> {
    let args = build_grab_args(video_path, timestamp);
    debug!("擷取影格 {:.3}s: ffmpeg {}", timestamp, args.join(" "));

    let output = Command::new("ffmpeg")
        .args(&args)
        .output()
        .with_context(|| format!("無法執行 ffmpeg 擷取影格: {}", video_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("ffmpeg 擷取影格失敗: {}", stderr.trim());
    }

    let expected = info.width as usize * info.height as usize * 3;
    if output.stdout.len() < expected {
        bail!(
            "擷取的影格資料不足: 需要 {expected} bytes，只有 {} bytes",
            output.stdout.len()
        );
    }

    let mut data = output.stdout;
    data.truncate(expected);
    RgbImage::from_raw(info.width, info.height, data).context("影格資料長度不符")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(args: &[String], value: &str) -> Vec<usize> {
        args.iter()
            .enumerate()
            .filter(|(_, a)| a.as_str() == value)
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn test_grab_args_two_phase_seek() {
        let args = build_grab_args(Path::new("/videos/clip.mp4"), 10.5);
        let seeks = position(&args, "-ss");
        let input = position(&args, "-i")[0];

        assert_eq!(seeks.len(), 2);
        assert!(seeks[0] < input && seeks[1] > input);
        assert_eq!(args[seeks[0] + 1], "8.500");
        assert_eq!(args[seeks[1] + 1], "2.000");
    }

    #[test]
    fn test_grab_args_near_start_skips_fast_seek() {
        let args = build_grab_args(Path::new("/videos/clip.mp4"), 1.25);
        let seeks = position(&args, "-ss");
        assert_eq!(seeks.len(), 1);
        assert_eq!(args[seeks[0] + 1], "1.250");
    }

    #[test]
    fn test_grab_args_at_zero_has_no_seek() {
        let args = build_grab_args(Path::new("/videos/clip.mp4"), 0.0);
        assert!(position(&args, "-ss").is_empty());
        assert_eq!(args.last().map(String::as_str), Some("-"));
    }
}
