//! 以 ffmpeg 子程序解碼影片
//!
//! ffmpeg 將每一幀以 rgb24 rawvideo 格式寫到 stdout，這裡依序讀取固定大小的區塊。
//! 子程序在 `Drop` 時一定會被終止並回收。

use super::ffprobe_info::{VideoInfo, get_video_info};
use crate::analyzer::{FrameSource, StreamInfo};
use crate::error::{AnalysisError, Result};
use image::RgbImage;
use log::{debug, warn};
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

pub struct FfmpegDecoder {
    path: PathBuf,
    video_info: VideoInfo,
    stream_info: StreamInfo,
    child: Child,
    stdout: ChildStdout,
    stderr_reader: Option<JoinHandle<String>>,
    frame_size: usize,
    frames_read: u64,
    finished: bool,
}

/// 計算分析用的輸出尺寸（保持比例、偶數邊長），不放大
#[must_use]
pub fn scaled_dimensions(width: u32, height: u32, target_width: Option<u32>) -> (u32, u32) {
    match target_width {
        Some(target) if target > 0 && target < width => {
            let even = |v: u32| (v / 2 * 2).max(2);
            let scaled_height = (f64::from(height) * f64::from(target) / f64::from(width)).round();
            (even(target), even(scaled_height as u32))
        }
        _ => (width, height),
    }
}

/// 組出 ffmpeg 解碼參數
///
/// 以固定幀率輸出，第 n 幀的時間點即為 n / fps
#[must_use]
pub fn build_decode_args(path: &Path, video_info: &VideoInfo, size: (u32, u32)) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-noautorotate".to_string(),
        "-i".to_string(),
        path.to_string_lossy().to_string(),
        "-an".to_string(),
        "-sn".to_string(),
        "-dn".to_string(),
    ];
    if size != (video_info.width, video_info.height) {
        args.push("-vf".to_string());
        args.push(format!("scale={}:{}", size.0, size.1));
    }
    args.extend([
        "-fps_mode".to_string(),
        "cfr".to_string(),
        "-r".to_string(),
        format!("{}", video_info.frame_rate),
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pix_fmt".to_string(),
        "rgb24".to_string(),
        "-".to_string(),
    ]);
    args
}

/// 讀滿緩衝區；回傳實際讀到的位元組數，串流結束時可能不足
fn read_full(reader: &mut impl Read, buffer: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

impl FfmpegDecoder {
    /// 開啟影片；`analysis_width` 指定時先縮小再輸出
    pub fn open(path: &Path, analysis_width: Option<u32>) -> Result<Self> {
        let video_info = get_video_info(path)?;
        Self::with_info(path, video_info, analysis_width)
    }

    /// 以已探測的影片資訊開啟，不再重複執行 ffprobe
    pub fn with_info(
        path: &Path,
        video_info: VideoInfo,
        analysis_width: Option<u32>,
    ) -> Result<Self> {
        let (width, height) = scaled_dimensions(video_info.width, video_info.height, analysis_width);

        debug!(
            "開啟影片 {}: {} @ {:.3} fps，分析尺寸 {width}x{height}",
            path.display(),
            video_info.resolution(),
            video_info.frame_rate
        );

        let mut command = Command::new("ffmpeg");
        command.args(build_decode_args(path, &video_info, (width, height)));
        Self::spawn(path, video_info, (width, height), command)
    }

    /// 啟動解碼子程序，stdout 須輸出 `size` 大小的 rgb24 影格
    fn spawn(
        path: &Path,
        video_info: VideoInfo,
        (width, height): (u32, u32),
        mut command: Command,
    ) -> Result<Self> {
        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AnalysisError::decode(path, format!("無法執行 ffmpeg: {e}")))?;

        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(AnalysisError::decode(path, "無法取得 ffmpeg 輸出"));
        };

        // stderr 另開執行緒讀完，避免管線塞滿造成死結
        let stderr_reader = child.stderr.take().map(|mut stderr| {
            std::thread::spawn(move || {
                let mut message = String::new();
                let _ = stderr.read_to_string(&mut message);
                message
            })
        });

        let stream_info = StreamInfo {
            width,
            height,
            fps: video_info.frame_rate,
            frame_count: Some(video_info.frame_count).filter(|&n| n > 0),
        };

        Ok(Self {
            path: path.to_path_buf(),
            video_info,
            stream_info,
            child,
            stdout,
            stderr_reader,
            frame_size: width as usize * height as usize * 3,
            frames_read: 0,
            finished: false,
        })
    }

    #[must_use]
    pub const fn video_info(&self) -> &VideoInfo {
        &self.video_info
    }

    /// 串流結束：等待 ffmpeg 結束並檢查結束碼
    ///
    /// 非零結束碼一律視為解碼失敗，即使已讀到部分幀
    fn finish(&mut self) -> Result<()> {
        self.finished = true;
        let status = self.child.wait()?;
        let stderr = self
            .stderr_reader
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        if status.success() {
            return Ok(());
        }

        Err(AnalysisError::decode(
            &self.path,
            format!(
                "ffmpeg 在第 {} 幀後異常結束 ({status}): {}",
                self.frames_read,
                stderr.trim()
            ),
        ))
    }
}

impl FrameSource for FfmpegDecoder {
    fn info(&self) -> &StreamInfo {
        &self.stream_info
    }

    fn next_frame(&mut self) -> Result<Option<RgbImage>> {
        if self.finished {
            return Ok(None);
        }

        let mut buffer = vec![0u8; self.frame_size];
        let filled = read_full(&mut self.stdout, &mut buffer)?;

        if filled < self.frame_size {
            if filled > 0 {
                warn!("最後一幀資料不完整（{filled}/{} bytes），已略過", self.frame_size);
            }
            self.finish()?;
            return Ok(None);
        }

        self.frames_read += 1;
        let image = RgbImage::from_raw(self.stream_info.width, self.stream_info.height, buffer)
            .ok_or_else(|| AnalysisError::decode(&self.path, "影格資料長度不符"))?;
        Ok(Some(image))
    }
}

impl Drop for FfmpegDecoder {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // 提前結束（取消或錯誤）時終止子程序
        let _ = self.child.kill();
        let _ = self.child.wait();
        if let Some(handle) = self.stderr_reader.take() {
            let _ = handle.join();
        }
        debug!(
            "已關閉解碼器 {}（讀取 {} 幀）",
            self.path.display(),
            self.frames_read
        );
    }
}
