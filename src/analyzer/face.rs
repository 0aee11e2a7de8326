//! 人臉清晰度評分
//!
//! 偵測器可替換（`FaceDetector`），評分只依賴回傳的方框：
//! 每張臉依面積比例給分，峰值在「人像理想大小」，再依人臉數量遞減。

use super::frame::Frame;
use crate::error::DetectorError;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// 人臉方框（像素座標）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    #[must_use]
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// 裁切到畫面範圍內
    #[must_use]
    pub fn clamp_to(&self, frame_width: u32, frame_height: u32) -> Self {
        let x = self.x.min(frame_width);
        let y = self.y.min(frame_height);
        Self {
            x,
            y,
            width: self.width.min(frame_width - x),
            height: self.height.min(frame_height - y),
        }
    }
}

/// 可替換的人臉偵測後端
pub trait FaceDetector: Send + Sync {
    fn detect(&self, frame: &Frame) -> Result<Vec<BoundingBox>, DetectorError>;
}

/// 人臉評分曲線參數
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceScoringConfig {
    /// 低於此面積比例的人臉不計分
    pub min_fraction: f64,
    /// 高於此面積比例的人臉不計分
    pub max_fraction: f64,
    /// 人像理想面積比例（高斯峰值）
    pub ideal_fraction: f64,
    /// 對數空間的高斯寬度
    pub sigma: f64,
    /// 超過此數量開始扣分
    pub crowd_threshold: usize,
    /// 每多一張臉扣的比例
    pub crowd_decay: f64,
    /// 人數係數下限
    pub crowd_floor: f64,
}

impl Default for FaceScoringConfig {
    fn default() -> Self {
        Self {
            min_fraction: 0.005,
            max_fraction: 0.60,
            ideal_fraction: 0.08,
            sigma: 0.9,
            crowd_threshold: 2,
            crowd_decay: 0.15,
            crowd_floor: 0.25,
        }
    }
}

impl FaceScoringConfig {
    /// 單張臉的大小分數
    #[must_use]
    pub fn size_quality(&self, fraction: f64) -> f64 {
        if !(self.min_fraction..=self.max_fraction).contains(&fraction) {
            return 0.0;
        }
        let distance = (fraction / self.ideal_fraction).ln();
        (-(distance * distance) / (2.0 * self.sigma * self.sigma)).exp()
    }

    /// 人數係數：1~2 人為 1，之後線性遞減至下限
    #[must_use]
    pub fn crowd_factor(&self, count: usize) -> f64 {
        if count <= self.crowd_threshold {
            return 1.0;
        }
        let extra = (count - self.crowd_threshold) as f64;
        (1.0 - self.crowd_decay * extra).max(self.crowd_floor)
    }

    /// 由方框計算 [0,1] 分數
    #[must_use]
    pub fn score_boxes(&self, boxes: &[BoundingBox], frame_area: u64) -> f64 {
        if boxes.is_empty() || frame_area == 0 {
            return 0.0;
        }

        let best = boxes
            .iter()
            .map(|b| self.size_quality(b.area() as f64 / frame_area as f64))
            .fold(0.0, f64::max);

        (best * self.crowd_factor(boxes.len())).clamp(0.0, 1.0)
    }
}

/// 單幀人臉評分結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceEvaluation {
    pub score: f64,
    pub face_count: usize,
    pub detector_failed: bool,
}

/// 執行偵測並評分；偵測器失敗時該幀記 0 分，不中斷分析
#[must_use]
pub fn evaluate_faces(
    frame: &Frame,
    detector: &dyn FaceDetector,
    config: &FaceScoringConfig,
) -> FaceEvaluation {
    match detector.detect(frame) {
        Ok(boxes) => {
            let boxes: Vec<BoundingBox> = boxes
                .iter()
                .map(|b| b.clamp_to(frame.width(), frame.height()))
                .filter(|b| b.area() > 0)
                .collect();
            FaceEvaluation {
                score: config.score_boxes(&boxes, frame.area()),
                face_count: boxes.len(),
                detector_failed: false,
            }
        }
        Err(e) => {
            warn!("第 {} 幀 ({:.2}s) {e}，人臉分數記為 0", frame.index, frame.timestamp);
            FaceEvaluation {
                score: 0.0,
                face_count: 0,
                detector_failed: true,
            }
        }
    }
}

/// 膚色區塊偵測器（預設後端）
///
/// 以 YCbCr 膚色範圍分類像素，按固定大小的格子統計，
/// 取 4 連通的膚色格子群組，再以面積、長寬比與填滿率過濾。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkinToneDetector {
    pub cell_size: u32,
    /// 格子內膚色像素比例達此值才算膚色格
    pub cell_coverage: f64,
    /// 候選區塊最小面積比例
    pub min_area_fraction: f64,
    /// 高 / 寬 的允許範圍
    pub min_aspect: f64,
    pub max_aspect: f64,
    /// 區塊格子數 / 外框格子數 的下限
    pub min_fill: f64,
}

impl Default for SkinToneDetector {
    fn default() -> Self {
        Self {
            cell_size: 8,
            cell_coverage: 0.5,
            min_area_fraction: 0.002,
            min_aspect: 0.8,
            max_aspect: 2.2,
            min_fill: 0.45,
        }
    }
}

impl SkinToneDetector {
    /// YCbCr 膚色判斷（Chai & Ngan 範圍）
    #[must_use]
    pub fn is_skin(r: u8, g: u8, b: u8) -> bool {
        let (r, g, b) = (f64::from(r), f64::from(g), f64::from(b));
        let cb = 128.0 - 0.168_736 * r - 0.331_264 * g + 0.5 * b;
        let cr = 128.0 + 0.5 * r - 0.418_688 * g - 0.081_312 * b;
        (77.0..=127.0).contains(&cb) && (133.0..=173.0).contains(&cr)
    }

    fn skin_cells(&self, frame: &Frame, cols: u32, rows: u32) -> Vec<bool> {
        let cell = self.cell_size;
        let rgb = frame.rgb();
        let mut cells = vec![false; (cols * rows) as usize];

        for row in 0..rows {
            for col in 0..cols {
                let mut skin = 0u32;
                for y in row * cell..(row + 1) * cell {
                    for x in col * cell..(col + 1) * cell {
                        let p = rgb.get_pixel(x, y).0;
                        skin += u32::from(Self::is_skin(p[0], p[1], p[2]));
                    }
                }
                cells[(row * cols + col) as usize] =
                    f64::from(skin) >= self.cell_coverage * f64::from(cell * cell);
            }
        }

        cells
    }
}

impl FaceDetector for SkinToneDetector {
    fn detect(&self, frame: &Frame) -> Result<Vec<BoundingBox>, DetectorError> {
        if self.cell_size == 0 {
            return Err(DetectorError::new("格子大小不可為 0"));
        }
        if frame.width() == 0 || frame.height() == 0 {
            return Err(DetectorError::new("影格尺寸為 0"));
        }

        let cell = self.cell_size;
        let cols = frame.width() / cell;
        let rows = frame.height() / cell;
        if cols == 0 || rows == 0 {
            return Ok(Vec::new());
        }

        let cells = self.skin_cells(frame, cols, rows);
        let mut visited = vec![false; cells.len()];
        let mut faces = Vec::new();
        let min_cells = (self.min_area_fraction * f64::from(cols * rows)).max(1.0);

        for start in 0..cells.len() {
            if !cells[start] || visited[start] {
                continue;
            }

            // BFS 收集連通區塊並記錄外框
            let mut queue = VecDeque::from([start]);
            visited[start] = true;
            let (mut min_c, mut max_c, mut min_r, mut max_r) = (cols, 0, rows, 0);
            let mut size = 0u32;

            while let Some(idx) = queue.pop_front() {
                let (c, r) = (idx as u32 % cols, idx as u32 / cols);
                size += 1;
                min_c = min_c.min(c);
                max_c = max_c.max(c);
                min_r = min_r.min(r);
                max_r = max_r.max(r);

                let neighbors = [
                    (c > 0).then(|| idx - 1),
                    (c + 1 < cols).then(|| idx + 1),
                    (r > 0).then(|| idx - cols as usize),
                    (r + 1 < rows).then(|| idx + cols as usize),
                ];
                for next in neighbors.into_iter().flatten() {
                    if cells[next] && !visited[next] {
                        visited[next] = true;
                        queue.push_back(next);
                    }
                }
            }

            let box_cols = max_c - min_c + 1;
            let box_rows = max_r - min_r + 1;
            let aspect = f64::from(box_rows) / f64::from(box_cols);
            let fill = f64::from(size) / f64::from(box_cols * box_rows);

            if f64::from(size) >= min_cells
                && (self.min_aspect..=self.max_aspect).contains(&aspect)
                && fill >= self.min_fill
            {
                faces.push(BoundingBox::new(
                    min_c * cell,
                    min_r * cell,
                    box_cols * cell,
                    box_rows * cell,
                ));
            }
        }

        Ok(faces)
    }
}
