//! 構圖評分（三分法）
//!
//! 先以 Sobel 梯度強度門檻取得邊緣圖，再比較三分線交點附近與畫面正中央的
//! 邊緣密度。邊緣集中於交點附近分數高；集中於正中央或均勻散布分數低。

use super::frame::Frame;
use image::GrayImage;

/// Sobel 梯度強度門檻（最大約 1442）
pub const EDGE_MAGNITUDE_THRESHOLD: f64 = 100.0;
/// 密度比達到 1 + 此值時視為滿分
const LIFT_SATURATION: f64 = 2.0;
/// 中央集中懲罰的最大比例
const CENTER_PENALTY_WEIGHT: f64 = 0.5;

/// 二值邊緣圖
#[derive(Debug, Clone)]
pub struct EdgeMap {
    width: u32,
    height: u32,
    edges: Vec<bool>,
}

impl EdgeMap {
    /// 以 Sobel 梯度強度建立邊緣圖，邊界像素不計算
    #[must_use]
    pub fn from_gray(gray: &GrayImage, threshold: f64) -> Self {
        let (width, height) = gray.dimensions();
        let w = width as usize;
        let h = height as usize;
        let mut edges = vec![false; w * h];

        if w >= 3 && h >= 3 {
            let p = gray.as_raw();
            let at = |x: usize, y: usize| i32::from(p[y * w + x]);
            let threshold_sq = threshold * threshold;

            for y in 1..h - 1 {
                for x in 1..w - 1 {
                    let gx = (at(x + 1, y - 1) + 2 * at(x + 1, y) + at(x + 1, y + 1))
                        - (at(x - 1, y - 1) + 2 * at(x - 1, y) + at(x - 1, y + 1));
                    let gy = (at(x - 1, y + 1) + 2 * at(x, y + 1) + at(x + 1, y + 1))
                        - (at(x - 1, y - 1) + 2 * at(x, y - 1) + at(x + 1, y - 1));
                    let magnitude_sq = f64::from(gx * gx + gy * gy);
                    edges[y * w + x] = magnitude_sq >= threshold_sq;
                }
            }
        }

        Self {
            width,
            height,
            edges,
        }
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.iter().filter(|&&e| e).count()
    }

    fn is_edge(&self, x: u32, y: u32) -> bool {
        self.edges[(y * self.width + x) as usize]
    }
}

/// 軸對齊方形窗，含頭不含尾
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    x0: u32,
    y0: u32,
    x1: u32,
    y1: u32,
}

impl Window {
    fn around(cx: u32, cy: u32, radius: u32, width: u32, height: u32) -> Self {
        Self {
            x0: cx.saturating_sub(radius),
            y0: cy.saturating_sub(radius),
            x1: (cx + radius).min(width),
            y1: (cy + radius).min(height),
        }
    }

    const fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }
}

/// 構圖分析的中間結果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositionBreakdown {
    pub edge_count: usize,
    /// 交點附近的邊緣密度相對於全畫面的倍數
    pub thirds_lift: f64,
    /// 正中央的邊緣密度相對於全畫面的倍數
    pub center_lift: f64,
    pub score: f64,
}

/// 三分法交點
#[must_use]
pub fn thirds_points(width: u32, height: u32) -> [(u32, u32); 4] {
    let (tw, th) = (width / 3, height / 3);
    [(tw, th), (2 * tw, th), (tw, 2 * th), (2 * tw, 2 * th)]
}

fn window_radius(width: u32, height: u32) -> u32 {
    (width.max(height) / 12).max(1)
}

fn lift(mass: usize, total_mass: usize, area: u64, total_area: u64) -> f64 {
    if mass == 0 || total_mass == 0 || area == 0 {
        return 0.0;
    }
    (mass as f64 / total_mass as f64) / (area as f64 / total_area as f64)
}

fn lift_to_unit(lift: f64) -> f64 {
    ((lift - 1.0) / LIFT_SATURATION).clamp(0.0, 1.0)
}

#[must_use]
pub fn analyze_edges(edges: &EdgeMap) -> CompositionBreakdown {
    let (width, height) = (edges.width, edges.height);
    let edge_count = edges.edge_count();

    if edge_count == 0 {
        return CompositionBreakdown {
            edge_count,
            thirds_lift: 0.0,
            center_lift: 0.0,
            score: 0.0,
        };
    }

    let radius = window_radius(width, height);
    let thirds: Vec<Window> = thirds_points(width, height)
        .iter()
        .map(|&(x, y)| Window::around(x, y, radius, width, height))
        .collect();
    let center = Window::around(width / 2, height / 2, radius, width, height);

    let mut thirds_area = 0u64;
    let mut thirds_mass = 0usize;
    let mut center_area = 0u64;
    let mut center_mass = 0usize;

    for y in 0..height {
        for x in 0..width {
            let edge = edges.is_edge(x, y);
            if thirds.iter().any(|w| w.contains(x, y)) {
                thirds_area += 1;
                thirds_mass += usize::from(edge);
            }
            if center.contains(x, y) {
                center_area += 1;
                center_mass += usize::from(edge);
            }
        }
    }

    let total_area = u64::from(width) * u64::from(height);
    let thirds_lift = lift(thirds_mass, edge_count, thirds_area, total_area);
    let center_lift = lift(center_mass, edge_count, center_area, total_area);

    let score = (lift_to_unit(thirds_lift)
        * (1.0 - CENTER_PENALTY_WEIGHT * lift_to_unit(center_lift)))
    .clamp(0.0, 1.0);

    CompositionBreakdown {
        edge_count,
        thirds_lift,
        center_lift,
        score,
    }
}

#[must_use]
pub fn composition_breakdown(frame: &Frame) -> CompositionBreakdown {
    let edges = EdgeMap::from_gray(frame.gray(), EDGE_MAGNITUDE_THRESHOLD);
    analyze_edges(&edges)
}

#[must_use]
pub fn composition_score(frame: &Frame) -> f64 {
    composition_breakdown(frame).score
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    const W: u32 = 120;
    const H: u32 = 120;

    /// 在指定中心畫一個白色方塊（其餘為黑）
    fn squares(centers: &[(u32, u32)], half: u32) -> GrayImage {
        GrayImage::from_fn(W, H, |x, y| {
            let inside = centers.iter().any(|&(cx, cy)| {
                x + half >= cx && x < cx + half && y + half >= cy && y < cy + half
            });
            if inside { Luma([255]) } else { Luma([0]) }
        })
    }

    fn breakdown(gray: &GrayImage) -> CompositionBreakdown {
        analyze_edges(&EdgeMap::from_gray(gray, EDGE_MAGNITUDE_THRESHOLD))
    }

    #[test]
    fn test_blank_frame_scores_zero() {
        let gray = GrayImage::from_pixel(W, H, Luma([90]));
        let result = breakdown(&gray);
        assert_eq!(result.edge_count, 0);
        assert!(result.score.abs() < f64::EPSILON);
    }

    #[test]
    fn test_subject_on_thirds_point_scores_high() {
        let gray = squares(&[(40, 40)], 4);
        let result = breakdown(&gray);
        assert!(result.edge_count > 0);
        assert!(result.thirds_lift > 3.0, "lift = {}", result.thirds_lift);
        assert!(result.score > 0.9, "score = {}", result.score);
    }

    #[test]
    fn test_centered_subject_scores_lower_than_thirds() {
        let centered = breakdown(&squares(&[(60, 60)], 4));
        let thirds = breakdown(&squares(&[(40, 40)], 4));
        assert!(centered.score < thirds.score);
        assert!(centered.center_lift > 1.0);
    }

    #[test]
    fn test_uniform_texture_scores_low() {
        let gray = GrayImage::from_fn(W, H, |x, y| {
            if (x / 2 + y / 2) % 2 == 0 { Luma([0]) } else { Luma([255]) }
        });
        let result = breakdown(&gray);
        assert!(result.score < 0.2, "score = {}", result.score);
    }

    #[test]
    fn test_thirds_points() {
        let points = thirds_points(300, 150);
        assert_eq!(points, [(100, 50), (200, 50), (100, 100), (200, 100)]);
    }

    #[test]
    fn test_score_always_in_unit_range() {
        for centers in [vec![(10, 10)], vec![(40, 80), (80, 40)], vec![(60, 60), (40, 40)]] {
            let result = breakdown(&squares(&centers, 6));
            assert!((0.0..=1.0).contains(&result.score));
        }
    }
}
