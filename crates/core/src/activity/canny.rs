//! Dual-threshold hysteresis edge detection.
//!
//! 3x3 Sobel gradients with replicated borders, L1 magnitude, non-maximum
//! suppression along the gradient direction quantized to four bins, then
//! 8-connected hysteresis from strong pixels into weak ones.

use crate::shared::frame::Frame;

/// tan(22.5°) in Q15 fixed point.
const TG22: i64 = 13573;

const EDGE: u8 = 255;

#[derive(Clone, Copy, PartialEq)]
enum Class {
    None,
    Weak,
    Strong,
}

/// Binary edge map: 255 marks an edge pixel, 0 everything else.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeMap {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl EdgeMap {
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_edge(&self, x: u32, y: u32) -> bool {
        self.data[(y * self.width + x) as usize] == EDGE
    }

    pub fn edge_count(&self) -> usize {
        self.data.iter().filter(|&&v| v > 0).count()
    }

    /// Fraction of pixels that are edges, in `[0, 1]`.
    pub fn density(&self) -> f64 {
        let total = self.data.len();
        if total == 0 {
            return 0.0;
        }
        self.edge_count() as f64 / total as f64
    }

    pub fn into_frame(self) -> Frame {
        Frame::grayscale(self.data, self.width, self.height)
    }
}

/// Compute the edge map of a grayscale frame.
///
/// Gradient magnitudes above `high` seed edges; magnitudes above `low` join
/// an edge only when connected to a seed. The thresholds are swapped if
/// given in the wrong order.
pub fn detect_edges(gray: &Frame, low: i32, high: i32) -> EdgeMap {
    debug_assert!(gray.is_grayscale());
    let (low, high) = if low > high { (high, low) } else { (low, high) };
    let w = gray.width() as usize;
    let h = gray.height() as usize;

    let (dx, dy) = sobel(gray.data(), w, h);
    let mag: Vec<i32> = dx.iter().zip(&dy).map(|(a, b)| a.abs() + b.abs()).collect();

    let mut classes = vec![Class::None; w * h];
    let mut stack = Vec::new();
    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            let m = mag[i];
            if m <= low || !is_local_maximum(&mag, w, h, x, y, dx[i], dy[i]) {
                continue;
            }
            if m > high {
                classes[i] = Class::Strong;
                stack.push(i);
            } else {
                classes[i] = Class::Weak;
            }
        }
    }

    while let Some(i) = stack.pop() {
        let x = (i % w) as isize;
        let y = (i / w) as isize;
        for ny in y - 1..=y + 1 {
            for nx in x - 1..=x + 1 {
                if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                    continue;
                }
                let n = ny as usize * w + nx as usize;
                if classes[n] == Class::Weak {
                    classes[n] = Class::Strong;
                    stack.push(n);
                }
            }
        }
    }

    let data = classes
        .into_iter()
        .map(|c| if c == Class::Strong { EDGE } else { 0 })
        .collect();
    EdgeMap {
        data,
        width: gray.width(),
        height: gray.height(),
    }
}

/// Horizontal and vertical 3x3 Sobel responses with replicated borders.
fn sobel(data: &[u8], w: usize, h: usize) -> (Vec<i32>, Vec<i32>) {
    let at = |x: isize, y: isize| -> i32 {
        let cx = x.clamp(0, w as isize - 1) as usize;
        let cy = y.clamp(0, h as isize - 1) as usize;
        data[cy * w + cx] as i32
    };

    let mut dx = vec![0i32; w * h];
    let mut dy = vec![0i32; w * h];
    for y in 0..h as isize {
        for x in 0..w as isize {
            let i = y as usize * w + x as usize;
            dx[i] = (at(x + 1, y - 1) + 2 * at(x + 1, y) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2 * at(x - 1, y) + at(x - 1, y + 1));
            dy[i] = (at(x - 1, y + 1) + 2 * at(x, y + 1) + at(x + 1, y + 1))
                - (at(x - 1, y - 1) + 2 * at(x, y - 1) + at(x + 1, y - 1));
        }
    }
    (dx, dy)
}

/// Non-maximum suppression. Neighbours outside the frame have magnitude 0.
///
/// Along the axes, ties resolve toward the earlier neighbour (strict `>`
/// before, `>=` after) so a plateau yields exactly one edge pixel. Diagonal
/// directions require a strict maximum on both sides.
fn is_local_maximum(
    mag: &[i32],
    w: usize,
    h: usize,
    x: usize,
    y: usize,
    gx: i32,
    gy: i32,
) -> bool {
    let m = mag[y * w + x];
    let at = |ox: isize, oy: isize| -> i32 {
        let nx = x as isize + ox;
        let ny = y as isize + oy;
        if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
            0
        } else {
            mag[ny as usize * w + nx as usize]
        }
    };

    let ax = (gx as i64).abs();
    let ay = (gy as i64).abs() << 15;
    let tg22x = ax * TG22;

    if ay < tg22x {
        // Mostly horizontal gradient: compare left/right
        m > at(-1, 0) && m >= at(1, 0)
    } else {
        let tg67x = tg22x + (ax << 16);
        if ay > tg67x {
            m > at(0, -1) && m >= at(0, 1)
        } else {
            let s: isize = if (gx ^ gy) < 0 { -1 } else { 1 };
            m > at(-s, -1) && m > at(s, 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOW: i32 = 50;
    const HIGH: i32 = 150;

    fn frame_from_fn(w: u32, h: u32, f: impl Fn(u32, u32) -> u8) -> Frame {
        let mut data = Vec::with_capacity((w * h) as usize);
        for y in 0..h {
            for x in 0..w {
                data.push(f(x, y));
            }
        }
        Frame::grayscale(data, w, h)
    }

    /// 3x3 magnitudes with the centre at 100.
    fn centre_mag(neighbours: &[((usize, usize), i32)]) -> Vec<i32> {
        let mut mag = vec![0; 9];
        mag[4] = 100;
        for &((x, y), m) in neighbours {
            mag[y * 3 + x] = m;
        }
        mag
    }

    #[test]
    fn test_diagonal_tie_is_suppressed_on_either_side() {
        // Gradient along the main diagonal: neighbours (0,0) and (2,2)
        let tie_after = centre_mag(&[((0, 0), 50), ((2, 2), 100)]);
        assert!(!is_local_maximum(&tie_after, 3, 3, 1, 1, 10, 10));
        let tie_before = centre_mag(&[((0, 0), 100), ((2, 2), 50)]);
        assert!(!is_local_maximum(&tie_before, 3, 3, 1, 1, 10, 10));
        let strict = centre_mag(&[((0, 0), 99), ((2, 2), 99)]);
        assert!(is_local_maximum(&strict, 3, 3, 1, 1, 10, 10));
    }

    #[test]
    fn test_anti_diagonal_tie_is_suppressed() {
        // Opposite gradient signs compare (2,0) and (0,2)
        let tie = centre_mag(&[((2, 0), 50), ((0, 2), 100)]);
        assert!(!is_local_maximum(&tie, 3, 3, 1, 1, 10, -10));
        let strict = centre_mag(&[((2, 0), 50), ((0, 2), 99)]);
        assert!(is_local_maximum(&strict, 3, 3, 1, 1, 10, -10));
    }

    #[test]
    fn test_axis_tie_keeps_the_earlier_pixel() {
        let tie_after = centre_mag(&[((0, 1), 50), ((2, 1), 100)]);
        assert!(is_local_maximum(&tie_after, 3, 3, 1, 1, 10, 0));
        let tie_before = centre_mag(&[((0, 1), 100), ((2, 1), 50)]);
        assert!(!is_local_maximum(&tie_before, 3, 3, 1, 1, 10, 0));
    }

    #[test]
    fn test_black_frame_has_no_edges() {
        let edges = detect_edges(&frame_from_fn(64, 48, |_, _| 0), LOW, HIGH);
        assert_eq!(edges.edge_count(), 0);
        assert_eq!(edges.density(), 0.0);
    }

    #[test]
    fn test_flat_frame_has_no_edges() {
        let edges = detect_edges(&frame_from_fn(64, 48, |_, _| 180), LOW, HIGH);
        assert_eq!(edges.edge_count(), 0);
    }

    #[test]
    fn test_step_edge_is_one_pixel_wide() {
        let gray = frame_from_fn(64, 48, |x, _| if x < 32 { 0 } else { 255 });
        let edges = detect_edges(&gray, LOW, HIGH);
        assert_eq!(edges.edge_count(), 48);
        for y in 0..48 {
            assert!(edges.is_edge(31, y), "row {y} missing edge");
        }
    }

    #[test]
    fn test_horizontal_step_edge() {
        let gray = frame_from_fn(64, 48, |_, y| if y < 20 { 200 } else { 10 });
        let edges = detect_edges(&gray, LOW, HIGH);
        assert_eq!(edges.edge_count(), 64);
        for x in 0..64 {
            assert!(edges.is_edge(x, 19));
        }
    }

    #[test]
    fn test_weak_edges_alone_are_dropped() {
        // |dx| = 4 * 20 = 80: above low, below high
        let gray = frame_from_fn(64, 48, |x, _| if x < 32 { 0 } else { 20 });
        assert_eq!(detect_edges(&gray, LOW, HIGH).edge_count(), 0);
    }

    #[test]
    fn test_weak_edges_connected_to_strong_are_kept() {
        // Upper half strong contrast (160), lower half weak (80)
        let gray = frame_from_fn(64, 48, |x, y| match (x < 32, y < 24) {
            (true, _) => 0,
            (false, true) => 40,
            (false, false) => 20,
        });
        let edges = detect_edges(&gray, LOW, HIGH);
        for y in 30..48 {
            assert!(edges.is_edge(31, y), "row {y} should inherit strong edge");
        }
    }

    #[test]
    fn test_swapped_thresholds_behave_the_same() {
        let gray = frame_from_fn(64, 48, |x, y| ((x * 7 + y * 13) % 256) as u8);
        assert_eq!(
            detect_edges(&gray, HIGH, LOW),
            detect_edges(&gray, LOW, HIGH)
        );
    }

    #[test]
    fn test_into_frame_is_grayscale() {
        let gray = frame_from_fn(8, 8, |x, _| if x < 4 { 0 } else { 255 });
        let frame = detect_edges(&gray, LOW, HIGH).into_frame();
        assert!(frame.is_grayscale());
        assert_eq!(frame.width(), 8);
    }
}
