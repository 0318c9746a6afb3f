use crate::shared::constants::{
    FACE_BORDER_MARGIN, MAX_FACE_AREA_RATIO, MAX_FACE_ASPECT_RATIO, MIN_FACE_AREA_RATIO,
    MIN_FACE_ASPECT_RATIO,
};
use crate::shared::face_region::FaceRegion;

/// Narrows raw detector proposals to geometrically plausible faces.
///
/// Rules, applied in order (first failure drops the candidate):
/// 1. area is between 2% and 45% of the frame, inclusive
/// 2. width / height is between 0.75 and 1.35, inclusive
/// 3. the box starts at least 10 px from the top and left edges
///
/// Survivors keep their input order. Overlapping boxes are not merged.
pub fn filter_faces(raw: &[FaceRegion], frame_width: u32, frame_height: u32) -> Vec<FaceRegion> {
    let frame_area = frame_width as f64 * frame_height as f64;
    raw.iter()
        .filter(|r| is_plausible_face(r, frame_area))
        .copied()
        .collect()
}

fn is_plausible_face(region: &FaceRegion, frame_area: f64) -> bool {
    if region.is_degenerate() || frame_area <= 0.0 {
        return false;
    }

    let area_ratio = region.area() / frame_area;
    if !(MIN_FACE_AREA_RATIO..=MAX_FACE_AREA_RATIO).contains(&area_ratio) {
        return false;
    }

    let aspect_ratio = region.aspect_ratio();
    if !(MIN_FACE_ASPECT_RATIO..=MAX_FACE_ASPECT_RATIO).contains(&aspect_ratio) {
        return false;
    }

    // Top/left border hits are usually partial faces
    region.x >= FACE_BORDER_MARGIN && region.y >= FACE_BORDER_MARGIN
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const W: u32 = 640;
    const H: u32 = 480;

    fn face(x: i32, y: i32, w: i32, h: i32) -> FaceRegion {
        FaceRegion::new(x, y, w, h)
    }

    #[test]
    fn test_typical_face_passes() {
        let r = face(100, 100, 200, 200);
        assert_eq!(filter_faces(&[r], W, H), vec![r]);
    }

    #[test]
    fn test_top_left_corner_is_rejected() {
        assert!(filter_faces(&[face(0, 0, 50, 50)], W, H).is_empty());
    }

    #[test]
    fn test_elongated_box_is_rejected() {
        // area ratio ≈ 0.098 is in range, aspect 3.0 is not
        assert!(filter_faces(&[face(100, 100, 300, 100)], W, H).is_empty());
    }

    #[rstest]
    #[case::too_small(face(100, 100, 70, 70), false)] // 0.0159
    #[case::smallest_ok(face(100, 100, 80, 80), true)] // 0.0208
    #[case::largest_ok(face(100, 20, 370, 370), true)] // 0.4457
    #[case::too_large(face(100, 20, 400, 400), false)] // 0.5208
    fn test_area_ratio_bounds(#[case] region: FaceRegion, #[case] keep: bool) {
        assert_eq!(filter_faces(&[region], W, H).len() == 1, keep);
    }

    #[rstest]
    #[case::aspect_min_inclusive(face(100, 100, 150, 200), true)] // 0.75
    #[case::aspect_below_min(face(100, 100, 148, 200), false)] // 0.74
    #[case::aspect_max_inclusive(face(100, 100, 270, 200), true)] // 1.35
    #[case::aspect_above_max(face(100, 100, 272, 200), false)] // 1.36
    fn test_aspect_ratio_bounds(#[case] region: FaceRegion, #[case] keep: bool) {
        assert_eq!(filter_faces(&[region], W, H).len() == 1, keep);
    }

    #[test]
    fn test_area_ratio_bounds_are_inclusive() {
        // On a 1000x800 frame: 128x125 is exactly 2%, 600x600 exactly 45%
        let lower = face(100, 100, 128, 125);
        let upper = face(20, 20, 600, 600);
        assert_eq!(lower.area() / 800_000.0, MIN_FACE_AREA_RATIO);
        assert_eq!(upper.area() / 800_000.0, MAX_FACE_AREA_RATIO);
        assert_eq!(filter_faces(&[lower, upper], 1000, 800), vec![lower, upper]);
    }

    #[rstest]
    #[case::x_at_margin(face(10, 50, 100, 100), true)]
    #[case::y_at_margin(face(50, 10, 100, 100), true)]
    #[case::x_inside_margin(face(9, 50, 100, 100), false)]
    #[case::y_inside_margin(face(50, 9, 100, 100), false)]
    #[case::bottom_right_is_fine(face(530, 370, 100, 100), true)]
    fn test_border_rule(#[case] region: FaceRegion, #[case] keep: bool) {
        assert_eq!(filter_faces(&[region], W, H).len() == 1, keep);
    }

    #[rstest]
    #[case::zero_height(face(100, 100, 100, 0))]
    #[case::zero_width(face(100, 100, 0, 100))]
    #[case::negative(face(100, 100, -100, -100))]
    fn test_degenerate_boxes_are_dropped(#[case] region: FaceRegion) {
        assert!(filter_faces(&[region], W, H).is_empty());
    }

    #[test]
    fn test_preserves_input_order() {
        let a = face(300, 200, 120, 120);
        let b = face(0, 0, 120, 120); // border
        let c = face(50, 40, 100, 110);
        let d = face(400, 30, 150, 150);
        assert_eq!(filter_faces(&[a, b, c, d], W, H), vec![a, c, d]);
    }

    #[test]
    fn test_overlapping_boxes_are_not_merged() {
        let a = face(100, 100, 200, 200);
        let b = face(105, 105, 200, 200);
        assert_eq!(filter_faces(&[a, b], W, H), vec![a, b]);
    }

    #[test]
    fn test_is_idempotent() {
        let raw = vec![
            face(100, 100, 200, 200),
            face(0, 0, 50, 50),
            face(100, 100, 300, 100),
            face(20, 20, 90, 100),
            face(200, 150, 10, 10),
        ];
        let once = filter_faces(&raw, W, H);
        let twice = filter_faces(&once, W, H);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert!(filter_faces(&[], W, H).is_empty());
    }

    #[test]
    fn test_zero_frame_area_rejects_everything() {
        assert!(filter_faces(&[face(100, 100, 200, 200)], 0, 480).is_empty());
    }
}
