use crate::shared::face_region::FaceRegion;

use super::math::{cluster_labels, union};

/// Merge overlapping raw window hits into one box per object.
///
/// Boxes whose edges all lie within `eps * mean(min side)` of each other
/// are clustered (transitively). Each cluster is averaged; clusters with
/// `count <= group_threshold` are dropped, as are clusters nested inside a
/// clearly stronger one. A `group_threshold` of 0 disables grouping.
pub fn group_rectangles(
    rects: &[FaceRegion],
    group_threshold: usize,
    eps: f64,
) -> Vec<FaceRegion> {
    if group_threshold == 0 || rects.is_empty() {
        return rects.to_vec();
    }

    let mut parent: Vec<usize> = (0..rects.len()).collect();
    for i in 0..rects.len() {
        for j in i + 1..rects.len() {
            if similar(&rects[i], &rects[j], eps) {
                union(&mut parent, i, j);
            }
        }
    }
    let (labels, count) = cluster_labels(&mut parent);

    let mut sums = vec![[0i64; 4]; count];
    let mut weights = vec![0usize; count];
    for (r, &label) in rects.iter().zip(&labels) {
        let s = &mut sums[label];
        s[0] += r.x as i64;
        s[1] += r.y as i64;
        s[2] += r.width as i64;
        s[3] += r.height as i64;
        weights[label] += 1;
    }

    let averaged: Vec<FaceRegion> = sums
        .iter()
        .zip(&weights)
        .map(|(s, &n)| {
            let inv = 1.0 / n as f64;
            FaceRegion::new(
                (s[0] as f64 * inv).round() as i32,
                (s[1] as f64 * inv).round() as i32,
                (s[2] as f64 * inv).round() as i32,
                (s[3] as f64 * inv).round() as i32,
            )
        })
        .collect();

    averaged
        .iter()
        .zip(&weights)
        .enumerate()
        .filter(|&(i, (r1, &n1))| {
            n1 > group_threshold
                && !averaged.iter().zip(&weights).enumerate().any(|(j, (r2, &n2))| {
                    j != i && n2 > group_threshold && is_nested_in_stronger(r1, n1, r2, n2, eps)
                })
        })
        .map(|(_, (r, _))| *r)
        .collect()
}

fn similar(a: &FaceRegion, b: &FaceRegion, eps: f64) -> bool {
    let delta = eps * (a.width.min(b.width) + a.height.min(b.height)) as f64 * 0.5;
    ((a.x - b.x).abs() as f64) <= delta
        && ((a.y - b.y).abs() as f64) <= delta
        && ((a.right() - b.right()).abs() as f64) <= delta
        && ((a.bottom() - b.bottom()).abs() as f64) <= delta
}

fn is_nested_in_stronger(
    inner: &FaceRegion,
    n_inner: usize,
    outer: &FaceRegion,
    n_outer: usize,
    eps: f64,
) -> bool {
    let dx = (outer.width as f64 * eps).round() as i32;
    let dy = (outer.height as f64 * eps).round() as i32;
    inner.x >= outer.x - dx
        && inner.y >= outer.y - dy
        && inner.right() <= outer.right() + dx
        && inner.bottom() <= outer.bottom() + dy
        && (n_outer > n_inner.max(3) || n_inner < 3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::DETECTOR_GROUP_EPS;

    fn jittered(base: FaceRegion, count: usize) -> Vec<FaceRegion> {
        (0..count)
            .map(|i| {
                let d = (i % 3) as i32 - 1;
                FaceRegion::new(base.x + d, base.y - d, base.width, base.height)
            })
            .collect()
    }

    #[test]
    fn test_zero_threshold_returns_raw() {
        let raw = vec![FaceRegion::new(0, 0, 10, 10), FaceRegion::new(1, 1, 10, 10)];
        assert_eq!(group_rectangles(&raw, 0, DETECTOR_GROUP_EPS), raw);
    }

    #[test]
    fn test_cluster_is_averaged() {
        let raw = vec![
            FaceRegion::new(100, 100, 50, 50),
            FaceRegion::new(102, 98, 50, 50),
            FaceRegion::new(104, 102, 54, 50),
        ];
        let grouped = group_rectangles(&raw, 1, DETECTOR_GROUP_EPS);
        assert_eq!(grouped, vec![FaceRegion::new(102, 100, 51, 50)]);
    }

    #[test]
    fn test_clusters_at_threshold_are_dropped() {
        let raw = jittered(FaceRegion::new(100, 100, 60, 60), 7);
        assert!(group_rectangles(&raw, 7, DETECTOR_GROUP_EPS).is_empty());
        assert_eq!(group_rectangles(&raw, 6, DETECTOR_GROUP_EPS).len(), 1);
    }

    #[test]
    fn test_isolated_hit_is_dropped() {
        let mut raw = jittered(FaceRegion::new(100, 100, 60, 60), 9);
        raw.push(FaceRegion::new(400, 300, 60, 60));
        let grouped = group_rectangles(&raw, 7, DETECTOR_GROUP_EPS);
        assert_eq!(grouped.len(), 1);
        assert!(grouped[0].x >= 99 && grouped[0].x <= 101);
    }

    #[test]
    fn test_nested_weaker_cluster_is_dropped() {
        let mut raw = jittered(FaceRegion::new(0, 0, 100, 100), 10);
        raw.extend(jittered(FaceRegion::new(30, 30, 30, 30), 4));
        let grouped = group_rectangles(&raw, 2, DETECTOR_GROUP_EPS);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].width, 100);
    }

    #[test]
    fn test_separate_faces_both_survive_in_first_seen_order() {
        let mut raw = jittered(FaceRegion::new(300, 100, 80, 80), 8);
        raw.extend(jittered(FaceRegion::new(50, 120, 80, 80), 8));
        let grouped = group_rectangles(&raw, 7, DETECTOR_GROUP_EPS);
        assert_eq!(grouped.len(), 2);
        assert!(grouped[0].x > grouped[1].x);
    }

    #[test]
    fn test_similarity_is_scale_aware() {
        // delta = 0.2 * 50 = 10: a shift of 10 groups, 11 does not
        assert!(similar(
            &FaceRegion::new(0, 0, 50, 50),
            &FaceRegion::new(10, 0, 50, 50),
            0.2
        ));
        assert!(!similar(
            &FaceRegion::new(0, 0, 50, 50),
            &FaceRegion::new(11, 0, 50, 50),
            0.2
        ));
    }
}
