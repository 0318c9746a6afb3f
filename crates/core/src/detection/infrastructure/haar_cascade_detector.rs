//! Multi-scale Haar cascade face detector.
//!
//! Scans a pyramid of bilinearly downscaled copies of the grayscale frame
//! with the cascade's fixed-size window, then groups the raw hits.

use std::path::Path;

use crate::detection::domain::face_detector::{DetectionParams, FaceDetector};
use crate::preprocessing::resize::resize_bilinear;
use crate::shared::constants::{DETECTOR_GROUP_EPS, DETECTOR_SCALE_FACTOR};
use crate::shared::error::AnalysisError;
use crate::shared::face_region::FaceRegion;
use crate::shared::frame::Frame;

use super::haar_cascade::{HaarCascade, WeakClassifier};
use super::integral_image::IntegralImage;
use super::rect_grouping::group_rectangles;

/// Rectangle in window coordinates, pre-converted for the hot loop.
#[derive(Clone, Copy)]
struct FeatureRect {
    x: usize,
    y: usize,
    w: usize,
    h: usize,
    weight: f64,
}

struct Stage {
    threshold: f64,
    classifiers: Vec<WeakClassifier>,
}

/// Immutable after construction; safe to share across threads.
pub struct HaarCascadeDetector {
    window_w: usize,
    window_h: usize,
    features: Vec<Vec<FeatureRect>>,
    stages: Vec<Stage>,
}

impl HaarCascadeDetector {
    /// Load and validate a cascade asset. Any failure is `DetectorUnavailable`.
    pub fn load(path: &Path) -> Result<Self, AnalysisError> {
        let cascade = HaarCascade::from_path(path)?;
        Self::new(cascade)
    }

    pub fn new(cascade: HaarCascade) -> Result<Self, AnalysisError> {
        cascade.validate()?;
        let features = cascade
            .features
            .iter()
            .map(|f| {
                f.rects
                    .iter()
                    .map(|r| FeatureRect {
                        x: r.x as usize,
                        y: r.y as usize,
                        w: r.width as usize,
                        h: r.height as usize,
                        weight: r.weight,
                    })
                    .collect()
            })
            .collect();
        let stages = cascade
            .stages
            .into_iter()
            .map(|s| Stage {
                threshold: s.threshold,
                classifiers: s.classifiers,
            })
            .collect();
        Ok(Self {
            window_w: cascade.window_width as usize,
            window_h: cascade.window_height as usize,
            features,
            stages,
        })
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_w as u32, self.window_h as u32)
    }

    /// Every window the cascade accepts, in frame coordinates, before grouping.
    pub fn raw_candidates(&self, gray: &Frame, params: &DetectionParams) -> Vec<FaceRegion> {
        let width = gray.width() as usize;
        let height = gray.height() as usize;
        let scale_step = if params.scale_factor > 1.0 {
            params.scale_factor
        } else {
            log::warn!(
                "scale factor {} must exceed 1.0, using {DETECTOR_SCALE_FACTOR}",
                params.scale_factor
            );
            DETECTOR_SCALE_FACTOR
        };
        let (min_w, min_h) = (params.min_size.0 as usize, params.min_size.1 as usize);

        let mut candidates = Vec::new();
        let mut factor = 1.0f64;
        loop {
            let win_w = (self.window_w as f64 * factor).round() as usize;
            let win_h = (self.window_h as f64 * factor).round() as usize;
            let level_w = (width as f64 / factor).round() as usize;
            let level_h = (height as f64 / factor).round() as usize;
            if level_w <= self.window_w || level_h <= self.window_h {
                break;
            }
            if win_w > width || win_h > height {
                break;
            }

            if win_w >= min_w && win_h >= min_h {
                let level = resize_bilinear(gray.data(), width, height, 1, level_w, level_h);
                let ii = IntegralImage::new(&level, level_w, level_h);
                let step = if factor > 2.0 { 1 } else { 2 };
                for y in (0..level_h - self.window_h).step_by(step) {
                    for x in (0..level_w - self.window_w).step_by(step) {
                        if self.accepts(&ii, x, y) {
                            candidates.push(FaceRegion::new(
                                (x as f64 * factor).round() as i32,
                                (y as f64 * factor).round() as i32,
                                win_w as i32,
                                win_h as i32,
                            ));
                        }
                    }
                }
            }

            factor *= scale_step;
        }
        candidates
    }

    /// Run every stage on the window at `(x, y)`; reject on the first failing stage.
    fn accepts(&self, ii: &IntegralImage, x: usize, y: usize) -> bool {
        // Variance normalization over the window shrunk by one pixel
        let nw = self.window_w - 2;
        let nh = self.window_h - 2;
        let area = (nw * nh) as f64;
        let sum = ii.rect_sum(x + 1, y + 1, nw, nh) as f64;
        let sq_sum = ii.rect_sq_sum(x + 1, y + 1, nw, nh) as f64;
        let nf = area * sq_sum - sum * sum;
        let norm = if nf > 0.0 { nf.sqrt() } else { 1.0 };

        self.stages.iter().all(|stage| {
            let votes: f64 = stage
                .classifiers
                .iter()
                .map(|c| {
                    let value = self.feature_value(ii, c.feature, x, y);
                    if value < c.threshold * norm {
                        c.left
                    } else {
                        c.right
                    }
                })
                .sum();
            votes >= stage.threshold
        })
    }

    fn feature_value(&self, ii: &IntegralImage, feature: usize, x: usize, y: usize) -> f64 {
        self.features[feature]
            .iter()
            .map(|r| r.weight * ii.rect_sum(x + r.x, y + r.y, r.w, r.h) as f64)
            .sum()
    }
}

impl FaceDetector for HaarCascadeDetector {
    fn detect(
        &self,
        gray: &Frame,
        params: &DetectionParams,
    ) -> Result<Vec<FaceRegion>, AnalysisError> {
        if !gray.is_grayscale() {
            return Err(AnalysisError::invalid_frame(format!(
                "face detection needs a grayscale frame, got {} channels",
                gray.channels()
            )));
        }
        gray.check_len()?;
        let raw = self.raw_candidates(gray, params);
        let grouped = group_rectangles(&raw, params.min_neighbors, DETECTOR_GROUP_EPS);
        log::debug!(
            "cascade: {} raw hits grouped into {} regions",
            raw.len(),
            grouped.len()
        );
        Ok(grouped)
    }
}
