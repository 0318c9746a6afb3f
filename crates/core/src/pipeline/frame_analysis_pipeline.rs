use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::activity::edge_activity_analyzer::analyze_activity;
use crate::detection::domain::face_candidate_filter::filter_faces;
use crate::detection::domain::face_detector::{DetectionParams, FaceDetector};
use crate::preprocessing::frame_preprocessor::preprocess;
use crate::shared::error::AnalysisError;
use crate::shared::face_region::FaceRegion;
use crate::shared::frame::Frame;

/// Everything learned from one frame. Built once, never mutated.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub edge_density: f64,
    pub is_suspicious: bool,
    pub confidence: f64,
    /// Plausible faces in detector order, canonical-frame coordinates.
    pub faces: Vec<FaceRegion>,
    pub detected_count: usize,
    pub timestamp: DateTime<Utc>,
}

/// Run one frame through preprocess → edge activity → detect → filter.
///
/// The detector sees the undenoised grayscale frame; edge activity uses the
/// denoised one.
pub fn analyze(
    frame: &Frame,
    detector: &dyn FaceDetector,
) -> Result<AnalysisResult, AnalysisError> {
    analyze_with(frame, detector, &DetectionParams::default())
}

pub fn analyze_with(
    frame: &Frame,
    detector: &dyn FaceDetector,
    params: &DetectionParams,
) -> Result<AnalysisResult, AnalysisError> {
    let t0 = Instant::now();
    let prepared = preprocess(frame)?;
    let t_pre = t0.elapsed();

    let t1 = Instant::now();
    let activity = analyze_activity(&prepared.denoised)?;
    let t_edges = t1.elapsed();

    let t2 = Instant::now();
    let raw = detector.detect(&prepared.grayscale, params)?;
    let t_detect = t2.elapsed();

    let faces = filter_faces(&raw, prepared.grayscale.width(), prepared.grayscale.height());
    log::debug!(
        "analyze {}x{}: preprocess {:.1}ms, edges {:.1}ms, detect {:.1}ms, {} raw -> {} faces",
        frame.width(),
        frame.height(),
        t_pre.as_secs_f64() * 1000.0,
        t_edges.as_secs_f64() * 1000.0,
        t_detect.as_secs_f64() * 1000.0,
        raw.len(),
        faces.len()
    );

    Ok(AnalysisResult {
        edge_density: activity.edge_density,
        is_suspicious: activity.is_suspicious(),
        confidence: activity.confidence,
        detected_count: faces.len(),
        faces,
        timestamp: Utc::now(),
    })
}

/// Analysis entry point that owns a shared handle to a loaded detector.
///
/// Cheap to clone; clones share the detector.
#[derive(Clone)]
pub struct FrameAnalysisPipeline {
    detector: Arc<dyn FaceDetector>,
    params: DetectionParams,
}

impl FrameAnalysisPipeline {
    pub fn new(detector: Arc<dyn FaceDetector>) -> Self {
        Self {
            detector,
            params: DetectionParams::default(),
        }
    }

    pub fn params(&self) -> &DetectionParams {
        &self.params
    }

    pub fn analyze(&self, frame: &Frame) -> Result<AnalysisResult, AnalysisError> {
        analyze_with(frame, self.detector.as_ref(), &self.params)
    }
}
