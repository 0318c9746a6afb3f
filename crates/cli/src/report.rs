use std::path::Path;

use chrono::SecondsFormat;
use serde::Serialize;

use proctorcam_core::pipeline::frame_analysis_pipeline::AnalysisResult;
use proctorcam_core::shared::error::AnalysisError;
use proctorcam_core::shared::face_region::FaceRegion;

/// Per-frame JSON report, field names as consumed by proctoring clients.
#[derive(Debug, Serialize)]
pub struct FrameReport<'a> {
    pub input: String,
    pub edge_density: f64,
    pub suspicious_activity: bool,
    pub activity_confidence: f64,
    pub faces_detected: usize,
    pub face_boxes: &'a [FaceRegion],
    pub processed_at: String,
}

impl<'a> FrameReport<'a> {
    pub fn new(input: &Path, result: &'a AnalysisResult) -> Self {
        Self {
            input: input.display().to_string(),
            edge_density: result.edge_density,
            suspicious_activity: result.is_suspicious,
            activity_confidence: result.confidence,
            faces_detected: result.detected_count,
            face_boxes: &result.faces,
            processed_at: result.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FailureReport {
    pub input: String,
    pub error: String,
}

impl FailureReport {
    pub fn new(input: &Path, error: &AnalysisError) -> Self {
        Self {
            input: input.display().to_string(),
            error: error.to_string(),
        }
    }
}
