use crate::shared::constants::{DETECTOR_MIN_NEIGHBORS, DETECTOR_MIN_SIZE, DETECTOR_SCALE_FACTOR};
use crate::shared::error::AnalysisError;
use crate::shared::face_region::FaceRegion;
use crate::shared::frame::Frame;

/// Parameters handed to the detector on every call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionParams {
    /// Pyramid step between consecutive search scales (> 1.0).
    pub scale_factor: f64,
    /// Raw hits a grouped detection needs beyond this count to be reported.
    pub min_neighbors: usize,
    /// Smallest window `(width, height)` searched, in frame pixels.
    pub min_size: (u32, u32),
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            scale_factor: DETECTOR_SCALE_FACTOR,
            min_neighbors: DETECTOR_MIN_NEIGHBORS,
            min_size: DETECTOR_MIN_SIZE,
        }
    }
}

/// Domain interface for the face-detection capability.
///
/// Implementations are loaded once and shared read-only across concurrent
/// analyses, hence `&self` and `Sync`.
pub trait FaceDetector: Send + Sync {
    fn detect(
        &self,
        gray: &Frame,
        params: &DetectionParams,
    ) -> Result<Vec<FaceRegion>, AnalysisError>;
}
