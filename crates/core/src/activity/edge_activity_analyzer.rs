use serde::Serialize;

use crate::activity::canny::detect_edges;
use crate::shared::constants::{EDGE_HIGH_THRESHOLD, EDGE_LOW_THRESHOLD, MOVEMENT_THRESHOLD};
use crate::shared::error::AnalysisError;
use crate::shared::frame::Frame;

/// Per-frame visual activity summary.
///
/// A single still frame cannot measure temporal motion; edge density is used
/// as a proxy for movement and clutter.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ActivityScore {
    /// Fraction of edge pixels, in `[0, 1]`.
    pub edge_density: f64,
    /// `edge_density / MOVEMENT_THRESHOLD`, saturating at 1.0.
    pub confidence: f64,
}

impl ActivityScore {
    pub fn from_edge_density(edge_density: f64) -> Self {
        let edge_density = edge_density.clamp(0.0, 1.0);
        Self {
            edge_density,
            confidence: (edge_density / MOVEMENT_THRESHOLD).min(1.0),
        }
    }

    /// Strictly above the movement threshold; the threshold itself is not suspicious.
    pub fn is_suspicious(&self) -> bool {
        self.edge_density > MOVEMENT_THRESHOLD
    }
}

/// Score the edge activity of a denoised grayscale frame.
pub fn analyze_activity(denoised: &Frame) -> Result<ActivityScore, AnalysisError> {
    if !denoised.is_grayscale() {
        return Err(AnalysisError::invalid_frame(format!(
            "edge analysis needs a grayscale frame, got {} channels",
            denoised.channels()
        )));
    }
    if denoised.pixel_count() == 0 {
        return Err(AnalysisError::invalid_frame("empty frame"));
    }
    denoised.check_len()?;
    let edges = detect_edges(denoised, EDGE_LOW_THRESHOLD, EDGE_HIGH_THRESHOLD);
    let score = ActivityScore::from_edge_density(edges.density());
    log::debug!(
        "edge activity: {} edge pixels, density {:.4}, confidence {:.3}",
        edges.edge_count(),
        score.edge_density,
        score.confidence
    );
    Ok(score)
}
