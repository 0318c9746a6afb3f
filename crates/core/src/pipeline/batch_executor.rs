use std::path::PathBuf;

use crate::pipeline::batch_observer::BatchObserver;
use crate::pipeline::frame_analysis_pipeline::{AnalysisResult, FrameAnalysisPipeline};
use crate::shared::error::AnalysisError;

/// Result of analyzing one input file. Failures stay attached to their input.
#[derive(Debug)]
pub struct FrameOutcome {
    pub input: PathBuf,
    pub result: Result<AnalysisResult, AnalysisError>,
}

impl FrameOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Abstracts how a batch of image files is decoded and analyzed.
///
/// This is a port; infrastructure provides concrete implementations.
/// Outcomes come back in input order whatever the execution order was;
/// the observer sees them as they finish.
pub trait BatchExecutor: Send {
    fn execute(
        &self,
        pipeline: &FrameAnalysisPipeline,
        inputs: &[PathBuf],
        observer: &mut dyn BatchObserver,
    ) -> Result<Vec<FrameOutcome>, Box<dyn std::error::Error>>;
}
