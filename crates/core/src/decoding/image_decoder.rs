use std::path::Path;

use crate::shared::error::AnalysisError;
use crate::shared::frame::Frame;

/// Decode an encoded image (JPEG, PNG, BMP, ...) into a 3-channel RGB frame.
///
/// Empty or undecodable input is an `InvalidFrame`; the caller should ask
/// for a new capture.
pub fn decode_bytes(bytes: &[u8]) -> Result<Frame, AnalysisError> {
    if bytes.is_empty() {
        return Err(AnalysisError::invalid_frame("empty image payload"));
    }
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| AnalysisError::invalid_frame(format!("could not decode image: {e}")))?;
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();
    Frame::try_new(rgb.into_raw(), width, height, 3)
}

/// Read and decode an image file.
pub fn decode_file(path: &Path) -> Result<Frame, AnalysisError> {
    let bytes = std::fs::read(path).map_err(|e| {
        AnalysisError::invalid_frame(format!("could not read {}: {e}", path.display()))
    })?;
    decode_bytes(&bytes).map_err(|e| match e {
        AnalysisError::InvalidFrame(reason) => {
            AnalysisError::InvalidFrame(format!("{}: {reason}", path.display()))
        }
        other => other,
    })
}
