use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by the analysis pipeline.
///
/// `InvalidFrame` is per-frame and caller-recoverable (ask for a new
/// capture). `DetectorUnavailable` is a startup fault and should be treated
/// as fatal configuration, not retried per frame.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("invalid frame: {0}")]
    InvalidFrame(String),
    #[error("face detector unavailable: {0}")]
    DetectorUnavailable(#[from] CascadeLoadError),
}

impl AnalysisError {
    pub fn invalid_frame(reason: impl Into<String>) -> Self {
        Self::InvalidFrame(reason.into())
    }

    pub fn is_invalid_frame(&self) -> bool {
        matches!(self, Self::InvalidFrame(_))
    }

    pub fn is_detector_unavailable(&self) -> bool {
        matches!(self, Self::DetectorUnavailable(_))
    }
}

/// Why a detection model asset could not be turned into a usable detector.
#[derive(Error, Debug)]
pub enum CascadeLoadError {
    #[error("no cascade found (searched: {searched})")]
    NotFound { searched: String },
    #[error("failed to read cascade {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed cascade {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: roxmltree::Error,
    },
    #[error("invalid cascade: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_frame_message() {
        let err = AnalysisError::invalid_frame("empty buffer");
        assert_eq!(err.to_string(), "invalid frame: empty buffer");
        assert!(err.is_invalid_frame());
        assert!(!err.is_detector_unavailable());
    }

    #[test]
    fn test_detector_unavailable_wraps_load_error() {
        let err: AnalysisError = CascadeLoadError::Invalid("no stages".into()).into();
        assert!(err.is_detector_unavailable());
        assert_eq!(
            err.to_string(),
            "face detector unavailable: invalid cascade: no stages"
        );
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err = CascadeLoadError::Io {
            path: PathBuf::from("/tmp/missing.xml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("/tmp/missing.xml"));
    }
}
