use ndarray::ArrayView3;

use crate::shared::error::AnalysisError;

/// A single still frame: contiguous interleaved bytes in row-major order.
///
/// Color frames carry 3 channels (RGB); derived grayscale frames carry 1.
/// Frames are never mutated after construction; every stage produces a new one.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
}

impl Frame {
    /// Unchecked constructor. Stages that index pixels reject frames whose
    /// buffer disagrees with the dimensions (see [`Frame::has_consistent_len`]).
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8) -> Self {
        Self {
            data,
            width,
            height,
            channels,
        }
    }

    /// Checked constructor for data arriving from outside the pipeline.
    pub fn try_new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        channels: u8,
    ) -> Result<Self, AnalysisError> {
        if data.is_empty() {
            return Err(AnalysisError::invalid_frame("empty pixel buffer"));
        }
        if width == 0 || height == 0 {
            return Err(AnalysisError::invalid_frame(format!(
                "degenerate dimensions {width}x{height}"
            )));
        }
        if channels == 0 {
            return Err(AnalysisError::invalid_frame("zero channels"));
        }
        let frame = Self::new(data, width, height, channels);
        frame.check_len()?;
        Ok(frame)
    }

    /// Single-channel frame, the representation used by edge and face detection.
    pub fn grayscale(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self::new(data, width, height, 1)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn is_grayscale(&self) -> bool {
        self.channels == 1
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn expected_len(&self) -> usize {
        self.pixel_count() * self.channels as usize
    }

    pub fn has_consistent_len(&self) -> bool {
        self.data.len() == self.expected_len()
    }

    /// `InvalidFrame` unless the buffer holds exactly `width * height * channels` bytes.
    pub fn check_len(&self) -> Result<(), AnalysisError> {
        if self.has_consistent_len() {
            return Ok(());
        }
        Err(AnalysisError::invalid_frame(format!(
            "buffer holds {} bytes, {}x{}x{} needs {}",
            self.data.len(),
            self.width,
            self.height,
            self.channels,
            self.expected_len()
        )))
    }

    /// Pixel view shaped `(height, width, channels)`.
    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
