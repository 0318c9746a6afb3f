use crate::preprocessing::gaussian::{gaussian_kernel_1d, separable_gaussian_blur_with_kernel};
use crate::preprocessing::resize::resize_bilinear;
use crate::shared::constants::{CANONICAL_HEIGHT, CANONICAL_WIDTH, DENOISE_KERNEL_SIZE};
use crate::shared::error::AnalysisError;
use crate::shared::frame::Frame;

/// Luminance weights in 14-bit fixed point (0.299, 0.587, 0.114).
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;
const LUMA_SHIFT: u32 = 14;

/// The three canonical representations of one input frame.
#[derive(Clone, Debug)]
pub struct PreprocessedFrame {
    /// Color frame resampled to the canonical size.
    pub resized: Frame,
    pub grayscale: Frame,
    /// Gaussian-smoothed grayscale, input to edge detection.
    pub denoised: Frame,
}

/// Normalize a decoded color frame to 640x480 and derive grayscale and
/// denoised grayscale. Pure function of its input.
pub fn preprocess(frame: &Frame) -> Result<PreprocessedFrame, AnalysisError> {
    validate_color_frame(frame)?;

    let resized = resize_to_canonical(frame);
    let grayscale = to_grayscale(&resized);
    let denoised = denoise(&grayscale);

    Ok(PreprocessedFrame {
        resized,
        grayscale,
        denoised,
    })
}

fn validate_color_frame(frame: &Frame) -> Result<(), AnalysisError> {
    if frame.data().is_empty() {
        return Err(AnalysisError::invalid_frame("empty pixel buffer"));
    }
    if frame.width() == 0 || frame.height() == 0 {
        return Err(AnalysisError::invalid_frame(format!(
            "degenerate dimensions {}x{}",
            frame.width(),
            frame.height()
        )));
    }
    if frame.channels() != 3 {
        return Err(AnalysisError::invalid_frame(format!(
            "expected 3 color channels, got {}",
            frame.channels()
        )));
    }
    frame.check_len()
}

fn resize_to_canonical(frame: &Frame) -> Frame {
    let data = resize_bilinear(
        frame.data(),
        frame.width() as usize,
        frame.height() as usize,
        3,
        CANONICAL_WIDTH as usize,
        CANONICAL_HEIGHT as usize,
    );
    Frame::new(data, CANONICAL_WIDTH, CANONICAL_HEIGHT, 3)
}

/// Weighted luminance reduction of an RGB frame.
pub fn to_grayscale(frame: &Frame) -> Frame {
    let pixels = frame.as_ndarray();
    let mut data = Vec::with_capacity(frame.pixel_count());
    for row in pixels.outer_iter() {
        for px in row.outer_iter() {
            let y = px[0] as u32 * LUMA_R
                + px[1] as u32 * LUMA_G
                + px[2] as u32 * LUMA_B
                + (1 << (LUMA_SHIFT - 1));
            data.push((y >> LUMA_SHIFT) as u8);
        }
    }
    Frame::grayscale(data, frame.width(), frame.height())
}

/// 5x5 Gaussian smoothing of a grayscale frame.
pub fn denoise(gray: &Frame) -> Frame {
    let kernel = gaussian_kernel_1d(DENOISE_KERNEL_SIZE);
    let mut data = gray.data().to_vec();
    let mut temp = Vec::new();
    separable_gaussian_blur_with_kernel(
        &mut data,
        gray.width() as usize,
        gray.height() as usize,
        1,
        &kernel,
        &mut temp,
    );
    Frame::grayscale(data, gray.width(), gray.height())
}
