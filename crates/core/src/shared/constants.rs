/// Canonical frame size every downstream stage operates on.
pub const CANONICAL_WIDTH: u32 = 640;
pub const CANONICAL_HEIGHT: u32 = 480;

/// Gaussian denoise kernel (5x5, sigma derived from size).
pub const DENOISE_KERNEL_SIZE: usize = 5;

/// Hysteresis thresholds for the edge map.
pub const EDGE_LOW_THRESHOLD: i32 = 50;
pub const EDGE_HIGH_THRESHOLD: i32 = 150;

/// Edge density above which a frame counts as suspicious (strictly greater).
pub const MOVEMENT_THRESHOLD: f64 = 0.3;

/// Plausible face area as a fraction of the frame area, inclusive.
pub const MIN_FACE_AREA_RATIO: f64 = 0.02;
pub const MAX_FACE_AREA_RATIO: f64 = 0.45;

/// Plausible face box width / height, inclusive.
pub const MIN_FACE_ASPECT_RATIO: f64 = 0.75;
pub const MAX_FACE_ASPECT_RATIO: f64 = 1.35;

/// Boxes starting closer than this to the top or left edge are detector noise.
pub const FACE_BORDER_MARGIN: i32 = 10;

/// Fixed face-detector parameters.
pub const DETECTOR_SCALE_FACTOR: f64 = 1.1;
pub const DETECTOR_MIN_NEIGHBORS: usize = 7;
pub const DETECTOR_MIN_SIZE: (u32, u32) = (40, 40);

/// Similarity tolerance used when grouping raw cascade hits.
pub const DETECTOR_GROUP_EPS: f64 = 0.2;

pub const CASCADE_FILE_NAME: &str = "haarcascade_frontalface_default.xml";
pub const CASCADE_ENV_VAR: &str = "PROCTORCAM_CASCADE";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
