pub mod frame_preprocessor;
pub mod gaussian;
pub mod resize;
