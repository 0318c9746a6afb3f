pub mod constants;
pub mod error;
pub mod face_region;
pub mod frame;
