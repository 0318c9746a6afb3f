pub mod cascade_resolver;
pub mod haar_cascade;
pub mod haar_cascade_detector;
pub mod integral_image;
pub mod math;
pub mod rect_grouping;
