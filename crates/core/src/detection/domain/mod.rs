pub mod face_candidate_filter;
pub mod face_detector;
