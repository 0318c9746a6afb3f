pub mod canny;
pub mod edge_activity_analyzer;
