pub mod batch_executor;
pub mod batch_observer;
pub mod frame_analysis_pipeline;
pub mod infrastructure;
