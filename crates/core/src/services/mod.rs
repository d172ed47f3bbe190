mod pipeline;

pub use pipeline::{PipelineConfig, PipelineService, PipelineStats};
