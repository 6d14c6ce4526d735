//! Linear classification models: training, inference, persistence.

pub mod linear;
pub mod persist;

pub use linear::{LinearClassifier, TrainConfig, softmax};
pub use persist::{LinearModel, PipelineMeta, SerializedPipeline};
