mod types;

#[cfg(feature = "tch-backend")]
mod pipeline;

#[cfg(feature = "tch-backend")]
pub use pipeline::TextGenerationPipeline;
pub use types::{DeviceReport, GenerationResponse, ModelReport, PromptRequest, SystemStatus};

use crate::error::ServiceError;

/// Seam between the HTTP layer and the inference backend. The real
/// implementation wraps a TorchScript module; tests substitute a stub.
pub trait TextGenerator: Send + Sync + 'static {
    /// Produce text for `prompt`. By pipeline convention the returned string
    /// starts with the echoed prompt.
    fn generate(&self, prompt: &str) -> Result<String, ServiceError>;

    fn device_report(&self) -> DeviceReport;

    fn model_report(&self) -> ModelReport;
}
