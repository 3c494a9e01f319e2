pub mod config;
pub mod error;
pub mod logger;
pub mod model;
pub mod server;
pub mod status;

pub use config::AppConfig;
pub use error::ServiceError;
pub use logger::InteractionLogger;
pub use model::{GenerationResponse, PromptRequest, SystemStatus, TextGenerator};
pub use server::build_router;
