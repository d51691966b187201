pub mod config;
pub mod error;
pub mod manifest;

pub use config::EnvConfig;
pub use error::{AppError, AppResult};
pub use manifest::DomainManifest;
