use portal_common::EnvConfig;
use std::path::PathBuf;
use thiserror::Error;

/// Deployment-wide inputs needed to build a [`crate::Domain`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainSettings {
    /// Stage used when a descriptor has no `#stage` marker (raw, unvalidated)
    pub default_stage: String,
    /// Root of the per-domain certificate storage
    pub storage_root: PathBuf,
    /// Prefix of every domain's web root
    pub web_root_prefix: PathBuf,
}

impl Default for DomainSettings {
    fn default() -> Self {
        Self::from(&EnvConfig::default())
    }
}

impl From<&EnvConfig> for DomainSettings {
    fn from(config: &EnvConfig) -> Self {
        Self {
            default_stage: config.default_stage.clone(),
            storage_root: config.storage_root.clone(),
            web_root_prefix: config.web_root_prefix.clone(),
        }
    }
}

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Descriptor does not declare a domain name")]
    MissingName,

    #[error("Invalid domain name: {0}")]
    InvalidName(String),

    #[error("Invalid basic auth credentials for {0}, expected user:password@{0}")]
    InvalidBasicAuth(String),

    #[error("Unexpected token in descriptor: {0}")]
    UnexpectedToken(String),

    #[error("Domain {0} declares both an upstream and a redirect target")]
    ConflictingTargets(String),

    #[error("Domain {0} has no valid stage")]
    UnresolvedStage(String),

    #[error("Template error: {0}")]
    TemplateError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type DomainResult<T> = Result<T, DomainError>;
