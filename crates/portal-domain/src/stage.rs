use crate::layout;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Deployment stage, selects the certificate authority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Let's Encrypt production directory
    Production,
    /// Let's Encrypt staging directory
    Staging,
    /// No certificate authority, certificates are issued locally
    Local,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Production, Stage::Staging, Stage::Local];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Staging => "staging",
            Self::Local => "local",
        }
    }

    /// ACME directory for this stage, `None` for local issuance
    pub fn ca_directory_url(&self) -> Option<&'static str> {
        match self {
            Self::Production => Some(layout::LETSENCRYPT_PRODUCTION_DIRECTORY),
            Self::Staging => Some(layout::LETSENCRYPT_STAGING_DIRECTORY),
            Self::Local => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid stage {0}, expected one of production, staging, local")]
pub struct InvalidStage(pub String);

impl FromStr for Stage {
    type Err = InvalidStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| InvalidStage(s.to_string()))
    }
}

/// Where a stage candidate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageSource {
    /// Trailing `#stage` marker of the descriptor
    Marker,
    /// Configured default stage
    Default,
}

impl fmt::Display for StageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Marker => f.write_str("descriptor marker"),
            Self::Default => f.write_str("default stage"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageResolution {
    Resolved(Stage),
    /// The candidate is not a known stage; the domain stays alive without one
    Invalid { value: String, source: StageSource },
}

impl StageResolution {
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Resolved(stage) => Some(*stage),
            Self::Invalid { .. } => None,
        }
    }

    /// Split into the resolved stage and the diagnostic to report, if any
    pub fn into_parts(self) -> (Option<Stage>, Option<Diagnostic>) {
        match self {
            Self::Resolved(stage) => (Some(stage), None),
            Self::Invalid { value, source } => {
                (None, Some(Diagnostic::InvalidStage { value, source }))
            }
        }
    }
}

/// Non-fatal problem found while building a domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    InvalidStage { value: String, source: StageSource },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidStage { value, source } => {
                write!(f, "Invalid stage {:?} (from {})", value, source)
            }
        }
    }
}

/// Pick the stage from the descriptor marker, falling back to the default
pub fn resolve_stage(marker: Option<&str>, default_stage: &str) -> StageResolution {
    let (candidate, source) = match marker {
        Some(marker) => (marker, StageSource::Marker),
        None => (default_stage, StageSource::Default),
    };

    match candidate.parse::<Stage>() {
        Ok(stage) => StageResolution::Resolved(stage),
        Err(InvalidStage(value)) => StageResolution::Invalid { value, source },
    }
}
