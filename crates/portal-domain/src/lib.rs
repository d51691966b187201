//! Domain descriptors for the certificate-managing reverse proxy
//!
//! Each managed domain is declared as one descriptor line such as
//! `admin:secret@example.com -> app:3000 #production`. This crate parses the
//! line, resolves the deployment stage, derives the certificate storage layout
//! and the ACME directory, and provisions a welcome page for domains that
//! neither proxy nor redirect.

pub mod descriptor;
pub mod domain;
pub mod layout;
pub mod loader;
pub mod stage;
pub mod types;
pub mod welcome;

pub use descriptor::{BasicAuth, Descriptor, Target};
pub use domain::Domain;
pub use layout::DomainPaths;
pub use loader::{LoadFailure, LoadReport, load_domains, split_descriptors};
pub use stage::{Diagnostic, Stage, StageResolution, StageSource, resolve_stage};
pub use types::{DomainError, DomainResult, DomainSettings};
pub use welcome::{
    LocalFilesystem, PlaceholderRenderer, SiteFilesystem, TemplateRenderer, WelcomeContext,
    WelcomeOutcome, WelcomePageProvisioner,
};
