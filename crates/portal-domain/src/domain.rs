use crate::descriptor::{BasicAuth, Descriptor, Target};
use crate::layout::DomainPaths;
use crate::stage::{Diagnostic, Stage, resolve_stage};
use crate::types::{DomainError, DomainResult, DomainSettings};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// One managed domain, built from its descriptor line.
///
/// Every field is computed once in [`Domain::parse`]; the value is immutable
/// afterwards and can be shared between threads.
#[derive(Clone, Serialize)]
pub struct Domain {
    #[serde(skip)]
    descriptor: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    upstream: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_target_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    basic_auth: Option<BasicAuth>,
    #[serde(skip)]
    legacy_auth: Option<String>,
    stage: Option<Stage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<Diagnostic>,
    paths: DomainPaths,
}

impl Domain {
    /// Parse a descriptor line.
    ///
    /// Fails only when the line itself is malformed. An unknown stage is
    /// recorded in [`Domain::diagnostics`] and leaves the stage unresolved.
    pub fn parse(descriptor: impl Into<String>, settings: &DomainSettings) -> DomainResult<Self> {
        let descriptor = descriptor.into();
        let Descriptor {
            name,
            target,
            basic_auth,
            stage_marker,
            legacy_auth,
        } = Descriptor::parse(&descriptor)?;

        let (stage, diagnostic) =
            resolve_stage(stage_marker.as_deref(), &settings.default_stage).into_parts();
        let paths = DomainPaths::derive(settings, &name, stage);

        let (upstream, redirect_target_url) = match target {
            Some(Target::Upstream(upstream)) => (Some(upstream), None),
            Some(Target::Redirect(url)) => (None, Some(url)),
            None => (None, None),
        };

        Ok(Self {
            descriptor,
            name,
            upstream,
            redirect_target_url,
            basic_auth,
            legacy_auth,
            stage,
            diagnostics: diagnostic.into_iter().collect(),
            paths,
        })
    }

    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn upstream(&self) -> Option<&str> {
        self.upstream.as_deref()
    }

    pub fn redirect_target_url(&self) -> Option<&str> {
        self.redirect_target_url.as_deref()
    }

    pub fn basic_auth(&self) -> Option<&BasicAuth> {
        self.basic_auth.as_ref()
    }

    pub fn basic_auth_username(&self) -> Option<&str> {
        self.basic_auth.as_ref().map(|auth| auth.username.as_str())
    }

    pub fn basic_auth_password(&self) -> Option<&str> {
        self.basic_auth.as_ref().map(|auth| auth.password.as_str())
    }

    pub fn basic_auth_enabled(&self) -> bool {
        self.basic_auth.is_some()
    }

    /// Raw ` @token` segment of older configuration files, not interpreted
    pub fn legacy_auth(&self) -> Option<&str> {
        self.legacy_auth.as_deref()
    }

    /// Resolved stage, `None` when the candidate was invalid
    pub fn stage(&self) -> Option<Stage> {
        self.stage
    }

    /// Stage, or an error for callers about to touch the storage directory
    pub fn require_stage(&self) -> DomainResult<Stage> {
        self.stage
            .ok_or_else(|| DomainError::UnresolvedStage(self.name.clone()))
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn ca_directory_url(&self) -> Option<&'static str> {
        self.stage.and_then(|stage| stage.ca_directory_url())
    }

    /// True when the domain neither proxies nor redirects
    pub fn serves_welcome_page(&self) -> bool {
        self.upstream.is_none() && self.redirect_target_url.is_none()
    }

    pub fn paths(&self) -> &DomainPaths {
        &self.paths
    }

    pub fn storage_dir(&self) -> &Path {
        &self.paths.storage_dir
    }

    pub fn csr_path(&self) -> &Path {
        &self.paths.csr
    }

    pub fn signed_cert_path(&self) -> &Path {
        &self.paths.signed_cert
    }

    pub fn chained_cert_path(&self) -> &Path {
        &self.paths.chained_cert
    }

    pub fn ongoing_cert_path(&self) -> &Path {
        &self.paths.ongoing_cert
    }

    pub fn key_path(&self) -> &Path {
        &self.paths.key
    }

    pub fn htaccess_path(&self) -> &Path {
        &self.paths.htaccess
    }

    pub fn www_root(&self) -> &Path {
        &self.paths.www_root
    }

    pub fn welcome_page_path(&self) -> &Path {
        &self.paths.welcome_page
    }
}

impl fmt::Debug for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Domain")
            .field("name", &self.name)
            .field("upstream", &self.upstream)
            .field("redirect_target_url", &self.redirect_target_url)
            .field("basic_auth", &self.basic_auth)
            .field("legacy_auth", &self.legacy_auth.as_ref().map(|_| "<redacted>"))
            .field("stage", &self.stage)
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LETSENCRYPT_PRODUCTION_DIRECTORY, LETSENCRYPT_STAGING_DIRECTORY};
    use crate::stage::StageSource;
    use std::path::PathBuf;

    fn settings(default_stage: &str) -> DomainSettings {
        DomainSettings {
            default_stage: default_stage.to_string(),
            storage_root: PathBuf::from("/var/lib/portal/certs"),
            web_root_prefix: PathBuf::from("/var/www/vhosts"),
        }
    }

    #[test]
    fn test_proxied_domain() {
        let domain =
            Domain::parse("example.com -> localhost:3000 #production", &settings("staging"))
                .unwrap();

        assert_eq!(domain.name(), "example.com");
        assert_eq!(domain.upstream(), Some("localhost:3000"));
        assert_eq!(domain.redirect_target_url(), None);
        assert_eq!(domain.stage(), Some(Stage::Production));
        assert_eq!(domain.ca_directory_url(), Some(LETSENCRYPT_PRODUCTION_DIRECTORY));
        assert!(!domain.basic_auth_enabled());
        assert!(!domain.serves_welcome_page());
        assert!(domain.diagnostics().is_empty());
    }

    #[test]
    fn test_basic_auth_static_site() {
        let domain =
            Domain::parse("admin:secret@example.com #staging", &settings("production")).unwrap();

        assert_eq!(domain.basic_auth_username(), Some("admin"));
        assert_eq!(domain.basic_auth_password(), Some("secret"));
        assert!(domain.basic_auth_enabled());
        assert_eq!(domain.name(), "example.com");
        assert_eq!(domain.stage(), Some(Stage::Staging));
        assert_eq!(domain.ca_directory_url(), Some(LETSENCRYPT_STAGING_DIRECTORY));
        assert_eq!(domain.upstream(), None);
        assert_eq!(domain.redirect_target_url(), None);
        assert!(domain.serves_welcome_page());
    }

    #[test]
    fn test_redirect_uses_default_stage() {
        let domain = Domain::parse(
            "old.example.com => https://new.example.com",
            &settings("local"),
        )
        .unwrap();

        assert_eq!(domain.stage(), Some(Stage::Local));
        assert_eq!(domain.redirect_target_url(), Some("https://new.example.com"));
        assert_eq!(domain.ca_directory_url(), None);
        assert_eq!(domain.basic_auth_username(), None);
        assert_eq!(domain.basic_auth_password(), None);
    }

    #[test]
    fn test_invalid_stage_is_reported_not_fatal() {
        let domain = Domain::parse("broken.example.com #nope", &settings("staging")).unwrap();

        assert_eq!(domain.name(), "broken.example.com");
        assert_eq!(domain.stage(), None);
        assert_eq!(domain.ca_directory_url(), None);
        assert_eq!(
            domain.diagnostics(),
            &[Diagnostic::InvalidStage {
                value: "nope".to_string(),
                source: StageSource::Marker,
            }]
        );
        assert!(matches!(
            domain.require_stage(),
            Err(DomainError::UnresolvedStage(name)) if name == "broken.example.com"
        ));
        assert_eq!(
            domain.storage_dir(),
            Path::new("/var/lib/portal/certs/broken.example.com")
        );
    }

    #[test]
    fn test_invalid_default_stage() {
        let domain = Domain::parse("example.com", &settings("prod")).unwrap();
        assert_eq!(domain.stage(), None);
        assert_eq!(domain.diagnostics().len(), 1);
    }

    #[test]
    fn test_legacy_auth_segment_is_kept() {
        let domain = Domain::parse(
            "example.com -> app:80 @legacy #production",
            &settings("staging"),
        )
        .unwrap();

        assert_eq!(domain.upstream(), Some("app:80"));
        assert_eq!(domain.legacy_auth(), Some("legacy"));
        assert_eq!(domain.stage(), Some(Stage::Production));
        assert!(!format!("{:?}", domain).contains("legacy\""));
        assert!(serde_json::to_value(&domain).unwrap().get("legacy_auth").is_none());
    }

    #[test]
    fn test_names_cannot_leave_the_roots() {
        for line in ["/abs #local", "../x #local", "a..b", "../../escape #local"] {
            assert!(
                matches!(
                    Domain::parse(line, &settings("staging")),
                    Err(DomainError::InvalidName(_))
                ),
                "{} should be rejected",
                line
            );
        }
    }

    #[test]
    fn test_malformed_descriptor_is_fatal() {
        assert!(matches!(
            Domain::parse("   ", &settings("staging")),
            Err(DomainError::MissingName)
        ));
        assert!(matches!(
            Domain::parse("a.example.com -> app:80 => https://b", &settings("staging")),
            Err(DomainError::ConflictingTargets(_))
        ));
    }

    #[test]
    fn test_accessors_are_idempotent() {
        let domain =
            Domain::parse("admin:secret@example.com -> app:80 #local", &settings("staging"))
                .unwrap();

        assert_eq!(domain.name(), domain.name());
        assert_eq!(domain.stage(), domain.stage());
        assert_eq!(domain.key_path(), domain.key_path());
        assert_eq!(domain.paths(), domain.clone().paths());
        assert_eq!(
            domain.key_path(),
            Path::new("/var/lib/portal/certs/example.com/local/domain.key")
        );
        assert_eq!(domain.csr_path().file_name().unwrap(), "domain.csr");
        assert_eq!(domain.signed_cert_path().file_name().unwrap(), "signed.crt");
        assert_eq!(domain.chained_cert_path().file_name().unwrap(), "chained.crt");
        assert_eq!(
            domain.ongoing_cert_path().file_name().unwrap(),
            "signed.ongoing.crt"
        );
        assert_eq!(domain.htaccess_path().file_name().unwrap(), "htaccess");
        assert_eq!(domain.www_root(), Path::new("/var/www/vhosts/example.com"));
        assert_eq!(
            domain.welcome_page_path(),
            Path::new("/var/www/vhosts/example.com/index.html")
        );
        assert_eq!(domain.descriptor(), "admin:secret@example.com -> app:80 #local");
    }

    #[test]
    fn test_secrets_stay_out_of_debug_and_json() {
        let domain = Domain::parse("admin:secret@example.com", &settings("staging")).unwrap();

        let debug = format!("{:?}", domain);
        assert!(!debug.contains("secret"));

        let json = serde_json::to_value(&domain).unwrap();
        assert_eq!(json["name"], "example.com");
        assert_eq!(json["stage"], "staging");
        assert_eq!(json["basic_auth"]["username"], "admin");
        assert!(json["basic_auth"].get("password").is_none());
        assert!(json.get("descriptor").is_none());
    }

    #[test]
    fn test_domain_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Domain>();
    }
}
