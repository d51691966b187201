//! Default landing page for domains that neither proxy nor redirect.

use crate::domain::Domain;
use crate::types::{DomainError, DomainResult};
use portal_common::EnvConfig;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Page used when the configured template file does not exist.
const DEFAULT_WELCOME_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Welcome to {{DOMAIN_NAME}}</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: #f9fafb;
            color: #111827;
            display: flex;
            align-items: center;
            justify-content: center;
            height: 100vh;
            margin: 0;
            text-align: center;
        }
        .stage { color: #6b7280; font-size: 0.9rem; }
    </style>
</head>
<body>
    <div>
        <h1>{{DOMAIN_NAME}} is up</h1>
        <p>HTTPS is set up for this domain. Put your site in <code>{{WEB_ROOT}}</code>.</p>
        <p class="stage">Stage: {{STAGE}}</p>
    </div>
</body>
</html>
"#;

/// Values a welcome page template can refer to
pub struct WelcomeContext<'a> {
    pub domain: &'a Domain,
    pub config: &'a EnvConfig,
}

impl WelcomeContext<'_> {
    /// Placeholder names and their values
    pub fn bindings(&self) -> Vec<(&'static str, String)> {
        let domain = self.domain;
        vec![
            ("DOMAIN_NAME", domain.name().to_string()),
            (
                "STAGE",
                domain.stage().map(|s| s.to_string()).unwrap_or_default(),
            ),
            ("UPSTREAM", domain.upstream().unwrap_or_default().to_string()),
            (
                "REDIRECT_TARGET",
                domain.redirect_target_url().unwrap_or_default().to_string(),
            ),
            ("WEB_ROOT", domain.www_root().display().to_string()),
            ("DEFAULT_STAGE", self.config.default_stage.clone()),
            (
                "STORAGE_ROOT",
                self.config.storage_root.display().to_string(),
            ),
        ]
    }
}

/// Renders a template file against a [`WelcomeContext`]
pub trait TemplateRenderer {
    fn render(&self, template: &Path, context: &WelcomeContext<'_>) -> DomainResult<String>;
}

/// Replaces `{{NAME}}` placeholders with HTML-escaped bindings
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderRenderer;

impl PlaceholderRenderer {
    /// Substitute in a single scan; substituted values are never rescanned
    pub fn render_str(source: &str, context: &WelcomeContext<'_>) -> String {
        let bindings = context.bindings();
        let mut page = String::with_capacity(source.len());
        let mut rest = source;

        while let Some(start) = rest.find("{{") {
            page.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                rest = &rest[start..];
                break;
            };

            let name = &after[..end];
            match bindings.iter().find(|(key, _)| *key == name) {
                Some((_, value)) => page.push_str(&escape_html(value)),
                None => page.push_str(&rest[start..start + 2 + end + 2]),
            }
            rest = &after[end + 2..];
        }

        page.push_str(rest);
        page
    }
}

impl TemplateRenderer for PlaceholderRenderer {
    fn render(&self, template: &Path, context: &WelcomeContext<'_>) -> DomainResult<String> {
        let source = match fs::read_to_string(template) {
            Ok(source) => source,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(template = %template.display(), "Welcome template missing, using built-in page");
                DEFAULT_WELCOME_HTML.to_string()
            }
            Err(e) => {
                return Err(DomainError::TemplateError(format!(
                    "Failed to read {}: {}",
                    template.display(),
                    e
                )));
            }
        };

        Ok(Self::render_str(&source, context))
    }
}

/// Filesystem operations needed by the provisioner
pub trait SiteFilesystem {
    fn exists(&self, path: &Path) -> bool;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create `path` with `contents` unless it already exists.
    /// Returns `false` when another writer got there first.
    fn create_new_file(&self, path: &Path, contents: &[u8]) -> io::Result<bool>;
}

/// [`SiteFilesystem`] backed by `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem;

impl SiteFilesystem for LocalFilesystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn create_new_file(&self, path: &Path, contents: &[u8]) -> io::Result<bool> {
        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(e),
        };
        // The handle is closed on drop, including on the error path.
        file.write_all(contents)?;
        file.flush()?;
        Ok(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WelcomeOutcome {
    /// The domain proxies or redirects, nothing to do
    Skipped,
    /// An index page is already in place
    AlreadyPresent,
    /// The welcome page was written to this path
    Created(PathBuf),
}

/// Ensures a welcome page exists for domains without a target
pub struct WelcomePageProvisioner<R = PlaceholderRenderer, F = LocalFilesystem> {
    template_path: PathBuf,
    renderer: R,
    filesystem: F,
}

impl WelcomePageProvisioner {
    pub fn new(template_path: impl Into<PathBuf>) -> Self {
        Self::with_collaborators(template_path, PlaceholderRenderer, LocalFilesystem)
    }
}

impl<R: TemplateRenderer, F: SiteFilesystem> WelcomePageProvisioner<R, F> {
    pub fn with_collaborators(template_path: impl Into<PathBuf>, renderer: R, filesystem: F) -> Self {
        Self {
            template_path: template_path.into(),
            renderer,
            filesystem,
        }
    }

    pub fn template_path(&self) -> &Path {
        &self.template_path
    }

    pub fn ensure(&self, domain: &Domain, config: &EnvConfig) -> DomainResult<WelcomeOutcome> {
        if !domain.serves_welcome_page() {
            debug!(domain = %domain.name(), "Domain has a target, no welcome page needed");
            return Ok(WelcomeOutcome::Skipped);
        }

        let index_html = domain.welcome_page_path();
        if self.filesystem.exists(index_html) {
            debug!(domain = %domain.name(), path = %index_html.display(), "Welcome page already present");
            return Ok(WelcomeOutcome::AlreadyPresent);
        }

        let context = WelcomeContext { domain, config };
        let page = self.renderer.render(&self.template_path, &context)?;

        self.filesystem.create_dir_all(domain.www_root())?;

        if !self.filesystem.create_new_file(index_html, page.as_bytes())? {
            debug!(domain = %domain.name(), "Welcome page created concurrently");
            return Ok(WelcomeOutcome::AlreadyPresent);
        }

        info!(domain = %domain.name(), path = %index_html.display(), "Created welcome page");
        Ok(WelcomeOutcome::Created(index_html.to_path_buf()))
    }
}

fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
