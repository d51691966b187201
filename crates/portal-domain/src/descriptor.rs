//! Descriptor grammar
//!
//! ```text
//! descriptor := [ "@" ] [ user ":" password "@" ] host
//!               [ "->" upstream | "=>" redirect ] [ "@" legacy ] [ "#" stage ]
//! ```
//!
//! The host ends at the first whitespace, `->` or `=>` and must be a plain
//! domain name. Targets end at the next whitespace. The `@legacy` segment of
//! older configuration files is kept verbatim; it may also follow the stage
//! marker. Nothing else may follow the stage marker.

use crate::types::{DomainError, DomainResult};
use serde::Serialize;
use std::fmt;

const UPSTREAM_ARROW: &str = "->";
const REDIRECT_ARROW: &str = "=>";

/// HTTP basic auth credentials embedded in the descriptor
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct BasicAuth {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuth")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where the traffic of a domain goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Proxied to this backend address
    Upstream(String),
    /// Redirected to this URL
    Redirect(String),
}

/// Result of the single tokenizer pass over a descriptor line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    pub name: String,
    pub target: Option<Target>,
    pub basic_auth: Option<BasicAuth>,
    /// Raw `#stage` marker, validated by the stage resolver
    pub stage_marker: Option<String>,
    /// Trailing ` @token` segment of older configuration files
    pub legacy_auth: Option<String>,
}

impl Descriptor {
    pub fn parse(text: &str) -> DomainResult<Self> {
        let text = text.trim();
        let text = text.strip_prefix('@').unwrap_or(text);

        let (lead, rest) = split_leading_token(text);
        let (name, basic_auth) = parse_lead(lead)?;

        let mut target = None;
        let mut stage_marker = None;
        let mut legacy_auth = None;
        let mut seen_upstream = false;
        let mut seen_redirect = false;
        let mut rest = rest;

        loop {
            rest = rest.trim_start();
            if rest.is_empty() {
                break;
            }
            if let Some(after) = rest.strip_prefix('@') {
                let (token, remainder) = next_token(after);
                if token.is_empty() || legacy_auth.is_some() {
                    return Err(DomainError::UnexpectedToken(format!("@{}", token)));
                }
                legacy_auth = Some(token.to_string());
                rest = remainder;
                continue;
            }
            if stage_marker.is_some() {
                return Err(DomainError::UnexpectedToken(next_token(rest).0.to_string()));
            }

            if let Some(after) = rest.strip_prefix(UPSTREAM_ARROW) {
                if seen_upstream {
                    return Err(DomainError::UnexpectedToken(UPSTREAM_ARROW.to_string()));
                }
                if seen_redirect {
                    return Err(DomainError::ConflictingTargets(name));
                }
                seen_upstream = true;
                let (token, remainder) = next_token(after.trim_start());
                if is_target(token, &['#', '@']) {
                    target = Some(Target::Upstream(token.to_string()));
                    rest = remainder;
                } else {
                    rest = after;
                }
            } else if let Some(after) = rest.strip_prefix(REDIRECT_ARROW) {
                if seen_redirect {
                    return Err(DomainError::UnexpectedToken(REDIRECT_ARROW.to_string()));
                }
                if seen_upstream {
                    return Err(DomainError::ConflictingTargets(name));
                }
                seen_redirect = true;
                let (token, remainder) = next_token(after.trim_start());
                if is_target(token, &['#']) {
                    target = Some(Target::Redirect(token.to_string()));
                    rest = remainder;
                } else {
                    rest = after;
                }
            } else if let Some(after) = rest.strip_prefix('#') {
                let (token, remainder) = next_token(after);
                if token.is_empty() {
                    return Err(DomainError::UnexpectedToken("#".to_string()));
                }
                stage_marker = Some(token.to_string());
                rest = remainder;
            } else {
                return Err(DomainError::UnexpectedToken(next_token(rest).0.to_string()));
            }
        }

        Ok(Self {
            name,
            target,
            basic_auth,
            stage_marker,
            legacy_auth,
        })
    }

    pub fn upstream(&self) -> Option<&str> {
        match &self.target {
            Some(Target::Upstream(upstream)) => Some(upstream),
            _ => None,
        }
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match &self.target {
            Some(Target::Redirect(url)) => Some(url),
            _ => None,
        }
    }
}

/// Domain name of a descriptor, credentials stripped
pub fn parse_name(descriptor: &str) -> DomainResult<String> {
    Descriptor::parse(descriptor).map(|d| d.name)
}

/// Upstream declared with `->`, `None` when absent or malformed
pub fn parse_upstream(descriptor: &str) -> Option<String> {
    Descriptor::parse(descriptor)
        .ok()
        .and_then(|d| d.upstream().map(str::to_string))
}

/// Redirect target declared with `=>`, `None` when absent or malformed
pub fn parse_redirect_target(descriptor: &str) -> Option<String> {
    Descriptor::parse(descriptor)
        .ok()
        .and_then(|d| d.redirect_target().map(str::to_string))
}

/// Credentials of `user:password@host`, `None` when absent or malformed
pub fn parse_basic_auth(descriptor: &str) -> Option<BasicAuth> {
    Descriptor::parse(descriptor).ok().and_then(|d| d.basic_auth)
}

/// Split off the leading `[auth@]host` token
fn split_leading_token(text: &str) -> (&str, &str) {
    let end = text
        .char_indices()
        .find(|&(i, c)| {
            c.is_whitespace()
                || text[i..].starts_with(UPSTREAM_ARROW)
                || text[i..].starts_with(REDIRECT_ARROW)
        })
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    text.split_at(end)
}

fn parse_lead(lead: &str) -> DomainResult<(String, Option<BasicAuth>)> {
    let (host, basic_auth) = match lead.rsplit_once('@') {
        Some((credentials, host)) => {
            let (username, password) = credentials
                .split_once(':')
                .filter(|(user, _)| !user.is_empty())
                .ok_or_else(|| DomainError::InvalidBasicAuth(host.to_string()))?;
            let auth = BasicAuth {
                username: username.to_string(),
                password: password.to_string(),
            };
            (host, Some(auth))
        }
        None => (lead, None),
    };

    if host.is_empty() {
        return Err(DomainError::MissingName);
    }
    if !is_valid_domain(host) {
        return Err(DomainError::InvalidName(host.to_string()));
    }

    Ok((host.to_string(), basic_auth))
}

/// The name becomes a path segment, so only plain DNS labels are accepted
fn is_valid_domain(domain: &str) -> bool {
    if domain.is_empty() || domain.len() > 253 {
        return false;
    }

    domain.split('.').all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
            && !label.starts_with('-')
            && !label.ends_with('-')
    })
}

fn next_token(text: &str) -> (&str, &str) {
    let end = text.find(char::is_whitespace).unwrap_or(text.len());
    text.split_at(end)
}

fn is_target(token: &str, forbidden_leads: &[char]) -> bool {
    token
        .chars()
        .next()
        .is_some_and(|c| !forbidden_leads.contains(&c))
}
