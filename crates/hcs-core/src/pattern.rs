//! Content settings patterns
//!
//! A `ContentSettingsPattern` is the canonical, structural form of a match
//! rule: optional scheme, host (exact, domain wildcard or any), optional port
//! and, for `file` URLs only, an exact path. Two inputs that normalize to the
//! same parts are the same pattern.
//!
//! Two grammars produce patterns:
//!
//! - extension match patterns (`*://*.google.com/*`, `<all_urls>`), parsed by
//!   [`parse_extension_pattern`];
//! - the canonical form written by `Display` (`[*.]google.com`,
//!   `http://www.example.com:8080`), parsed by `FromStr`.
//!
//! # Examples
//!
//! ```
//! use hcs_core::pattern::parse_extension_pattern;
//!
//! let pattern = parse_extension_pattern("*://*.google.com/*").unwrap();
//! assert_eq!(pattern.to_string(), "[*.]google.com");
//! assert!(pattern.matches_host("mail.google.com"));
//! ```

use std::fmt;
use std::str::FromStr;

use crate::host::{
    canonical_port, is_same_or_subdomain, is_valid_host, label_count, normalize_host,
    split_host_port,
};
use crate::url::{is_valid_scheme, HostQuery};

/// Extension keyword matching every URL.
pub const ALL_URLS: &str = "<all_urls>";

/// Schemes an extension pattern may name explicitly.
const EXTENSION_SCHEMES: &[&str] = &[
    "http",
    "https",
    "ftp",
    "file",
    "chrome",
    "chrome-extension",
    "ws",
    "wss",
];

const FILE_SCHEME: &str = "file";
const DOMAIN_WILDCARD: &str = "[*.]";

// =============================================================================
// Errors
// =============================================================================

/// Reason a pattern string was rejected. `Display` is the user-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    #[error("Missing scheme separator.")]
    MissingSchemeSeparator,
    #[error("Invalid scheme.")]
    InvalidScheme,
    #[error("Empty host.")]
    EmptyHost,
    #[error("Invalid host wildcard.")]
    InvalidHostWildcard,
    #[error("Invalid host.")]
    InvalidHost,
    #[error("Invalid port.")]
    InvalidPort,
    #[error("Empty path.")]
    EmptyPath,
    #[error("Specific paths are not allowed.")]
    SpecificPath,
    #[error("Path wildcards in file URL patterns are not allowed.")]
    FilePathWildcard,
}

// =============================================================================
// Pattern
// =============================================================================

/// Host part of a pattern.
///
/// Variant order is the specificity order: `Any < Domain < Exact`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HostPart {
    /// Any host (`*`)
    Any,
    /// The domain or any subdomain of it (`[*.]example.com`)
    Domain(String),
    /// Exactly this host
    Exact(String),
}

/// Canonical match pattern. See the module docs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentSettingsPattern {
    /// `None` matches any scheme
    scheme: Option<String>,
    host: HostPart,
    /// `None` matches any port
    port: Option<String>,
    /// Exact path; only set for `file` patterns
    path: Option<String>,
}

/// Ranking used to pick the winning pattern during lookups.
///
/// Field order is significant: derived `Ord` compares host class first, then
/// domain depth, then port, then scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Specificity {
    host_rank: u8,
    domain_labels: usize,
    has_port: bool,
    has_scheme: bool,
}

impl ContentSettingsPattern {
    /// Pattern matching everything (`*`).
    pub fn wildcard() -> Self {
        Self {
            scheme: None,
            host: HostPart::Any,
            port: None,
            path: None,
        }
    }

    /// Exact-host pattern for any scheme and port.
    pub fn for_host(host: &str) -> Result<Self, PatternError> {
        let host = normalize_host(host);
        if host.is_empty() {
            return Err(PatternError::EmptyHost);
        }
        if !is_valid_host(&host) {
            return Err(PatternError::InvalidHost);
        }
        Ok(Self {
            host: HostPart::Exact(host),
            ..Self::wildcard()
        })
    }

    /// Domain-wildcard pattern (`[*.]domain`) for any scheme and port.
    pub fn for_domain(domain: &str) -> Result<Self, PatternError> {
        let host = parse_host_part(domain, true)?;
        Ok(Self {
            host,
            ..Self::wildcard()
        })
    }

    fn file(path: &str) -> Self {
        Self {
            scheme: Some(FILE_SCHEME.to_string()),
            host: HostPart::Any,
            port: None,
            path: Some(path.to_string()),
        }
    }

    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    pub fn host(&self) -> &HostPart {
        &self.host
    }

    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// True for the pattern matching everything.
    pub fn is_wildcard(&self) -> bool {
        *self == Self::wildcard()
    }

    /// Match against a parsed lookup key.
    ///
    /// Scheme and port constraints need a query that carries them, so a
    /// scheme- or port-qualified pattern never matches a bare host.
    pub fn matches(&self, query: &HostQuery) -> bool {
        if let Some(scheme) = &self.scheme {
            if query.scheme.as_ref() != Some(scheme) {
                return false;
            }
        }

        if let Some(path) = &self.path {
            return query.path.as_ref() == Some(path);
        }

        if let Some(port) = &self.port {
            if query.port.as_ref() != Some(port) {
                return false;
            }
        }

        match &self.host {
            HostPart::Any => true,
            HostPart::Domain(domain) => is_same_or_subdomain(&query.host, domain),
            HostPart::Exact(host) => query.host == *host,
        }
    }

    /// Match against a bare host or URL string.
    pub fn matches_host(&self, host_or_url: &str) -> bool {
        self.matches(&HostQuery::parse(host_or_url))
    }

    pub fn specificity(&self) -> Specificity {
        let (host_rank, domain_labels) = match (&self.path, &self.host) {
            (Some(_), _) => (3, 0),
            (None, HostPart::Exact(_)) => (2, 0),
            (None, HostPart::Domain(domain)) => (1, label_count(domain)),
            (None, HostPart::Any) => (0, 0),
        };
        Specificity {
            host_rank,
            domain_labels,
            has_port: self.port.is_some(),
            has_scheme: self.scheme.is_some(),
        }
    }
}

impl fmt::Display for ContentSettingsPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(path) = &self.path {
            return write!(f, "{FILE_SCHEME}://{path}");
        }

        // A port forces a scheme prefix.
        match (&self.scheme, &self.port) {
            (Some(scheme), _) => write!(f, "{scheme}://")?,
            (None, Some(_)) => f.write_str("*://")?,
            (None, None) => {}
        }

        match &self.host {
            HostPart::Any => f.write_str("*")?,
            HostPart::Domain(domain) => write!(f, "{DOMAIN_WILDCARD}{domain}")?,
            HostPart::Exact(host) => f.write_str(host)?,
        }

        if let Some(port) = &self.port {
            write!(f, ":{port}")?;
        }
        Ok(())
    }
}

/// Parse the canonical form, or a bare host.
impl FromStr for ContentSettingsPattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        let (scheme, rest) = match s.find("://") {
            Some(sep) => {
                let scheme = s[..sep].to_ascii_lowercase();
                let scheme = if scheme == "*" {
                    None
                } else if is_valid_scheme(&scheme) {
                    Some(scheme)
                } else {
                    return Err(PatternError::InvalidScheme);
                };
                (scheme, &s[sep + 3..])
            }
            None => (None, s),
        };

        if scheme.as_deref() == Some(FILE_SCHEME) {
            return parse_file_path(rest);
        }

        let (authority, path) = split_path(rest);
        if !(path.is_empty() || path == "/" || path == "/*") {
            return Err(PatternError::SpecificPath);
        }

        let (host, port) = parse_authority(authority, true)?;
        Ok(Self {
            scheme,
            host,
            port,
            path: None,
        })
    }
}

// =============================================================================
// Extension Patterns
// =============================================================================

/// Parse an extension match pattern into a content settings pattern.
///
/// Content settings work per host, so every non-file pattern must use the
/// `/*` path. File patterns name one exact file.
pub fn parse_extension_pattern(pattern: &str) -> Result<ContentSettingsPattern, PatternError> {
    let pattern = pattern.trim();
    if pattern == ALL_URLS {
        return Ok(ContentSettingsPattern::wildcard());
    }

    let sep = pattern
        .find("://")
        .ok_or(PatternError::MissingSchemeSeparator)?;

    let scheme = pattern[..sep].to_ascii_lowercase();
    let scheme = if scheme == "*" {
        None
    } else if EXTENSION_SCHEMES.contains(&scheme.as_str()) {
        Some(scheme)
    } else {
        return Err(PatternError::InvalidScheme);
    };

    let rest = &pattern[sep + 3..];
    if scheme.as_deref() == Some(FILE_SCHEME) {
        return parse_file_path(rest);
    }

    let (authority, path) = split_path(rest);
    let (host, port) = parse_authority(authority, false)?;

    if path.is_empty() {
        return Err(PatternError::EmptyPath);
    }
    if path != "/*" {
        return Err(PatternError::SpecificPath);
    }

    Ok(ContentSettingsPattern {
        scheme,
        host,
        port,
        path: None,
    })
}

// =============================================================================
// Shared Parsing Helpers
// =============================================================================

/// Split `authority/path` at the first '/'.
fn split_path(rest: &str) -> (&str, &str) {
    match rest.find('/') {
        Some(pos) => (&rest[..pos], &rest[pos..]),
        None => (rest, ""),
    }
}

/// Parse what follows `file://`: an optional `localhost` and an exact path.
fn parse_file_path(rest: &str) -> Result<ContentSettingsPattern, PatternError> {
    let (authority, path) = split_path(rest);
    if !authority.is_empty() && !authority.eq_ignore_ascii_case("localhost") {
        return Err(PatternError::InvalidHost);
    }
    if path.is_empty() {
        return Err(PatternError::EmptyPath);
    }
    if path.contains('*') {
        return Err(PatternError::FilePathWildcard);
    }
    Ok(ContentSettingsPattern::file(path))
}

/// Parse `host[:port]`. A `*` port means any port.
/// The `[*.]` host prefix is only accepted in the canonical form.
fn parse_authority(
    authority: &str,
    allow_domain_prefix: bool,
) -> Result<(HostPart, Option<String>), PatternError> {
    if authority.is_empty() {
        return Err(PatternError::EmptyHost);
    }

    let (is_domain, authority) = match authority.strip_prefix(DOMAIN_WILDCARD) {
        Some(rest) if allow_domain_prefix => (true, rest),
        _ => (false, authority),
    };

    let (host, port) = split_host_port(authority);
    let host = parse_host_part(host, is_domain)?;

    let port = match port {
        None | Some("*") => None,
        Some(port) => Some(canonical_port(port).ok_or(PatternError::InvalidPort)?),
    };

    Ok((host, port))
}

/// Parse a host, recognising `*` and a leading `*.` label.
/// With `is_domain` set the host is already known to be a domain wildcard.
///
/// Wildcards are checked on the host as written, before normalization.
fn parse_host_part(host: &str, is_domain: bool) -> Result<HostPart, PatternError> {
    let host = host.trim();
    if !is_domain && host == "*" {
        return Ok(HostPart::Any);
    }

    let (is_domain, host) = match host.strip_prefix("*.") {
        Some(rest) if !is_domain => (true, rest),
        _ => (is_domain, host),
    };
    if host.contains('*') {
        return Err(PatternError::InvalidHostWildcard);
    }

    let host = normalize_host(host);
    if host.is_empty() {
        return Err(PatternError::EmptyHost);
    }
    if !is_valid_host(&host) {
        return Err(PatternError::InvalidHost);
    }

    Ok(if is_domain {
        HostPart::Domain(host)
    } else {
        HostPart::Exact(host)
    })
}
