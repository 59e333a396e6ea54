//! Hostname helpers shared by pattern parsing and lookups
//!
//! # Examples
//!
//! ```
//! use hcs_core::host::walk_host_suffixes;
//!
//! let suffixes: Vec<&str> = walk_host_suffixes("a.example.com").collect();
//! assert_eq!(suffixes, ["a.example.com", "example.com", "com"]);
//! ```

/// Lowercase a host and drop a trailing dot.
pub fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Check host syntax.
///
/// Accepts dot-separated labels of ASCII letters, digits, '-' and '_', or a
/// bracketed IPv6 literal.
pub fn is_valid_host(host: &str) -> bool {
    if host.is_empty() {
        return false;
    }

    if let Some(inner) = host.strip_prefix('[') {
        return match inner.strip_suffix(']') {
            Some(addr) => {
                !addr.is_empty() && addr.bytes().all(|b| b.is_ascii_hexdigit() || b == b':' || b == b'.')
            }
            None => false,
        };
    }

    host.split('.').all(|label| {
        !label.is_empty()
            && label
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    })
}

/// Split `host[:port]`, keeping IPv6 brackets on the host.
pub fn split_host_port(input: &str) -> (&str, Option<&str>) {
    let host_end = if input.starts_with('[') {
        match input.find(']') {
            Some(close) => close + 1,
            None => return (input, None),
        }
    } else {
        match input.find(':') {
            Some(pos) => pos,
            None => return (input, None),
        }
    };

    let host = &input[..host_end];
    match input[host_end..].strip_prefix(':') {
        Some(port) => (host, Some(port)),
        None => (host, None),
    }
}

/// Canonical form of a port string (`"080"` -> `"80"`).
///
/// Returns `None` unless the input is 1 to 5 ASCII digits in `u16` range.
pub fn canonical_port(port: &str) -> Option<String> {
    if port.is_empty() || port.len() > 5 || !port.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    port.parse::<u16>().ok().map(|p| p.to_string())
}

/// Get the parent domain (strip leftmost label).
pub fn get_parent_domain(host: &str) -> Option<&str> {
    match host.find('.') {
        Some(idx) if idx < host.len() - 1 => Some(&host[idx + 1..]),
        _ => None,
    }
}

/// Iterator for suffix-walking a host from full host to its last label.
pub struct HostSuffixIter<'a> {
    current: Option<&'a str>,
}

impl<'a> Iterator for HostSuffixIter<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.current?;
        self.current = get_parent_domain(result);
        Some(result)
    }
}

/// Walk host suffixes from most specific to least specific.
pub fn walk_host_suffixes(host: &str) -> HostSuffixIter<'_> {
    HostSuffixIter {
        current: if host.is_empty() || host.starts_with('[') {
            None
        } else {
            Some(host)
        },
    }
}

/// True if `host` is `domain` or a dot-separated subdomain of it.
pub fn is_same_or_subdomain(host: &str, domain: &str) -> bool {
    walk_host_suffixes(host).any(|suffix| suffix == domain)
}

/// Number of labels in a host; used to rank domain wildcards.
pub fn label_count(host: &str) -> usize {
    if host.is_empty() {
        0
    } else {
        host.split('.').count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("WWW.Example.COM."), "www.example.com");
        assert_eq!(normalize_host(" example.com "), "example.com");
    }

    #[test]
    fn test_is_valid_host() {
        assert!(is_valid_host("www.example.com"));
        assert!(is_valid_host("my_host-1"));
        assert!(is_valid_host("127.0.0.1"));
        assert!(is_valid_host("[::1]"));
        assert!(!is_valid_host(""));
        assert!(!is_valid_host("a..b"));
        assert!(!is_valid_host("exa mple.com"));
        assert!(!is_valid_host("*.example.com"));
        assert!(!is_valid_host("[::1"));
    }

    #[test]
    fn test_split_host_port() {
        assert_eq!(split_host_port("example.com"), ("example.com", None));
        assert_eq!(split_host_port("example.com:8080"), ("example.com", Some("8080")));
        assert_eq!(split_host_port("[::1]:8080"), ("[::1]", Some("8080")));
        assert_eq!(split_host_port("[::1]"), ("[::1]", None));
    }

    #[test]
    fn test_canonical_port() {
        assert_eq!(canonical_port("8080").as_deref(), Some("8080"));
        assert_eq!(canonical_port("080").as_deref(), Some("80"));
        assert_eq!(canonical_port("00000").as_deref(), Some("0"));
        assert_eq!(canonical_port(""), None);
        assert_eq!(canonical_port("80a"), None);
        assert_eq!(canonical_port("+80"), None);
        assert_eq!(canonical_port("70000"), None);
        assert_eq!(canonical_port("000080"), None);
    }

    #[test]
    fn test_get_parent_domain() {
        assert_eq!(get_parent_domain("sub.example.com"), Some("example.com"));
        assert_eq!(get_parent_domain("example.com"), Some("com"));
        assert_eq!(get_parent_domain("com"), None);
        assert_eq!(get_parent_domain(""), None);
    }

    #[test]
    fn test_is_same_or_subdomain() {
        assert!(is_same_or_subdomain("google.com", "google.com"));
        assert!(is_same_or_subdomain("mail.google.com", "google.com"));
        assert!(!is_same_or_subdomain("notgoogle.com", "google.com"));
        assert!(!is_same_or_subdomain("com", "google.com"));
    }
}
