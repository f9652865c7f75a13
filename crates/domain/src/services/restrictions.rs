//! Website restriction matching.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HOST_REGEX: Regex =
        Regex::new(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?(\.[a-z0-9]([a-z0-9-]*[a-z0-9])?)*$")
            .expect("host regex is valid");
}

/// Reduces a URL or host to a bare lowercase domain.
///
/// Strips the scheme, credentials, port, path, query, fragment, a trailing
/// dot and a leading `www.`. Returns `None` when no valid host remains.
pub fn normalize_domain(input: &str) -> Option<String> {
    let mut rest = input.trim().to_lowercase();

    if let Some(pos) = rest.find("://") {
        rest = rest[pos + 3..].to_string();
    }
    if let Some(end) = rest.find(['/', '?', '#']) {
        rest.truncate(end);
    }
    if let Some(at) = rest.rfind('@') {
        rest = rest[at + 1..].to_string();
    }
    if let Some(colon) = rest.find(':') {
        rest.truncate(colon);
    }

    let host = rest.trim_end_matches('.');
    let host = host.strip_prefix("www.").unwrap_or(host);

    if host.is_empty() || !HOST_REGEX.is_match(host) {
        return None;
    }
    Some(host.to_string())
}

/// Returns the blocked entry matching `url`, if any.
///
/// A domain matches an entry when it equals it or is a subdomain of it:
/// `mail.example.com` matches `example.com`, `badexample.com` does not.
pub fn find_block<'a>(url: &str, blocked_domains: &'a [String]) -> Option<&'a str> {
    let domain = normalize_domain(url)?;

    blocked_domains.iter().map(String::as_str).find(|entry| {
        match normalize_domain(entry) {
            Some(blocked) => {
                domain == blocked
                    || (domain.len() > blocked.len()
                        && domain.ends_with(blocked.as_str())
                        && domain.as_bytes()[domain.len() - blocked.len() - 1] == b'.')
            }
            None => false,
        }
    })
}

/// Whether `url` is blocked by any entry in `blocked_domains`.
pub fn is_blocked(url: &str, blocked_domains: &[String]) -> bool {
    find_block(url, blocked_domains).is_some()
}
