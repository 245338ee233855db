//! Public Suffix List (PSL) helpers.
//!
//! The jar groups cookies by registrable domain (eTLD+1), and refuses
//! `Domain=` attributes naming a public suffix such as `.com` or `.co.uk`.
//!
//! Uses Mozilla's Public Suffix List via the `psl` crate.

use psl::{List, Psl};
use std::net::IpAddr;

/// True if `domain` is itself a public suffix ("com", "co.uk", "github.io").
pub fn is_public_suffix(domain: &str) -> bool {
    let lower = domain.to_ascii_lowercase();
    List.suffix(lower.as_bytes())
        .is_some_and(|suffix| suffix.as_bytes() == lower.as_bytes())
}

/// Registrable domain (eTLD+1), or `None` when `domain` is a public suffix.
pub fn registrable_domain(domain: &str) -> Option<String> {
    let lower = domain.to_ascii_lowercase();
    psl::domain(lower.as_bytes())
        .and_then(|d| std::str::from_utf8(d.as_bytes()).ok())
        .map(str::to_string)
}

/// Whether a `Domain=` attribute may be accepted from `host`.
///
/// The domain must not be a public suffix, and `host` must equal it or sit
/// below it.
pub fn is_valid_cookie_domain(cookie_domain: &str, host: &str) -> bool {
    let domain = cookie_domain.trim_start_matches('.').to_ascii_lowercase();
    let host = host.to_ascii_lowercase();

    if domain.is_empty() || is_public_suffix(&domain) {
        return false;
    }
    host == domain
        || host
            .strip_suffix(domain.as_str())
            .is_some_and(|rest| rest.ends_with('.'))
}

/// Group key for cookies set on `host` in the jar.
///
/// The registrable domain, or the host itself for IP addresses, single-label
/// hosts and bare public suffixes.
pub fn jar_key(host: &str) -> String {
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.parse::<IpAddr>().is_ok() {
        return host.to_string();
    }
    registrable_domain(host).unwrap_or_else(|| host.to_ascii_lowercase())
}
