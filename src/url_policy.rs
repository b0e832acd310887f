//! The optional URL-pattern builder utility (spec §6): a pure, deterministic
//! helper that assembles a regular expression matching an allowed set of
//! protocols/hosts, plus a host classifier. Not part of the sanitization
//! core — nothing in `driver.rs`/`walker.rs` calls into this module; it is
//! exposed for callers who want to build a `Matcher::Regex` URL rule.
//!
//! Grounded on the teacher's `def/urlsel.rs` declarative URL-selection
//! document, generalized from "select one or more URLs" to "build a regex
//! describing an allowed set of URLs".

use regex_lite::Regex;
use url::Host;

/// `domain | ipv4 | ipv6`, or `None` if `s` doesn't parse as any kind of
/// host (spec §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKind {
    Domain,
    Ipv4,
    Ipv6,
}

/// Classify `s` as a domain name, IPv4, or IPv6 literal, per `url::Host`'s
/// own parsing rules. Brackets around an IPv6 literal (`[::1]`) are
/// accepted.
pub fn classify_host(s: &str) -> Option<HostKind> {
    let stripped = s.strip_prefix('[').and_then(|s| s.strip_suffix(']')).unwrap_or(s);
    match Host::parse(stripped).ok()? {
        Host::Domain(_) => Some(HostKind::Domain),
        Host::Ipv4(_) => Some(HostKind::Ipv4),
        Host::Ipv6(_) => Some(HostKind::Ipv6),
    }
}

/// Escape a literal string for inclusion in a regex alternation.
fn escape(s: &str) -> String {
    regex_lite::escape(s)
}

/// Build a regex matching `protocol://host[...]` for any of the given
/// protocols and hosts (spec §6): protocol grammar
/// `[a-z][a-z0-9+.\-]*`, hosts matched literally (IPv6 always bracketed in
/// the generated pattern, whether or not the input host string was
/// bracketed), optionally allowing bare relative URLs (no protocol/host at
/// all). Anchored `^...$`, case-insensitive.
pub fn build_allowed_url_regex(protocols: &[&str], hosts: &[&str], allow_relative: bool) -> Result<Regex, regex_lite::Error> {
    let protocol_alt = protocols.iter().map(|p| escape(p)).collect::<Vec<_>>().join("|");

    let host_alt = hosts
        .iter()
        .map(|h| {
            let bare = h.strip_prefix('[').and_then(|s| s.strip_suffix(']')).unwrap_or(h);
            match classify_host(h) {
                Some(HostKind::Ipv6) => format!(r"\[{}\]", escape(bare)),
                _ => escape(bare),
            }
        })
        .collect::<Vec<_>>()
        .join("|");

    let absolute = format!(r"(?:{protocol_alt})://(?:{host_alt})(?:/[^\s]*)?");
    let pattern = if allow_relative {
        format!(r"^(?:{absolute}|/[^\s]*|[^\s:/]+(?:/[^\s]*)?)$")
    } else {
        format!(r"^{absolute}$")
    };

    Regex::new(&format!("(?i){pattern}"))
}
