//! `htmlward`: a policy-driven HTML sanitizer. Given an untrusted HTML
//! fragment and a declarative [`Policy`], [`sanitize`] rewrites the parsed
//! tree in place — admitting tags, validating attribute values against
//! scalar/set/record rules, enforcing structural limits — and serializes the
//! surviving tree back to a string.
//!
//! The tree model and parser/serializer are external collaborators
//! (`html5ever` / `markup5ever_rcdom`), kept behind [`dom`] and [`driver`];
//! the rewriting core itself (matcher, parsers, error taxonomy, attribute
//! sanitizer, walker) has no opinion on how HTML gets parsed.

pub mod attributes;
pub mod dom;
pub mod driver;
pub mod errors;
pub mod matcher;
pub mod parse;
pub mod policy;
pub mod url_policy;
pub mod walker;

#[doc(hidden)]
pub mod logger;
#[cfg(test)]
pub mod util;

pub use errors::{ErrorHandling, ErrorKind, SanitizeError};
pub use matcher::Matcher;
pub use policy::{AttrRule, Limits, Policy, TagRule};

/// Sanitize `html` against `policy`, returning the serialized surviving
/// fragment (spec §6). Empty input returns empty output without invoking
/// the parser. Propagates a [`SanitizeError`] when a `throwError`-class
/// strategy fires; per the spec, the caller must then discard the tree —
/// this function owns no state across calls, so there is nothing further
/// to clean up on the caller's side.
pub fn sanitize(html: &str, policy: &Policy) -> Result<String, SanitizeError> {
    driver::sanitize(html, policy)
}
