//! The comparator evaluator: `Matcher` and `matches()` (spec §4.1).
//!
//! `Matcher`'s wire encoding is a tagged union over a JSON value, the same
//! shape as the teacher crate's `UrlSelection` (`def/urlsel.rs`): a custom
//! `Deserialize` visitor branching on `visit_bool`/`visit_str`/`visit_seq`/
//! `visit_map` instead of an internally-tagged enum, because the wire shape
//! (bare string, bare array, bare bool, or `{"regex": "..."}`) isn't a single
//! consistent JSON shape serde's derive can express directly.

use std::fmt;
use std::sync::Arc;

use regex_lite::Regex;
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A user-supplied predicate matcher. Not wire-serializable: it only ever
/// exists for policies built up in Rust code.
#[derive(Clone)]
pub struct Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>);

impl Predicate {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Predicate(Arc::new(f))
    }

    fn call(&self, value: &str) -> bool {
        (self.0)(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A compiled regex matcher that remembers its source pattern so it can be
/// serialized back out (`regex_lite::Regex` has no public accessor for the
/// pattern string before 0.1.6's `as_str`, which we rely on here same as the
/// teacher relies on `regex_lite::Regex` elsewhere in `def/sed.rs`).
#[derive(Debug, Clone)]
pub struct MatcherRegex(Regex);

impl MatcherRegex {
    pub fn new(pattern: &str) -> Result<Self, regex_lite::Error> {
        Ok(MatcherRegex(Regex::new(pattern)?))
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.0.is_match(value)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for MatcherRegex {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_str() == other.0.as_str()
    }
}

/// A declarative predicate over a single attribute (or token, or pair
/// value) string (spec §3, "Matcher").
#[derive(Debug, Clone, PartialEq)]
pub enum Matcher {
    /// `"*"` — matches anything.
    Any,
    /// A user function. Rust-only; has no wire form.
    Predicate(Predicate),
    /// A compiled regular expression.
    Regex(MatcherRegex),
    /// An exact string match.
    Exact(String),
    /// Membership in a fixed list of strings.
    List(Vec<String>),
    /// `true` matches the empty string, `false` matches any non-empty string.
    Bool(bool),
}

impl Matcher {
    pub fn exact(s: impl Into<String>) -> Self {
        Matcher::Exact(s.into())
    }

    pub fn list<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Matcher::List(items.into_iter().map(Into::into).collect())
    }

    pub fn regex(pattern: &str) -> Result<Self, regex_lite::Error> {
        Ok(Matcher::Regex(MatcherRegex::new(pattern)?))
    }
}

/// Total and order-sensitive: wildcard, then predicate, then regex, then
/// exact string, then list membership, then boolean emptiness. Any value
/// outside the declared `Matcher` universe is unreachable since `Matcher`
/// is a closed enum, so this function is total by construction.
pub fn matches(matcher: &Matcher, value: &str) -> bool {
    match matcher {
        Matcher::Any => true,
        Matcher::Predicate(p) => p.call(value),
        Matcher::Regex(r) => r.is_match(value),
        Matcher::Exact(s) => s == value,
        Matcher::List(items) => items.iter().any(|item| item == value),
        Matcher::Bool(true) => value.is_empty(),
        Matcher::Bool(false) => !value.is_empty(),
    }
}

impl Serialize for Matcher {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Matcher::Any => serializer.serialize_str("*"),
            Matcher::Exact(s) => serializer.serialize_str(s),
            Matcher::List(items) => items.serialize(serializer),
            Matcher::Bool(b) => serializer.serialize_bool(*b),
            Matcher::Regex(r) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("regex", r.as_str())?;
                map.end()
            }
            Matcher::Predicate(_) => Err(serde::ser::Error::custom(
                "Matcher::Predicate has no wire representation; build this policy from Rust code instead of (de)serializing it",
            )),
        }
    }
}

impl<'de> Deserialize<'de> for Matcher {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(MatcherVisitor)
    }
}

struct MatcherVisitor;

impl<'de> Visitor<'de> for MatcherVisitor {
    type Value = Matcher;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("\"*\", a string, a list of strings, a bool, or {\"regex\": \"...\"}")
    }

    fn visit_bool<E>(self, v: bool) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Matcher::Bool(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        if v == "*" {
            Ok(Matcher::Any)
        } else {
            Ok(Matcher::Exact(v.to_owned()))
        }
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::new();
        if let Some(sz) = seq.size_hint() {
            items.reserve(sz);
        }
        while let Some(item) = seq.next_element::<String>()? {
            items.push(item);
        }
        Ok(Matcher::List(items))
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        #[derive(Deserialize)]
        #[serde(field_identifier, rename_all = "lowercase")]
        enum Field {
            Regex,
        }

        let mut pattern: Option<String> = None;
        while let Some(key) = map.next_key::<Field>()? {
            match key {
                Field::Regex => {
                    if pattern.is_some() {
                        return Err(de::Error::duplicate_field("regex"));
                    }
                    pattern = Some(map.next_value()?);
                }
            }
        }
        let pattern = pattern.ok_or_else(|| de::Error::missing_field("regex"))?;
        MatcherRegex::new(&pattern)
            .map(Matcher::Regex)
            .map_err(|e| de::Error::custom(format!("invalid regex {pattern:?}: {e}")))
    }
}
