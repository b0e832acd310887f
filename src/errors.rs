//! The two-level error-handling taxonomy (spec §4.4, §7): per-violation
//! strategy enums, the `ErrorHandling` policy slot, `SanitizeError`, and the
//! fallback-chain handler functions that `attributes.rs`/`walker.rs` call
//! into.
//!
//! `SanitizeError` itself is a plain struct with a hand-written `Display`/
//! `Error` impl, the same way the teacher's `BookDefValidationError`
//! (`def.rs`) is written — no `thiserror` in this crate, since the teacher
//! never reaches for it either.

use std::fmt;

use log::{debug, trace};
use markup5ever_rcdom::Handle;
use serde::{Deserialize, Serialize};

use crate::dom;
use crate::parse::Pair;

macro_rules! level_strategy {
    ($name:ident { $($variant:ident),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
        #[serde(rename_all = "camelCase")]
        pub enum $name {
            $($variant),+
        }
    };
}

level_strategy!(CollectionTooManyStrategy { DropExtra });
level_strategy!(RecordDuplicateStrategy {
    DropDuplicates,
    KeepDuplicates,
    KeepFirst,
    KeepLast,
});
level_strategy!(RecordValueStrategy { DropPair });
level_strategy!(SetValueStrategy { DropValue });
level_strategy!(ValueTooLongStrategy { TrimExcess });
level_strategy!(AttributeValueStrategy { ApplyDefaultValue });
level_strategy!(AttributeStrategy { DiscardAttribute });
level_strategy!(TagStrategy {
    DiscardElement,
    UnwrapElement,
    ThrowError,
});
level_strategy!(TagChildrenStrategy {
    DiscardElement,
    DiscardFirsts,
    DiscardLasts,
    ThrowError,
});
level_strategy!(TagNestingStrategy {
    DiscardElement,
    ThrowError,
});

/// `policy.errorHandling`: one strategy slot per violation class, all
/// optional. An unset slot escalates to the next-broader level per the
/// fallback chain in spec §4.4's table.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ErrorHandling {
    pub collection_too_many: Option<CollectionTooManyStrategy>,
    pub record_duplicate: Option<RecordDuplicateStrategy>,
    pub record_value: Option<RecordValueStrategy>,
    pub set_value: Option<SetValueStrategy>,
    pub value_too_long: Option<ValueTooLongStrategy>,
    pub attribute_value: Option<AttributeValueStrategy>,
    pub attribute: Option<AttributeStrategy>,
    pub tag: Option<TagStrategy>,
    pub tag_children: Option<TagChildrenStrategy>,
    pub tag_nesting: Option<TagNestingStrategy>,
}

/// What kind of policy violation produced a [`SanitizeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnknownTag,
    UnknownAttribute,
    RejectedValue,
    TooManyChildren,
    NestingExceeded,
}

/// A `throwError`-class failure. Carries whatever of tag/attribute/key/
/// value applies, for a human-readable diagnostic (spec §7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SanitizeError {
    pub kind: ErrorKind,
    pub tag: String,
    pub attribute: Option<String>,
    pub key: Option<String>,
    pub value: Option<String>,
}

impl SanitizeError {
    fn unknown_tag(tag: &str) -> Self {
        SanitizeError {
            kind: ErrorKind::UnknownTag,
            tag: tag.to_owned(),
            attribute: None,
            key: None,
            value: None,
        }
    }

    fn unknown_attribute(tag: &str, attribute: &str) -> Self {
        SanitizeError {
            kind: ErrorKind::UnknownAttribute,
            tag: tag.to_owned(),
            attribute: Some(attribute.to_owned()),
            key: None,
            value: None,
        }
    }

    fn rejected_value(tag: &str, attribute: &str, key: Option<&str>, value: &str) -> Self {
        SanitizeError {
            kind: ErrorKind::RejectedValue,
            tag: tag.to_owned(),
            attribute: Some(attribute.to_owned()),
            key: key.map(str::to_owned),
            value: Some(value.to_owned()),
        }
    }

    fn too_many_children(tag: &str, limit: u32) -> Self {
        SanitizeError {
            kind: ErrorKind::TooManyChildren,
            tag: tag.to_owned(),
            attribute: None,
            key: None,
            value: Some(limit.to_string()),
        }
    }

    fn nesting_exceeded(tag: &str, limit: u32) -> Self {
        SanitizeError {
            kind: ErrorKind::NestingExceeded,
            tag: tag.to_owned(),
            attribute: None,
            key: None,
            value: Some(limit.to_string()),
        }
    }
}

impl fmt::Display for SanitizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::UnknownTag => write!(f, "tag <{}> is not permitted by policy", self.tag),
            ErrorKind::UnknownAttribute => write!(
                f,
                "attribute \"{}\" on <{}> is not permitted by policy",
                self.attribute.as_deref().unwrap_or(""),
                self.tag
            ),
            ErrorKind::RejectedValue => {
                write!(
                    f,
                    "attribute \"{}\" on <{}>{} has value {:?}, rejected by policy",
                    self.attribute.as_deref().unwrap_or(""),
                    self.tag,
                    self.key
                        .as_deref()
                        .map(|k| format!(" (key {k:?})"))
                        .unwrap_or_default(),
                    self.value.as_deref().unwrap_or(""),
                )
            }
            ErrorKind::TooManyChildren => write!(
                f,
                "<{}> has more children than its policy limit of {}",
                self.tag,
                self.value.as_deref().unwrap_or("?")
            ),
            ErrorKind::NestingExceeded => write!(
                f,
                "<{}> exceeds its policy nesting limit of {}",
                self.tag,
                self.value.as_deref().unwrap_or("?")
            ),
        }
    }
}

impl std::error::Error for SanitizeError {}

/// Why `tag`-level handling was invoked: either the tag itself wasn't
/// admitted, or a narrower attribute-level violation escalated all the way
/// up (spec §4.4's fallback chain: `attribute` falls back to `tag`).
pub enum TagFailureCause<'a> {
    UnknownTag,
    UnresolvedAttribute {
        attribute: &'a str,
    },
    RejectedAttributeValue {
        attribute: &'a str,
        key: Option<&'a str>,
        value: &'a str,
    },
}

/// `tag`-level handler (spec §4.4 table, native strategies `discardElement`
/// / `unwrapElement` / `throwError`, default `throwError`). Always resolves
/// to "element gone" (`Ok(false)`) unless it throws — every native strategy
/// at this level removes the element from the tree one way or another.
pub fn handle_tag(
    handling: &ErrorHandling,
    element: &Handle,
    tag: &str,
    cause: TagFailureCause,
) -> Result<bool, SanitizeError> {
    match handling.tag.unwrap_or(TagStrategy::ThrowError) {
        TagStrategy::DiscardElement => {
            trace!("discarding <{tag}> (tag-level violation)");
            dom::detach(element);
            Ok(false)
        }
        TagStrategy::UnwrapElement => {
            trace!("unwrapping <{tag}> (tag-level violation)");
            dom::unwrap(element);
            Ok(false)
        }
        TagStrategy::ThrowError => Err(match cause {
            TagFailureCause::UnknownTag => SanitizeError::unknown_tag(tag),
            TagFailureCause::UnresolvedAttribute { attribute } => {
                SanitizeError::unknown_attribute(tag, attribute)
            }
            TagFailureCause::RejectedAttributeValue {
                attribute,
                key,
                value,
            } => SanitizeError::rejected_value(tag, attribute, key, value),
        }),
    }
}

/// `tagChildren`-level handler (native: `discardElement` / `discardFirsts`
/// / `discardLasts`, default `throwError`). `excess` is the number of
/// children over the limit.
pub fn handle_tag_children(
    handling: &ErrorHandling,
    element: &Handle,
    tag: &str,
    limit: u32,
    excess: usize,
) -> Result<bool, SanitizeError> {
    match handling.tag_children.unwrap_or(TagChildrenStrategy::ThrowError) {
        TagChildrenStrategy::DiscardElement => {
            dom::detach(element);
            Ok(false)
        }
        TagChildrenStrategy::DiscardFirsts => {
            dom::discard_children(element, excess, true);
            Ok(true)
        }
        TagChildrenStrategy::DiscardLasts => {
            dom::discard_children(element, excess, false);
            Ok(true)
        }
        TagChildrenStrategy::ThrowError => Err(SanitizeError::too_many_children(tag, limit)),
    }
}

/// `tagNesting`-level handler (native: `discardElement`, default
/// `throwError`).
pub fn handle_tag_nesting(
    handling: &ErrorHandling,
    element: &Handle,
    tag: &str,
    limit: u32,
) -> Result<bool, SanitizeError> {
    match handling.tag_nesting.unwrap_or(TagNestingStrategy::ThrowError) {
        TagNestingStrategy::DiscardElement => {
            dom::detach(element);
            Ok(false)
        }
        TagNestingStrategy::ThrowError => Err(SanitizeError::nesting_exceeded(tag, limit)),
    }
}

/// The two-flag outcome of an `attribute`-level decision (spec §4.5 step
/// 2a): `global=false` means the whole element is gone and the attribute
/// loop must stop; `local=false` means only this attribute is skipped.
pub struct AttrOutcome {
    pub global: bool,
    pub local: bool,
}

/// `attribute`-level handler (native: `discardAttribute`, falls back to
/// `tag`).
pub fn handle_attribute(
    handling: &ErrorHandling,
    element: &Handle,
    tag: &str,
    attribute: &str,
) -> Result<AttrOutcome, SanitizeError> {
    match handling.attribute {
        Some(AttributeStrategy::DiscardAttribute) => {
            dom::remove_attribute(element, attribute);
            Ok(AttrOutcome {
                global: true,
                local: false,
            })
        }
        None => {
            handle_tag(
                handling,
                element,
                tag,
                TagFailureCause::UnresolvedAttribute { attribute },
            )?;
            Ok(AttrOutcome {
                global: false,
                local: false,
            })
        }
    }
}

/// `attributeValue`-level handler (native: `applyDefaultValue`, falls back
/// to `attribute`). Returns a single proceed flag: every call site for this
/// level only needs to know whether the element survived.
pub fn handle_attribute_value(
    handling: &ErrorHandling,
    element: &Handle,
    tag: &str,
    attribute: &str,
    key: Option<&str>,
    offending_value: &str,
    default_value: Option<&str>,
) -> Result<bool, SanitizeError> {
    match handling.attribute_value {
        Some(AttributeValueStrategy::ApplyDefaultValue) => {
            match default_value {
                Some(default) => dom::set_attribute(element, attribute, default),
                None => dom::remove_attribute(element, attribute),
            }
            Ok(true)
        }
        None => {
            let cause = if let Some(key) = key {
                TagFailureCause::RejectedAttributeValue {
                    attribute,
                    key: Some(key),
                    value: offending_value,
                }
            } else {
                TagFailureCause::RejectedAttributeValue {
                    attribute,
                    key: None,
                    value: offending_value,
                }
            };
            // Falling back past `attribute` (which itself may fall back to
            // `tag`) collapses to the same AttrOutcome machinery; we only
            // need the global flag here.
            match handling.attribute {
                Some(AttributeStrategy::DiscardAttribute) => {
                    dom::remove_attribute(element, attribute);
                    Ok(true)
                }
                None => {
                    handle_tag(handling, element, tag, cause)?;
                    Ok(false)
                }
            }
        }
    }
}

/// `valueTooLong`-level handler (native: `trimExcess`, falls back to
/// `attributeValue`). Spec §4.6 step 1 gives this level its own explicit
/// re-read-after-handling recipe, applied by the caller in
/// `attributes.rs`; this function only returns the proceed flag and
/// performs the in-place truncation for the native case.
pub fn handle_value_too_long(
    handling: &ErrorHandling,
    element: &Handle,
    tag: &str,
    attribute: &str,
    default_value: Option<&str>,
    value: &str,
    max_length: usize,
) -> Result<bool, SanitizeError> {
    match handling.value_too_long {
        Some(ValueTooLongStrategy::TrimExcess) => {
            let truncated = truncate_chars(value, max_length);
            dom::set_attribute(element, attribute, &truncated);
            Ok(true)
        }
        None => handle_attribute_value(handling, element, tag, attribute, None, value, default_value),
    }
}

/// Truncate `s` to at most `max_chars` Unicode scalar values, never
/// splitting a multi-byte character. The spec's "code units" are a
/// JavaScript (UTF-16) notion without a clean Rust analogue; counting
/// `char`s is the closest faithful equivalent for a `String`-based
/// implementation.
fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Outcome of escalating a collection-shaped violation (`collectionTooMany`,
/// `recordDuplicate`, `recordValue`, `setValue`) once it has no native
/// strategy of its own and falls back to `attributeValue`. Because
/// `attributeValue`'s own strategies act on the whole attribute value
/// rather than on an individual token/pair, once escalation reaches that
/// level there is nothing left for the collection-shaped caller to iterate
/// over: the attribute has either been fully replaced/cleared
/// (`AttributeResolved`) or the element is gone (`ElementGone`).
pub enum Escalated {
    AttributeResolved,
    ElementGone,
}

fn escalate(
    handling: &ErrorHandling,
    element: &Handle,
    tag: &str,
    attribute: &str,
    key: Option<&str>,
    current_value: &str,
    default_value: Option<&str>,
) -> Result<Escalated, SanitizeError> {
    if handle_attribute_value(handling, element, tag, attribute, key, current_value, default_value)? {
        Ok(Escalated::AttributeResolved)
    } else {
        Ok(Escalated::ElementGone)
    }
}

/// Outcome of a `collectionTooMany` decision.
pub enum CollectionResult<T> {
    Items(Vec<T>),
    AttributeResolved,
    ElementGone,
}

/// `collectionTooMany`-level handler (native: `dropExtra`, falls back to
/// `attributeValue`).
pub fn handle_collection_too_many<T>(
    handling: &ErrorHandling,
    element: &Handle,
    tag: &str,
    attribute: &str,
    default_value: Option<&str>,
    current_value: &str,
    items: Vec<T>,
    max_entries: usize,
) -> Result<CollectionResult<T>, SanitizeError> {
    match handling.collection_too_many {
        Some(CollectionTooManyStrategy::DropExtra) => {
            let mut items = items;
            items.truncate(max_entries);
            Ok(CollectionResult::Items(items))
        }
        None => match escalate(handling, element, tag, attribute, None, current_value, default_value)? {
            Escalated::AttributeResolved => Ok(CollectionResult::AttributeResolved),
            Escalated::ElementGone => Ok(CollectionResult::ElementGone),
        },
    }
}

/// Outcome of a `setValue` decision for a single token.
pub enum TokenResult {
    Drop,
    AttributeResolved,
    ElementGone,
}

/// `setValue`-level handler (native: `dropValue`, falls back to
/// `attributeValue`).
pub fn handle_set_value(
    handling: &ErrorHandling,
    element: &Handle,
    tag: &str,
    attribute: &str,
    default_value: Option<&str>,
    current_value: &str,
    token: &str,
) -> Result<TokenResult, SanitizeError> {
    match handling.set_value {
        Some(SetValueStrategy::DropValue) => {
            debug!("dropping set token {token:?} on {attribute:?}");
            Ok(TokenResult::Drop)
        }
        None => match escalate(handling, element, tag, attribute, None, current_value, default_value)? {
            Escalated::AttributeResolved => Ok(TokenResult::AttributeResolved),
            Escalated::ElementGone => Ok(TokenResult::ElementGone),
        },
    }
}

/// Outcome of a `recordValue` decision for a single pair.
pub enum PairResult {
    Drop,
    AttributeResolved,
    ElementGone,
}

/// `recordValue`-level handler (native: `dropPair`, falls back to
/// `attributeValue`).
pub fn handle_record_value(
    handling: &ErrorHandling,
    element: &Handle,
    tag: &str,
    attribute: &str,
    default_value: Option<&str>,
    current_value: &str,
    key: &str,
) -> Result<PairResult, SanitizeError> {
    match handling.record_value {
        Some(RecordValueStrategy::DropPair) => {
            debug!("dropping record pair with key {key:?} on {attribute:?}");
            Ok(PairResult::Drop)
        }
        None => {
            match escalate(handling, element, tag, attribute, Some(key), current_value, default_value)? {
                Escalated::AttributeResolved => Ok(PairResult::AttributeResolved),
                Escalated::ElementGone => Ok(PairResult::ElementGone),
            }
        }
    }
}

/// Outcome of a `recordDuplicate` decision.
pub enum DuplicateResult {
    Applied { output: Vec<Pair>, include_current: bool },
    AttributeResolved,
    ElementGone,
}

/// `recordDuplicate`-level handler (native: `dropDuplicates` /
/// `keepDuplicates` / `keepFirst` / `keepLast`, falls back to
/// `attributeValue`). See `DESIGN.md` for the `keepFirst` vs
/// `dropDuplicates` asymmetry this preserves verbatim.
#[allow(clippy::too_many_arguments)]
pub fn handle_record_duplicate(
    handling: &ErrorHandling,
    element: &Handle,
    tag: &str,
    attribute: &str,
    default_value: Option<&str>,
    current_value: &str,
    output: Vec<Pair>,
    key: &str,
) -> Result<DuplicateResult, SanitizeError> {
    match handling.record_duplicate {
        Some(RecordDuplicateStrategy::DropDuplicates) => {
            let mut output = output;
            output.retain(|p| p.key != key);
            Ok(DuplicateResult::Applied {
                output,
                include_current: false,
            })
        }
        Some(RecordDuplicateStrategy::KeepDuplicates) => Ok(DuplicateResult::Applied {
            output,
            include_current: true,
        }),
        Some(RecordDuplicateStrategy::KeepFirst) => Ok(DuplicateResult::Applied {
            output,
            include_current: false,
        }),
        Some(RecordDuplicateStrategy::KeepLast) => {
            let mut output = output;
            output.retain(|p| p.key != key);
            Ok(DuplicateResult::Applied {
                output,
                include_current: true,
            })
        }
        None => {
            match escalate(handling, element, tag, attribute, Some(key), current_value, default_value)? {
                Escalated::AttributeResolved => Ok(DuplicateResult::AttributeResolved),
                Escalated::ElementGone => Ok(DuplicateResult::ElementGone),
            }
        }
    }
}
