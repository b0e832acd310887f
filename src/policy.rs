//! The policy document: `Policy`, `TagRule`, `AttrRule`, `Limits` (spec §3,
//! §6). Wire format is JSON, `camelCase`, with `deny_unknown_fields` on the
//! two container types so a typo in a hand-written policy file fails fast
//! instead of silently doing nothing — same convention the teacher used for
//! `BookDef` in `def.rs`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::errors::ErrorHandling;
use crate::matcher::Matcher;

/// Non-negative child-count / nesting-depth limits, shared by
/// `topLevelLimits` and `TagRule.limits`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Limits {
    pub children: Option<u32>,
    pub nesting: Option<u32>,
}

/// The top-level sanitization policy (spec §3, §6).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct Policy {
    pub preserve_comments: bool,
    pub tags: HashMap<String, TagRule>,
    pub top_level_limits: Option<Limits>,
    pub error_handling: ErrorHandling,
}

/// Per-tag rule: which attributes are admitted and structural limits for
/// elements of this tag (spec §3). The `"*"` key in `attributes` is an
/// admission fallback only, never a required-attribute obligation.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct TagRule {
    pub attributes: HashMap<String, AttrRule>,
    pub limits: Option<Limits>,
}

/// An attribute rule, tagged by `mode` (spec §3). Each variant shares
/// `defaultValue`, `maxLength`, and `required`, plus shape-specific fields.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum AttrRule {
    Simple {
        value: Matcher,
        #[serde(default)]
        default_value: Option<String>,
        #[serde(default)]
        max_length: Option<usize>,
        #[serde(default)]
        required: bool,
    },
    Set {
        delimiter: String,
        #[serde(default)]
        max_entries: Option<usize>,
        values: Matcher,
        #[serde(default)]
        default_value: Option<String>,
        #[serde(default)]
        max_length: Option<usize>,
        #[serde(default)]
        required: bool,
    },
    Record {
        entry_separator: String,
        key_value_separator: String,
        #[serde(default)]
        max_entries: Option<usize>,
        values: HashMap<String, Matcher>,
        #[serde(default)]
        default_value: Option<String>,
        #[serde(default)]
        max_length: Option<usize>,
        #[serde(default)]
        required: bool,
    },
}

impl AttrRule {
    pub fn default_value(&self) -> Option<&str> {
        match self {
            AttrRule::Simple { default_value, .. }
            | AttrRule::Set { default_value, .. }
            | AttrRule::Record { default_value, .. } => default_value.as_deref(),
        }
    }

    pub fn max_length(&self) -> Option<usize> {
        match self {
            AttrRule::Simple { max_length, .. }
            | AttrRule::Set { max_length, .. }
            | AttrRule::Record { max_length, .. } => *max_length,
        }
    }

    pub fn required(&self) -> bool {
        match self {
            AttrRule::Simple { required, .. }
            | AttrRule::Set { required, .. }
            | AttrRule::Record { required, .. } => *required,
        }
    }
}
