//! The attribute sanitizer: `sanitize_attributes` and `sanitize_value`
//! (spec §4.5, §4.6). Dispatches on `AttrRule`'s `mode` and delegates every
//! violation to `errors.rs`'s fallback chain.

use ahash::AHashSet;
use markup5ever_rcdom::Handle;

use crate::dom;
use crate::errors::{
    self, CollectionResult, DuplicateResult, ErrorHandling, PairResult, TagFailureCause, TokenResult,
};
use crate::matcher::matches;
use crate::parse::{parse_record, parse_set};
use crate::policy::AttrRule;
use crate::SanitizeError;

/// Resolve, sanitize and (for required-but-absent attributes) inject
/// defaults for every attribute on `element` (spec §4.5). Returns `false`
/// if the element itself was removed or unwrapped mid-pass.
pub fn sanitize_attributes(
    element: &Handle,
    tag: &str,
    rules: &std::collections::HashMap<String, AttrRule>,
    handling: &ErrorHandling,
) -> Result<bool, SanitizeError> {
    // Step 1/2: iterate present attributes, in insertion order. Snapshot
    // names first since a handler (discardAttribute, applyDefaultValue) may
    // mutate the attribute list mid-iteration.
    for name in dom::attribute_names(element) {
        // An attribute set can be mutated mid-loop; re-check presence.
        if !dom::has_attribute(element, &name) {
            continue;
        }
        let rule = rules.get(&name).or_else(|| rules.get("*"));
        match rule {
            None => {
                let outcome = errors::handle_attribute(handling, element, tag, &name)?;
                if !outcome.global {
                    return Ok(false);
                }
                // local is always false in practice here (no native
                // strategy leaves the attribute in place), but honor it
                // generically: continue to the next attribute either way.
            }
            Some(rule) => {
                if !sanitize_value(element, tag, &name, rule, handling)? {
                    return Ok(false);
                }
            }
        }
    }

    // Step 5: required-attribute enforcement. `"*"` is never a required
    // obligation.
    for (name, rule) in rules {
        if name == "*" || !rule.required() {
            continue;
        }
        if dom::has_attribute(element, name) {
            continue;
        }
        let proceed = errors::handle_attribute_value(
            handling,
            element,
            tag,
            name,
            None,
            "",
            rule.default_value(),
        )?;
        if !proceed {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Sanitize a single attribute's value (spec §4.6). Returns `false` if the
/// element was removed as a result.
fn sanitize_value(
    element: &Handle,
    tag: &str,
    name: &str,
    rule: &AttrRule,
    handling: &ErrorHandling,
) -> Result<bool, SanitizeError> {
    let value = dom::get_attribute(element, name).unwrap_or_default();

    if let Some(max_length) = rule.max_length() {
        if value.chars().count() > max_length {
            let proceed = errors::handle_value_too_long(
                handling,
                element,
                tag,
                name,
                rule.default_value(),
                &value,
                max_length,
            )?;
            if !proceed {
                return Ok(false);
            }
            // Re-read: the handler may have truncated, defaulted, or
            // deleted the attribute.
            match dom::get_attribute(element, name) {
                None => return Ok(true),
                Some(v) if v.is_empty() => return Ok(true),
                Some(_) => {}
            }
        }
    }

    let value = dom::get_attribute(element, name).unwrap_or_default();

    match rule {
        AttrRule::Simple { value: matcher, default_value, .. } => {
            if matches(matcher, &value) {
                Ok(true)
            } else {
                errors::handle_attribute_value(handling, element, tag, name, None, &value, default_value.as_deref())
            }
        }
        AttrRule::Set { delimiter, max_entries, values, default_value, .. } => sanitize_set(
            element,
            tag,
            name,
            &value,
            delimiter,
            *max_entries,
            values,
            default_value.as_deref(),
            handling,
        ),
        AttrRule::Record {
            entry_separator,
            key_value_separator,
            max_entries,
            values,
            default_value,
            ..
        } => sanitize_record(
            element,
            tag,
            name,
            &value,
            entry_separator,
            key_value_separator,
            *max_entries,
            values,
            default_value.as_deref(),
            handling,
        ),
    }
}

#[allow(clippy::too_many_arguments)]
fn sanitize_set(
    element: &Handle,
    tag: &str,
    name: &str,
    value: &str,
    delimiter: &str,
    max_entries: Option<usize>,
    values_matcher: &crate::matcher::Matcher,
    default_value: Option<&str>,
    handling: &ErrorHandling,
) -> Result<bool, SanitizeError> {
    let mut tokens = parse_set(value, delimiter);

    if let Some(max_entries) = max_entries {
        if tokens.len() > max_entries {
            match errors::handle_collection_too_many(
                handling,
                element,
                tag,
                name,
                default_value,
                value,
                tokens,
                max_entries,
            )? {
                CollectionResult::Items(items) => tokens = items,
                CollectionResult::AttributeResolved => return Ok(true),
                CollectionResult::ElementGone => return Ok(false),
            }
        }
    }

    let mut output = Vec::with_capacity(tokens.len());
    for token in tokens {
        if matches(values_matcher, &token) {
            output.push(token);
            continue;
        }
        match errors::handle_set_value(handling, element, tag, name, default_value, value, &token)? {
            TokenResult::Drop => {}
            TokenResult::AttributeResolved => return Ok(true),
            TokenResult::ElementGone => return Ok(false),
        }
    }

    dom::set_attribute(element, name, &output.join(delimiter));
    Ok(true)
}

#[allow(clippy::too_many_arguments)]
fn sanitize_record(
    element: &Handle,
    tag: &str,
    name: &str,
    value: &str,
    entry_sep: &str,
    pair_sep: &str,
    max_entries: Option<usize>,
    values_by_key: &std::collections::HashMap<String, crate::matcher::Matcher>,
    default_value: Option<&str>,
    handling: &ErrorHandling,
) -> Result<bool, SanitizeError> {
    let mut pairs = parse_record(value, entry_sep, pair_sep);

    if let Some(max_entries) = max_entries {
        if pairs.len() > max_entries {
            match errors::handle_collection_too_many(
                handling,
                element,
                tag,
                name,
                default_value,
                value,
                pairs,
                max_entries,
            )? {
                CollectionResult::Items(items) => pairs = items,
                CollectionResult::AttributeResolved => return Ok(true),
                CollectionResult::ElementGone => return Ok(false),
            }
        }
    }

    let mut seen: AHashSet<String> = AHashSet::default();
    let mut output = Vec::with_capacity(pairs.len());

    for pair in pairs {
        if seen.contains(&pair.key) {
            match errors::handle_record_duplicate(
                handling,
                element,
                tag,
                name,
                default_value,
                value,
                output,
                &pair.key,
            )? {
                DuplicateResult::Applied { output: new_output, include_current } => {
                    output = new_output;
                    if !include_current {
                        continue;
                    }
                }
                DuplicateResult::AttributeResolved => return Ok(true),
                DuplicateResult::ElementGone => return Ok(false),
            }
        }

        let pair_rule = values_by_key.get(&pair.key);
        let admitted = pair_rule.is_some_and(|m| matches(m, &pair.value));
        if !admitted {
            match errors::handle_record_value(handling, element, tag, name, default_value, value, &pair.key)? {
                PairResult::Drop => continue,
                PairResult::AttributeResolved => return Ok(true),
                PairResult::ElementGone => return Ok(false),
            }
        }

        seen.insert(pair.key.clone());
        output.push(pair);
    }

    let rendered = output
        .into_iter()
        .map(|p| format!("{}{}{}", p.key, pair_sep, p.value))
        .collect::<Vec<_>>()
        .join(entry_sep);
    dom::set_attribute(element, name, &rendered);
    Ok(true)
}

/// Used by `walker.rs` when a tag has no rule for itself at all (a distinct
/// concern from per-attribute resolution, kept here since both share the
/// same `TagFailureCause` plumbing).
pub fn unknown_tag(handling: &ErrorHandling, element: &Handle, tag: &str) -> Result<bool, SanitizeError> {
    errors::handle_tag(handling, element, tag, TagFailureCause::UnknownTag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::Matcher;
    use markup5ever::{namespace_url, ns, QualName};
    use markup5ever_rcdom::{Node, NodeData};
    use std::cell::RefCell;
    use std::collections::HashMap;

    fn elem(name: &str) -> Handle {
        Node::new(NodeData::Element {
            name: QualName::new(None, ns!(html), name.into()),
            attrs: RefCell::new(Vec::new()),
            template_contents: RefCell::new(None),
            mathml_annotation_xml_integration_point: false,
        })
    }

    #[test]
    fn simple_rule_admits_matching_value() {
        let e = elem("div");
        dom::set_attribute(&e, "class", "ok");
        let mut rules = HashMap::new();
        rules.insert(
            "class".to_owned(),
            AttrRule::Simple {
                value: Matcher::Any,
                default_value: None,
                max_length: None,
                required: false,
            },
        );
        let handling = ErrorHandling::default();
        assert!(sanitize_attributes(&e, "div", &rules, &handling).unwrap());
        assert_eq!(dom::get_attribute(&e, "class").as_deref(), Some("ok"));
    }

    #[test]
    fn unresolved_attribute_escalates_to_tag_throw() {
        let e = elem("div");
        dom::set_attribute(&e, "onclick", "x");
        let rules = HashMap::new();
        let handling = ErrorHandling::default();
        assert!(sanitize_attributes(&e, "div", &rules, &handling).is_err());
    }

    #[test]
    fn wildcard_fallback_admits_unlisted_attribute() {
        let e = elem("div");
        dom::set_attribute(&e, "data-foo", "bar");
        let mut rules = HashMap::new();
        rules.insert(
            "*".to_owned(),
            AttrRule::Simple {
                value: Matcher::Any,
                default_value: None,
                max_length: None,
                required: false,
            },
        );
        let handling = ErrorHandling::default();
        assert!(sanitize_attributes(&e, "div", &rules, &handling).unwrap());
        assert_eq!(dom::get_attribute(&e, "data-foo").as_deref(), Some("bar"));
    }

    #[test]
    fn required_attribute_absent_injects_default() {
        let e = elem("div");
        let mut rules = HashMap::new();
        rules.insert(
            "id".to_owned(),
            AttrRule::Simple {
                value: Matcher::Any,
                default_value: Some("default-id".into()),
                max_length: None,
                required: true,
            },
        );
        let handling = crate::errors::ErrorHandling {
            attribute_value: Some(crate::errors::AttributeValueStrategy::ApplyDefaultValue),
            ..Default::default()
        };
        assert!(sanitize_attributes(&e, "div", &rules, &handling).unwrap());
        assert_eq!(dom::get_attribute(&e, "id").as_deref(), Some("default-id"));
    }

    #[test]
    fn set_mode_filters_tokens_and_rejoins() {
        let e = elem("a");
        dom::set_attribute(&e, "rel", "noopener evil nofollow");
        let mut rules = HashMap::new();
        rules.insert(
            "rel".to_owned(),
            AttrRule::Set {
                delimiter: " ".into(),
                max_entries: None,
                values: Matcher::list(["noopener", "nofollow"]),
                default_value: None,
                max_length: None,
                required: false,
            },
        );
        let handling = crate::errors::ErrorHandling {
            set_value: Some(crate::errors::SetValueStrategy::DropValue),
            ..Default::default()
        };
        assert!(sanitize_attributes(&e, "a", &rules, &handling).unwrap());
        assert_eq!(dom::get_attribute(&e, "rel").as_deref(), Some("noopener nofollow"));
    }

    #[test]
    fn record_mode_filters_and_rejoins() {
        let e = elem("div");
        dom::set_attribute(&e, "style", "color:red;behavior:url(x)");
        let mut values = HashMap::new();
        values.insert("color".to_owned(), Matcher::Any);
        let mut rules = HashMap::new();
        rules.insert(
            "style".to_owned(),
            AttrRule::Record {
                entry_separator: ";".into(),
                key_value_separator: ":".into(),
                max_entries: None,
                values,
                default_value: None,
                max_length: None,
                required: false,
            },
        );
        let handling = crate::errors::ErrorHandling {
            record_value: Some(crate::errors::RecordValueStrategy::DropPair),
            ..Default::default()
        };
        assert!(sanitize_attributes(&e, "div", &rules, &handling).unwrap());
        assert_eq!(dom::get_attribute(&e, "style").as_deref(), Some("color:red"));
    }

    #[test]
    fn value_too_long_trims_then_reconsiders() {
        let e = elem("div");
        dom::set_attribute(&e, "title", "abcdefgh");
        let mut rules = HashMap::new();
        rules.insert(
            "title".to_owned(),
            AttrRule::Simple {
                value: Matcher::Any,
                default_value: None,
                max_length: Some(4),
                required: false,
            },
        );
        let handling = crate::errors::ErrorHandling {
            value_too_long: Some(crate::errors::ValueTooLongStrategy::TrimExcess),
            ..Default::default()
        };
        assert!(sanitize_attributes(&e, "div", &rules, &handling).unwrap());
        assert_eq!(dom::get_attribute(&e, "title").as_deref(), Some("abcd"));
    }
}
