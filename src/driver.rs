//! Top-level driver (spec §4.8): parses the input fragment, enforces
//! `topLevelLimits.children` on the root's direct children, walks each
//! surviving root child, then serializes back to a string.
//!
//! Grounded on the teacher's `common.rs::Rules::parse` top-level
//! orchestration (parse once, iterate, serialize), generalized from
//! scraping rules to policy-driven sanitization. The fragment-parsing
//! dance (the parsed tree hangs off a synthetic context element, not off
//! `dom.document` directly) follows the same pattern
//! `servo-html5ever/html5ever/tests/tree_builder.rs` uses to serialize
//! fragment test cases.

use std::io::Cursor;

use html5ever::driver::ParseOpts;
use html5ever::serialize::{serialize, SerializeOpts};
use html5ever::tendril::TendrilSink;
use html5ever::{namespace_url, ns, parse_fragment, QualName};
use markup5ever_rcdom::{RcDom, SerializableHandle};

use crate::dom;
use crate::errors;
use crate::policy::Policy;
use crate::walker::{walk_node, WalkState};
use crate::SanitizeError;

/// Parse `html` as a document fragment, apply `policy`, and serialize the
/// result. Empty input returns empty output without invoking the parser
/// (spec §4.8, §6).
pub fn sanitize(html: &str, policy: &Policy) -> Result<String, SanitizeError> {
    if html.is_empty() {
        return Ok(String::new());
    }

    let context_name = QualName::new(None, ns!(html), "html".into());
    let dom: RcDom = parse_fragment(RcDom::default(), ParseOpts::default(), context_name, Vec::new())
        .from_utf8()
        .read_from(&mut Cursor::new(html.as_bytes()))
        .expect("parsing into an in-memory buffer is infallible");

    // The parsed content hangs off a synthetic `<html>` context element,
    // which is itself `dom.document`'s only child; the fragment's actual
    // roots are that wrapper's children.
    let wrapper = dom.document.children.borrow()[0].clone();

    if let Some(limit) = policy.top_level_limits.as_ref().and_then(|l| l.children) {
        let count = dom::children_len(&wrapper);
        if count as u32 > limit {
            let excess = count - limit as usize;
            let proceed =
                errors::handle_tag_children(&policy.error_handling, &wrapper, "#root", limit, excess)?;
            if !proceed {
                return Ok(String::new());
            }
        }
    }

    for child in dom::children_snapshot(&wrapper) {
        if dom::children_snapshot(&wrapper).iter().any(|c| std::rc::Rc::ptr_eq(c, &child)) {
            walk_node(&child, policy, &WalkState::default())?;
        }
    }

    let mut output = Vec::new();
    for child in wrapper.children.borrow().iter() {
        let serializable: SerializableHandle = child.clone().into();
        serialize(&mut output, &serializable, SerializeOpts::default())
            .expect("serializing into an in-memory buffer is infallible");
    }

    Ok(String::from_utf8(output).expect("html5ever serializes valid UTF-8"))
}
