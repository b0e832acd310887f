//! Value parsers: splitting a raw attribute string into a set or a record
//! (spec §4.2). Grounded on the trim/split/filter shape of the teacher's
//! own token handling in `def/sed.rs`, generalized to the two attribute
//! value shapes this crate needs.

/// Split `input` on `delimiter` into a de-duplicated, order-preserving
/// list of trimmed, non-empty tokens.
pub fn parse_set(input: &str, delimiter: &str) -> Vec<String> {
    let input = input.trim();
    if input.is_empty() {
        return Vec::new();
    }

    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for token in input.split(delimiter) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if seen.insert(token.to_owned()) {
            out.push(token.to_owned());
        }
    }
    out
}

/// A single parsed key/value pair, preserving source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub key: String,
    pub value: String,
}

/// Split `input` into entries on `entry_sep`, then each entry into a
/// key/value pair on `pair_sep`. A token only becomes a `Pair` if it splits
/// into exactly two non-empty (after trim) parts; malformed tokens are
/// silently dropped. Duplicates are *not* removed here — that is a later
/// policy decision (spec §4.2, §4.4 `recordDuplicate`).
pub fn parse_record(input: &str, entry_sep: &str, pair_sep: &str) -> Vec<Pair> {
    let input = input.trim();
    if input.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::new();
    for entry in input.split(entry_sep) {
        let mut parts = entry.splitn(2, pair_sep);
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() || value.is_empty() {
            continue;
        }
        out.push(Pair {
            key: key.to_owned(),
            value: value.to_owned(),
        });
    }
    out
}
