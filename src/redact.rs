//! Recursive tree redaction with a dotted path mini-language
//!
//! Patterns select values inside a nested `serde_json::Value` tree:
//! - `user.email|token` - literal keys, `|` is per-level alternation
//! - `_` - skip exactly one level (consecutive `_` collapse into a fixed depth)
//! - `*` - search every depth, the current mapping included
//! - `+` - search every depth, the current mapping excluded
//!
//! Matched values are overwritten with [`SENTINEL`] when truthy; falsy
//! values (`null`, `false`, `0`, `""`, `[]`, `{}`) are left untouched.
//! Malformed patterns and structural mismatches degrade to no-ops at the
//! offending branch - redaction never fails.

use serde_json::Value;
use tracing::debug;

/// Replacement marker written over matched values
pub const SENTINEL: &str = "%";

/// A parsed pattern segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal key alternation: `a|b|c`
    Keys(Vec<String>),
    /// `_` - descend exactly one level
    SkipOne,
    /// `*` - match at any depth, current mapping included
    SkipAny,
    /// `+` - match at any depth, current mapping excluded
    SkipDeep,
}

/// Parse a dotted pattern string into segments
///
/// Examples:
/// - `"user.email|token"` → `[Keys(["user"]), Keys(["email", "token"])]`
/// - `"_._.name"` → `[SkipOne, SkipOne, Keys(["name"])]`
pub fn parse_pattern(pattern: &str) -> Vec<Segment> {
    pattern
        .split('.')
        .map(|part| match part {
            "_" => Segment::SkipOne,
            "*" => Segment::SkipAny,
            "+" => Segment::SkipDeep,
            _ => Segment::Keys(part.split('|').map(str::to_string).collect()),
        })
        .collect()
}

/// Redact every value reachable via any of `patterns`, returning a new tree.
///
/// The input is never mutated; all matching and writing happens on a copy
/// made up front. Patterns apply sequentially against the running copy, so
/// later patterns see earlier redactions.
pub fn redact<S: AsRef<str>>(tree: &Value, patterns: &[S]) -> Value {
    let mut copy = tree.clone();
    redact_in_place(&mut copy, patterns);
    copy
}

/// Redact in place on a caller-owned tree
pub fn redact_in_place<S: AsRef<str>>(tree: &mut Value, patterns: &[S]) {
    for pattern in patterns {
        let pattern = pattern.as_ref();
        debug!(pattern, "applying redaction pattern");
        apply(&parse_pattern(pattern), tree);
    }
}

/// JSON truthiness: non-null, non-false, non-zero, non-empty
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn has_any_key(map: &serde_json::Map<String, Value>, keys: &[String]) -> bool {
    keys.iter().any(|key| map.contains_key(key))
}

fn apply(segments: &[Segment], node: &mut Value) {
    if segments.is_empty() || !is_truthy(node) {
        return;
    }
    if segments.iter().all(|s| matches!(s, Segment::SkipOne)) {
        return;
    }

    if let [Segment::Keys(keys)] = segments {
        // terminal segment: overwrite truthy values under the named keys
        if let Value::Object(map) = node {
            for key in keys {
                if map.get(key).is_some_and(is_truthy) {
                    map.insert(key.clone(), Value::String(SENTINEL.to_string()));
                }
            }
        }
        return;
    }

    match &segments[0] {
        Segment::Keys(keys) => {
            let Value::Object(map) = node else { return };
            for key in keys {
                if let Some(child) = map.get_mut(key) {
                    if let Value::Array(items) = child {
                        // sequence values expand element-wise
                        for item in items.iter_mut() {
                            apply(&segments[1..], item);
                        }
                    } else {
                        apply(&segments[1..], child);
                    }
                }
            }
        }
        Segment::SkipOne => {
            let mut skip = 1;
            while matches!(segments.get(skip), Some(Segment::SkipOne)) {
                skip += 1;
            }
            let rest = &segments[skip..];
            let Some(Segment::Keys(keys)) = rest.first() else {
                return;
            };
            descend_bounded(node, skip, keys, rest);
        }
        Segment::SkipAny => {
            let rest = &segments[1..];
            let Some(Segment::Keys(keys)) = rest.first() else {
                return;
            };
            search_subtree(node, keys, rest, true);
        }
        Segment::SkipDeep => {
            let rest = &segments[1..];
            let Some(Segment::Keys(keys)) = rest.first() else {
                return;
            };
            search_subtree(node, keys, rest, false);
        }
    }
}

/// Bounded key search: descend exactly `depth` levels through mapping
/// values and mappings directly inside sequence values, then continue
/// matching `rest` on every mapping there holding any of `keys`.
fn descend_bounded(node: &mut Value, depth: usize, keys: &[String], rest: &[Segment]) {
    if depth == 0 {
        if matches!(node, Value::Object(map) if has_any_key(map, keys)) {
            apply(rest, node);
        }
        return;
    }

    let Value::Object(map) = node else { return };
    for child in map.values_mut() {
        match child {
            Value::Object(_) => descend_bounded(child, depth - 1, keys, rest),
            Value::Array(items) => {
                for item in items.iter_mut().filter(|item| item.is_object()) {
                    descend_bounded(item, depth - 1, keys, rest);
                }
            }
            _ => {}
        }
    }
}

/// Unbounded key search: visit every mapping in the subtree and continue
/// matching `rest` on each one holding any of `keys`. The starting mapping
/// itself participates only when `include_self` is set (`*` vs `+`).
fn search_subtree(node: &mut Value, keys: &[String], rest: &[Segment], include_self: bool) {
    if include_self && matches!(node, Value::Object(map) if has_any_key(map, keys)) {
        apply(rest, node);
    }

    let Value::Object(map) = node else { return };
    for child in map.values_mut() {
        match child {
            Value::Object(_) => search_subtree(child, keys, rest, true),
            Value::Array(items) => {
                for item in items.iter_mut().filter(|item| item.is_object()) {
                    search_subtree(item, keys, rest, true);
                }
            }
            _ => {}
        }
    }
}
