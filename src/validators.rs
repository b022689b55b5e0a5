//! Programmatic validators
//!
//! Currently a single URL/host validator: matches a string against
//! `^(scheme://)?(\w+\.)+$` for a caller-supplied scheme set. Compiled
//! patterns are cached per scheme set.

use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;

/// Compiled patterns keyed by the joined scheme alternation
static PATTERN_CACHE: Lazy<DashMap<String, Arc<Regex>>> = Lazy::new(DashMap::new);

fn host_pattern(schemes: &[&str]) -> Arc<Regex> {
    let joined = schemes
        .iter()
        .map(|scheme| regex::escape(scheme))
        .collect::<Vec<_>>()
        .join("|");

    if let Some(cached) = PATTERN_CACHE.get(&joined) {
        return Arc::clone(&cached);
    }

    let pattern = format!(r"^(?:(?:{joined})://)?(?:\w+\.)+$");
    let compiled = Arc::new(Regex::new(&pattern).unwrap());
    PATTERN_CACHE.insert(joined, Arc::clone(&compiled));
    compiled
}

/// Validate `url` as `(scheme://)?dotted.host`, with any of `schemes`
/// accepted as the optional prefix.
///
/// A trailing `.` is appended before matching and stripped from the match.
/// Returns the `(host, matched)` pair, or `None` when the string does not
/// match.
pub fn url_validator(url: &str, schemes: &[&str]) -> Option<(String, String)> {
    let pattern = host_pattern(schemes);
    let dotted = format!("{url}.");

    let matched = pattern.find(&dotted)?;
    let full = matched.as_str();
    Some((url.to_string(), full[..full.len() - 1].to_string()))
}
