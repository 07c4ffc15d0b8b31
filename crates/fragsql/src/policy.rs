//! What to do with a fragment whose parameter is absent.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Predicate that replaces `x in (:key)` when `key` is empty.
pub const ALWAYS_FALSE: &str = " 1 = 0 ";

/// Predicate that replaces `x not in (:key)` when `key` is empty.
pub const ALWAYS_TRUE: &str = " 1 = 1 ";

/// Inclusion policy for fragments bound to an absent parameter
/// (`NULL` or an empty collection).
///
/// Present parameters are always appended with their fragment; the policy only
/// decides the absent case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsentPolicy {
    /// Drop the fragment; no text is appended and nothing is bound.
    ///
    /// An absent filter is treated as "not constraining".
    #[default]
    Omit,
    /// Keep the fragment but compare against the empty set:
    /// `x in ()` is false and `x not in ()` is true for every `x`.
    ///
    /// The fragment must have the shape `<column> [not] in (:key)`.
    UnionCompare,
}

/// Rewrite every `<identifier> [not] in (:key)` in `fragment` into
/// [`ALWAYS_FALSE`] (for `in`) or [`ALWAYS_TRUE`] (for `not in`).
///
/// Only the `not`/`in` keywords match case-insensitively; the key is matched
/// exactly, as placeholders are case-sensitive. The parentheses around the
/// placeholder are optional. The identifier may be dotted or double-quoted;
/// `schema:col`-style references are not matched. Text around the predicate,
/// including a leading `and`/`or`, is left in place. Returns the fragment
/// unchanged when nothing matches.
pub fn rewrite_empty_membership<'a>(fragment: &'a str, key: &str) -> Cow<'a, str> {
    let pattern = format!(
        r#"(?:^|\s)[\w."]+\s+((?i:not)\s+)?(?i:in)\s*(?:\(\s*:{key}\s*\)|:{key}\b)"#,
        key = regex::escape(key)
    );
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(err) => {
            tracing::warn!(
                target: "fragsql.assemble",
                key,
                error = %err,
                "could not build membership pattern"
            );
            return Cow::Borrowed(fragment);
        }
    };

    re.replace_all(fragment, |caps: &Captures<'_>| {
        if caps.get(1).is_some() {
            ALWAYS_TRUE
        } else {
            ALWAYS_FALSE
        }
    })
}
