//! Filter-and-marshal: the shared body of every `list_*` tool.
//!
//! Records of any shape are filtered through a caller-supplied key function,
//! so unrelated API records never need a common trait. How the key is
//! compared to the query is a per-domain [`MatchPolicy`].

use mcp::{Field, InputSchema};
use serde::Serialize;

/// How a filter query is compared to a record key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Raw substring containment.
    CaseSensitive,
    /// Both sides lowercased before containment.
    CaseInsensitive,
}

/// A substring query. The empty query matches every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filter<'a> {
    query: &'a str,
    policy: MatchPolicy,
}

impl<'a> Filter<'a> {
    pub fn new(query: &'a str, policy: MatchPolicy) -> Self {
        Self { query, policy }
    }

    /// Match everything.
    pub fn all() -> Self {
        Self::new("", MatchPolicy::CaseSensitive)
    }

    pub fn matches(&self, key: &str) -> bool {
        if self.query.is_empty() {
            return true;
        }
        match self.policy {
            MatchPolicy::CaseSensitive => key.contains(self.query),
            MatchPolicy::CaseInsensitive => {
                key.to_lowercase().contains(&self.query.to_lowercase())
            }
        }
    }
}

/// Matching records, in their original order.
pub fn select<'t, T, K>(items: &'t [T], filter: &Filter<'_>, key_of: K) -> Vec<&'t T>
where
    K: Fn(&T) -> &str,
{
    items.iter().filter(|item| filter.matches(key_of(item))).collect()
}

/// The list envelope: `count` is always the length of `items`.
#[derive(Debug, Serialize)]
pub struct Listing<'t, T> {
    pub count: usize,
    pub items: Vec<&'t T>,
}

/// Filter `items` and serialize the survivors as a two-space indented
/// JSON array. Empty input is `[]`.
///
/// Fails only if a record cannot be represented as JSON.
pub fn filter_and_marshal<T, K>(
    items: &[T],
    filter: &Filter<'_>,
    key_of: K,
) -> Result<String, serde_json::Error>
where
    T: Serialize,
    K: Fn(&T) -> &str,
{
    marshal(&select(items, filter, key_of))
}

/// Like [`filter_and_marshal`], wrapped as `{"count": n, "items": [...]}`.
pub fn list_and_marshal<T, K>(
    items: &[T],
    filter: &Filter<'_>,
    key_of: K,
) -> Result<String, serde_json::Error>
where
    T: Serialize,
    K: Fn(&T) -> &str,
{
    let items = select(items, filter, key_of);
    marshal(&Listing {
        count: items.len(),
        items,
    })
}

/// Two-space indented JSON.
pub fn marshal<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Input schema of a list tool: a single optional `filter`.
pub(crate) fn filter_schema(key: &str) -> InputSchema {
    InputSchema::new().field(Field::string(
        "filter",
        format!("Only return records whose {key} contains this text"),
    ))
}
