//! Query parameters, pagination windows and the result envelope

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field projection control key (`select=name,description`)
pub const SELECT_KEY: &str = "select";
/// Sort control key (`sort=-averageCost,name`)
pub const SORT_KEY: &str = "sort";
/// Page number control key (starts at 1)
pub const PAGE_KEY: &str = "page";
/// Page size control key
pub const LIMIT_KEY: &str = "limit";

/// Keys that steer the query instead of filtering it
pub const CONTROL_KEYS: [&str; 4] = [SELECT_KEY, SORT_KEY, PAGE_KEY, LIMIT_KEY];

/// Default page when `page` is missing or not a positive integer
pub const DEFAULT_PAGE: u64 = 1;

/// A single query-string value
///
/// Bracketed keys nest (`averageCost[gt]=5000` becomes
/// `averageCost -> { gt -> "5000" }`) and repeated keys collect into a list.
/// A key sent both plain and bracketed keeps the shape it first appeared in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Single(String),
    Many(Vec<String>),
    Nested(IndexMap<String, ParamValue>),
}

impl ParamValue {
    /// The last scalar value, if this is not a nested mapping
    ///
    /// Repeated control parameters resolve to their last occurrence.
    pub fn last(&self) -> Option<&str> {
        match self {
            ParamValue::Single(s) => Some(s),
            ParamValue::Many(values) => values.last().map(String::as_str),
            ParamValue::Nested(_) => None,
        }
    }

    fn append(&mut self, value: String) {
        match self {
            ParamValue::Single(existing) => {
                let first = std::mem::take(existing);
                *self = ParamValue::Many(vec![first, value]);
            }
            ParamValue::Many(values) => values.push(value),
            ParamValue::Nested(_) => {}
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Single(value)
    }
}

/// Raw query parameters of a list request
///
/// Built from decoded `(key, value)` pairs, in the order they appeared.
///
/// # Example
/// ```rust,ignore
/// // GET /bootcamps?averageCost[lte]=10000&careers=Business&select=name&page=2
/// pub async fn list(Query(pairs): Query<Vec<(String, String)>>) {
///     let params = QueryParameters::from_pairs(pairs);
///     assert_eq!(params.control("page"), Some("2"));
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParameters {
    entries: IndexMap<String, ParamValue>,
}

impl QueryParameters {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse decoded query-string pairs, honoring bracket nesting
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::new();
        for (key, value) in pairs {
            params.push(key.as_ref(), value.into());
        }
        params
    }

    /// Add one raw `key=value` pair
    pub fn push(&mut self, raw_key: &str, value: String) {
        let path = split_key(raw_key);
        insert_path(&mut self.entries, &path, value);
    }

    /// Insert an already-structured value, replacing any previous one
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value of a control key, ignoring blank values
    pub fn control(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .and_then(ParamValue::last)
            .filter(|value| !value.trim().is_empty())
    }

    /// Copy of the parameters without the control keys
    ///
    /// The receiver is left untouched so callers can keep using it.
    pub fn filter_only(&self) -> IndexMap<String, ParamValue> {
        self.entries
            .iter()
            .filter(|(key, _)| !CONTROL_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// Split `a[b][c]` into `["a", "b", "c"]`
///
/// Keys with unbalanced brackets are kept whole.
fn split_key(raw: &str) -> Vec<&str> {
    let Some(open) = raw.find('[') else {
        return vec![raw];
    };
    if open == 0 {
        return vec![raw];
    }

    let mut segments = vec![&raw[..open]];
    let mut rest = &raw[open..];
    while let Some(inner) = rest.strip_prefix('[') {
        let Some(close) = inner.find(']') else {
            return vec![raw];
        };
        segments.push(&inner[..close]);
        rest = &inner[close + 1..];
    }

    if rest.is_empty() { segments } else { vec![raw] }
}

fn insert_path(map: &mut IndexMap<String, ParamValue>, path: &[&str], value: String) {
    let Some((head, tail)) = path.split_first() else {
        return;
    };

    // `tags[]=a` forces a list even for a single occurrence
    let list_suffix = tail.len() == 1 && tail[0].is_empty();

    if tail.is_empty() || list_suffix {
        match map.get_mut(*head) {
            Some(ParamValue::Nested(_)) => {
                tracing::debug!(key = *head, "Dropping plain value of a key already bracketed");
            }
            Some(existing) => existing.append(value),
            None => {
                let leaf = if list_suffix {
                    ParamValue::Many(vec![value])
                } else {
                    ParamValue::Single(value)
                };
                map.insert(head.to_string(), leaf);
            }
        }
        return;
    }

    let entry = map
        .entry(head.to_string())
        .or_insert_with(|| ParamValue::Nested(IndexMap::new()));

    match entry {
        ParamValue::Nested(inner) => insert_path(inner, tail, value),
        _ => tracing::debug!(key = *head, "Dropping bracketed value of a key already set plain"),
    }
}

/// The `(page, limit)` pair of a list request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationWindow {
    pub page: u64,
    pub limit: u64,
}

impl PaginationWindow {
    /// Resolve `page` and `limit`, falling back to defaults for anything
    /// that is not a positive integer
    pub fn resolve(page: Option<&str>, limit: Option<&str>, default_limit: u64) -> Self {
        Self {
            page: page.and_then(parse_positive).unwrap_or(DEFAULT_PAGE),
            limit: limit
                .and_then(parse_positive)
                .unwrap_or_else(|| default_limit.max(1)),
        }
    }

    /// Number of matching records skipped before this page
    pub fn start_index(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    /// Index one past the last record of this page
    pub fn end_index(&self) -> u64 {
        self.page.saturating_mul(self.limit)
    }

    /// Links to the neighbouring pages, given the total match count
    pub fn pagination(&self, total: u64) -> Pagination {
        let next = (self.end_index() < total).then(|| PageLink {
            page: self.page.saturating_add(1),
            limit: self.limit,
        });
        let previous = (self.start_index() > 0).then(|| PageLink {
            page: self.page - 1,
            limit: self.limit,
        });

        Pagination { next, previous }
    }
}

/// Parse the leading integer of a string, the way `parseInt` reads it
///
/// Returns `None` for zero, negatives, overflow and non-numeric input.
fn parse_positive(raw: &str) -> Option<u64> {
    let trimmed = raw.trim_start();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());

    unsigned[..digits_end]
        .parse::<u64>()
        .ok()
        .filter(|value| *value > 0)
}

/// Link to a neighbouring page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLink {
    pub page: u64,
    pub limit: u64,
}

/// Pagination links of a result envelope
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<PageLink>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<PageLink>,
}

/// Uniform response of every list endpoint
///
/// `count` is the size of this page, not the number of matching records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope<T = Value> {
    pub success: bool,
    pub count: usize,
    pub pagination: Pagination,
    pub data: Vec<T>,
}

impl<T> ResultEnvelope<T> {
    pub fn new(data: Vec<T>, pagination: Pagination) -> Self {
        Self {
            success: true,
            count: data.len(),
            pagination,
            data,
        }
    }
}
