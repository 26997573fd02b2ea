//! Filter expressions built from query-string predicates
//!
//! A request such as `?averageCost[gt]=5000&housing=true` arrives as a nested
//! parameter mapping. [`FilterExpression::from_params`] walks that mapping and
//! replaces every operator word used as a nested key (`gt`, `gte`, `lt`, `lte`,
//! `in`) with a typed [`ComparisonOperator`]. Everything else passes through
//! untouched, so a field called `lighting` or a value equal to `in` is never
//! rewritten.

use crate::core::query::ParamValue;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fmt;

/// Comparison operators understood by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl ComparisonOperator {
    pub const ALL: [ComparisonOperator; 5] = [
        ComparisonOperator::Gt,
        ComparisonOperator::Gte,
        ComparisonOperator::Lt,
        ComparisonOperator::Lte,
        ComparisonOperator::In,
    ];

    /// Match an operator word exactly (case-sensitive)
    pub fn from_word(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.word() == word)
    }

    /// The word used in query strings (`averageCost[gte]=...`)
    pub fn word(&self) -> &'static str {
        match self {
            ComparisonOperator::Gt => "gt",
            ComparisonOperator::Gte => "gte",
            ComparisonOperator::Lt => "lt",
            ComparisonOperator::Lte => "lte",
            ComparisonOperator::In => "in",
        }
    }

    /// The store-native operator tag
    pub fn store_tag(&self) -> &'static str {
        match self {
            ComparisonOperator::Gt => "$gt",
            ComparisonOperator::Gte => "$gte",
            ComparisonOperator::Lt => "$lt",
            ComparisonOperator::Lte => "$lte",
            ComparisonOperator::In => "$in",
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.store_tag())
    }
}

/// Key inside a nested filter document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterKey {
    /// Sub-field of an embedded document
    Field(String),
    /// Rewritten comparison operator
    Operator(ComparisonOperator),
}

impl FilterKey {
    fn render(&self) -> String {
        match self {
            FilterKey::Field(name) => name.clone(),
            FilterKey::Operator(op) => op.store_tag().to_string(),
        }
    }
}

/// Right-hand side of a field predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterNode {
    Scalar(String),
    List(Vec<String>),
    Document(IndexMap<FilterKey, FilterNode>),
}

impl FilterNode {
    fn from_param(value: &ParamValue) -> Self {
        match value {
            ParamValue::Single(s) => FilterNode::Scalar(s.clone()),
            ParamValue::Many(values) => FilterNode::List(values.clone()),
            ParamValue::Nested(entries) => FilterNode::Document(
                entries
                    .iter()
                    .map(|(key, value)| match ComparisonOperator::from_word(key) {
                        Some(op) => (FilterKey::Operator(op), Self::operand(op, value)),
                        None => (FilterKey::Field(key.clone()), Self::from_param(value)),
                    })
                    .collect(),
            ),
        }
    }

    /// `tags[in]=web,mobile` lists its members in one comma-separated value
    fn operand(op: ComparisonOperator, value: &ParamValue) -> Self {
        match (op, value) {
            (ComparisonOperator::In, ParamValue::Single(s)) => FilterNode::List(
                s.split(',')
                    .map(str::trim)
                    .filter(|member| !member.is_empty())
                    .map(String::from)
                    .collect(),
            ),
            _ => Self::from_param(value),
        }
    }

    /// Whether this node is a document of operators (`{ "$gt": .. }`)
    pub fn has_operators(&self) -> bool {
        match self {
            FilterNode::Document(entries) => entries
                .keys()
                .any(|key| matches!(key, FilterKey::Operator(_))),
            _ => false,
        }
    }

    /// Render in the store's native form
    pub fn to_value(&self) -> Value {
        match self {
            FilterNode::Scalar(s) => Value::String(s.clone()),
            FilterNode::List(values) => {
                Value::Array(values.iter().cloned().map(Value::String).collect())
            }
            FilterNode::Document(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, node)| (key.render(), node.to_value()))
                    .collect(),
            ),
        }
    }
}

/// Structured filter shared by the page fetch and the count query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterExpression {
    fields: IndexMap<String, FilterNode>,
}

impl FilterExpression {
    /// A filter matching every record
    pub fn match_all() -> Self {
        Self::default()
    }

    /// Translate a filter-only parameter mapping
    pub fn from_params(params: &IndexMap<String, ParamValue>) -> Self {
        Self {
            fields: params
                .iter()
                .map(|(field, value)| (field.clone(), FilterNode::from_param(value)))
                .collect(),
        }
    }

    /// Add (or replace) an equality predicate
    pub fn with_equals(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields
            .insert(field.into(), FilterNode::Scalar(value.into()));
        self
    }

    pub fn get(&self, field: &str) -> Option<&FilterNode> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FilterNode)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render in the store's native form
    pub fn to_document(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(field, node)| (field.clone(), node.to_value()))
            .collect();
        Value::Object(map)
    }
}

impl fmt::Display for FilterExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_document())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::query::QueryParameters;
    use serde_json::json;

    fn filter(pairs: &[(&str, &str)]) -> FilterExpression {
        let params = QueryParameters::from_pairs(pairs.iter().copied());
        FilterExpression::from_params(&params.filter_only())
    }

    #[test]
    fn test_equality_filters_are_identity() {
        let f = filter(&[("housing", "true"), ("careers", "Business")]);
        assert_eq!(
            f.to_document(),
            json!({ "housing": "true", "careers": "Business" })
        );
    }

    #[test]
    fn test_each_operator_is_rewritten() {
        for op in ComparisonOperator::ALL {
            let key = format!("averageCost[{}]", op.word());
            let f = filter(&[(key.as_str(), "5000")]);
            let expected = if op == ComparisonOperator::In {
                json!({ "averageCost": { op.store_tag(): ["5000"] } })
            } else {
                json!({ "averageCost": { op.store_tag(): "5000" } })
            };
            assert_eq!(f.to_document(), expected, "operator {}", op.word());
        }
    }

    #[test]
    fn test_in_splits_members() {
        let f = filter(&[("careers[in]", "Web Development, Business")]);
        assert_eq!(
            f.to_document(),
            json!({ "careers": { "$in": ["Web Development", "Business"] } })
        );
    }

    #[test]
    fn test_repeated_in_keeps_list() {
        let f = filter(&[("careers[in]", "Business"), ("careers[in]", "UI/UX")]);
        assert_eq!(
            f.to_document(),
            json!({ "careers": { "$in": ["Business", "UI/UX"] } })
        );
    }

    #[test]
    fn test_operator_words_inside_names_are_untouched() {
        let f = filter(&[
            ("lighting", "bright"),
            ("gt", "top-level-name"),
            ("title", "in"),
            ("location[inside]", "x"),
            ("rating[gtx]", "3"),
        ]);
        assert_eq!(
            f.to_document(),
            json!({
                "lighting": "bright",
                "gt": "top-level-name",
                "title": "in",
                "location": { "inside": "x" },
                "rating": { "gtx": "3" }
            })
        );
    }

    #[test]
    fn test_operator_words_are_case_sensitive() {
        let f = filter(&[("averageCost[GT]", "5")]);
        assert_eq!(f.to_document(), json!({ "averageCost": { "GT": "5" } }));
    }

    #[test]
    fn test_control_keys_never_reach_the_filter() {
        let f = filter(&[("select", "name"), ("page", "2"), ("housing", "true")]);
        assert_eq!(f.to_document(), json!({ "housing": "true" }));
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let f = filter(&[("sort", "name")]);
        assert!(f.is_empty());
        assert_eq!(f, FilterExpression::match_all());
    }

    #[test]
    fn test_has_operators() {
        let f = filter(&[("averageCost[lt]", "1"), ("location[state]", "MA")]);
        assert!(f.get("averageCost").unwrap().has_operators());
        assert!(!f.get("location").unwrap().has_operators());
    }

    #[test]
    fn test_with_equals_overrides() {
        let f = filter(&[("bootcamp", "a")]).with_equals("bootcamp", "b");
        assert_eq!(f.to_document(), json!({ "bootcamp": "b" }));
    }
}
