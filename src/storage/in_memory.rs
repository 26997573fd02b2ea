//! In-memory document store for testing and development
//!
//! Records live in insertion order per collection. Filters follow the usual
//! document-store rules: dotted paths reach into embedded documents, an
//! array field matches a scalar when any element does, and query-string
//! values are cast to the type of the stored field before comparing.

use crate::core::error::QueryExecutionError;
use crate::core::filter::{ComparisonOperator, FilterExpression, FilterKey, FilterNode};
use crate::core::store::{
    Collection, Document, FindQuery, Projection, RecordStore, SortDirection, SortSpec,
};
use async_trait::async_trait;
use chrono::DateTime;
use indexmap::IndexMap;
use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// Identifier field of every stored document
pub const ID_FIELD: &str = "id";

/// How a populate path resolves to records of another collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    /// `path` holds the id of one record in `target`
    BelongsTo { path: String, target: String },

    /// Records of `target` whose `foreign_field` holds this record's id
    HasMany {
        path: String,
        target: String,
        foreign_field: String,
    },
}

impl Relation {
    pub fn belongs_to(path: impl Into<String>, target: impl Into<String>) -> Self {
        Relation::BelongsTo {
            path: path.into(),
            target: target.into(),
        }
    }

    pub fn has_many(
        path: impl Into<String>,
        target: impl Into<String>,
        foreign_field: impl Into<String>,
    ) -> Self {
        Relation::HasMany {
            path: path.into(),
            target: target.into(),
            foreign_field: foreign_field.into(),
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Relation::BelongsTo { path, .. } | Relation::HasMany { path, .. } => path,
        }
    }
}

type Records = IndexMap<String, Document>;
type Collections = HashMap<String, Records>;

/// Shared in-memory database
///
/// Cloning is cheap and every clone sees the same data. Uses RwLock for
/// thread-safe access.
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    collections: Arc<RwLock<Collections>>,
    relations: Arc<HashMap<String, Vec<Relation>>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a populate path for `collection`
    pub fn with_relation(mut self, collection: impl Into<String>, relation: Relation) -> Self {
        Arc::make_mut(&mut self.relations)
            .entry(collection.into())
            .or_default()
            .push(relation);
        self
    }

    /// Handle bound to one collection (created lazily on first write)
    pub fn collection(&self, name: impl Into<String>) -> InMemoryCollection {
        InMemoryCollection {
            db: self.clone(),
            name: name.into(),
        }
    }

    pub fn relation(&self, collection: &str, path: &str) -> Option<&Relation> {
        self.relations
            .get(collection)?
            .iter()
            .find(|relation| relation.path() == path)
    }

    /// Drop every record of every collection
    pub fn clear(&self) -> Result<(), QueryExecutionError> {
        self.write()?.clear();
        Ok(())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Collections>, QueryExecutionError> {
        self.collections
            .read()
            .map_err(|e| QueryExecutionError::Unavailable {
                message: format!("Failed to acquire read lock: {}", e),
            })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Collections>, QueryExecutionError> {
        self.collections
            .write()
            .map_err(|e| QueryExecutionError::Unavailable {
                message: format!("Failed to acquire write lock: {}", e),
            })
    }
}

/// One collection of an [`InMemoryDatabase`]
#[derive(Clone)]
pub struct InMemoryCollection {
    db: InMemoryDatabase,
    name: String,
}

#[async_trait]
impl Collection for InMemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, query: &FindQuery) -> Result<Vec<Value>, QueryExecutionError> {
        // Reject bad projections and joins before touching any record
        let projection = query
            .projection()
            .map(ProjectionPlan::compile)
            .transpose()?
            .flatten();
        let join = match query.join() {
            Some(join) => {
                let relation = self.db.relation(&self.name, &join.path).ok_or_else(|| {
                    QueryExecutionError::UnknownRelation {
                        collection: self.name.clone(),
                        path: join.path.clone(),
                    }
                })?;
                let select = join
                    .select
                    .as_ref()
                    .map(ProjectionPlan::compile)
                    .transpose()?
                    .flatten();
                Some((relation, select))
            }
            None => None,
        };

        let collections = self.db.read()?;
        let mut matched = Vec::new();
        if let Some(records) = collections.get(&self.name) {
            for document in records.values() {
                if matches(document, query.filter())? {
                    matched.push(document);
                }
            }
        }

        if let Some(sort) = query.sort() {
            sort_documents(&mut matched, sort);
        }

        let (skip, limit) = query.window().map_or((0, usize::MAX), |window| {
            (to_usize(window.skip), to_usize(window.limit))
        });

        Ok(matched
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|document| {
                let mut document = match &projection {
                    Some(plan) => plan.apply(document),
                    None => document.clone(),
                };
                if let Some((relation, select)) = &join {
                    populate(&collections, &mut document, relation, select.as_ref());
                }
                Value::Object(document)
            })
            .collect())
    }

    async fn count(&self, filter: &FilterExpression) -> Result<u64, QueryExecutionError> {
        let collections = self.db.read()?;
        let mut total = 0;
        if let Some(records) = collections.get(&self.name) {
            for document in records.values() {
                if matches(document, filter)? {
                    total += 1;
                }
            }
        }
        Ok(total)
    }
}

#[async_trait]
impl RecordStore for InMemoryCollection {
    async fn create(&self, document: Document) -> Result<Document, QueryExecutionError> {
        let id = match document.get(ID_FIELD) {
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            _ => Uuid::new_v4().to_string(),
        };

        let mut stored = Document::new();
        stored.insert(ID_FIELD.to_string(), Value::String(id.clone()));
        stored.extend(document.into_iter().filter(|(key, _)| key != ID_FIELD));

        let mut collections = self.db.write()?;
        let records = collections.entry(self.name.clone()).or_default();
        if records.contains_key(&id) {
            return Err(QueryExecutionError::DuplicateKey {
                collection: self.name.clone(),
                id,
            });
        }
        records.insert(id, stored.clone());

        Ok(stored)
    }

    async fn get(&self, id: &str) -> Result<Option<Document>, QueryExecutionError> {
        let collections = self.db.read()?;
        Ok(collections
            .get(&self.name)
            .and_then(|records| records.get(id))
            .cloned())
    }

    async fn update(
        &self,
        id: &str,
        changes: Document,
    ) -> Result<Option<Document>, QueryExecutionError> {
        let mut collections = self.db.write()?;
        let Some(record) = collections
            .get_mut(&self.name)
            .and_then(|records| records.get_mut(id))
        else {
            return Ok(None);
        };

        for (key, value) in changes {
            if key != ID_FIELD {
                record.insert(key, value);
            }
        }

        Ok(Some(record.clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool, QueryExecutionError> {
        let mut collections = self.db.write()?;
        Ok(collections
            .get_mut(&self.name)
            .is_some_and(|records| records.shift_remove(id).is_some()))
    }

    async fn delete_many(&self, filter: &FilterExpression) -> Result<u64, QueryExecutionError> {
        let mut collections = self.db.write()?;
        let Some(records) = collections.get_mut(&self.name) else {
            return Ok(0);
        };

        let mut doomed = HashSet::new();
        for (id, document) in records.iter() {
            if matches(document, filter)? {
                doomed.insert(id.clone());
            }
        }
        records.retain(|id, _| !doomed.contains(id));

        Ok(doomed.len() as u64)
    }

    async fn find_one(
        &self,
        filter: &FilterExpression,
    ) -> Result<Option<Document>, QueryExecutionError> {
        let collections = self.db.read()?;
        if let Some(records) = collections.get(&self.name) {
            for document in records.values() {
                if matches(document, filter)? {
                    return Ok(Some(document.clone()));
                }
            }
        }
        Ok(None)
    }
}

fn to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

// =============================================================================
// Filtering
// =============================================================================

fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn matches(document: &Document, filter: &FilterExpression) -> Result<bool, QueryExecutionError> {
    for (field, node) in filter.fields() {
        if !match_node(field, lookup(document, field), node)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn match_node(
    path: &str,
    value: Option<&Value>,
    node: &FilterNode,
) -> Result<bool, QueryExecutionError> {
    match node {
        FilterNode::Scalar(raw) => equals(path, value, raw),
        // An array field must equal the list; a scalar field must be one of its members
        FilterNode::List(raws) => match value {
            Some(Value::Array(items)) => {
                if items.len() != raws.len() {
                    return Ok(false);
                }
                for (item, raw) in items.iter().zip(raws) {
                    if !equals_one(path, item, raw)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            _ => {
                for raw in raws {
                    if equals(path, value, raw)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        },
        FilterNode::Document(entries) => {
            let operators = node.has_operators();
            for (key, operand) in entries {
                let satisfied = match key {
                    FilterKey::Operator(op) => apply_operator(path, value, *op, operand)?,
                    FilterKey::Field(name) if operators => {
                        return Err(QueryExecutionError::InvalidOperator {
                            field: path.to_string(),
                            operator: name.clone(),
                            message: "operators cannot be mixed with sub-fields".to_string(),
                        });
                    }
                    FilterKey::Field(name) => match value {
                        Some(Value::Object(inner)) => {
                            match_node(&format!("{}.{}", path, name), inner.get(name), operand)?
                        }
                        _ => false,
                    },
                };
                if !satisfied {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}

fn equals(path: &str, value: Option<&Value>, raw: &str) -> Result<bool, QueryExecutionError> {
    match value {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Array(items)) => {
            for item in items {
                if equals_one(path, item, raw)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Some(stored) => equals_one(path, stored, raw),
    }
}

fn equals_one(path: &str, stored: &Value, raw: &str) -> Result<bool, QueryExecutionError> {
    let operand = cast(path, raw, stored)?;
    Ok(compare_values(Some(stored), Some(&operand)) == Ordering::Equal)
}

fn apply_operator(
    path: &str,
    value: Option<&Value>,
    op: ComparisonOperator,
    operand: &FilterNode,
) -> Result<bool, QueryExecutionError> {
    if op == ComparisonOperator::In {
        let members: Vec<&str> = match operand {
            FilterNode::List(values) => values.iter().map(String::as_str).collect(),
            FilterNode::Scalar(value) => vec![value.as_str()],
            FilterNode::Document(_) => {
                return Err(invalid_operand(path, op, "expects a list of values"));
            }
        };
        for member in members {
            if equals(path, value, member)? {
                return Ok(true);
            }
        }
        return Ok(false);
    }

    let FilterNode::Scalar(raw) = operand else {
        return Err(invalid_operand(path, op, "expects a single value"));
    };
    match value {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Array(items)) => {
            for item in items {
                if compare_one(path, item, op, raw)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Some(stored) => compare_one(path, stored, op, raw),
    }
}

fn compare_one(
    path: &str,
    stored: &Value,
    op: ComparisonOperator,
    raw: &str,
) -> Result<bool, QueryExecutionError> {
    let operand = cast(path, raw, stored)?;
    // Range operators only compare values of the same type
    if type_rank(Some(stored)) != type_rank(Some(&operand)) {
        return Ok(false);
    }
    let ordering = compare_values(Some(stored), Some(&operand));
    Ok(match op {
        ComparisonOperator::Gt => ordering == Ordering::Greater,
        ComparisonOperator::Gte => ordering != Ordering::Less,
        ComparisonOperator::Lt => ordering == Ordering::Less,
        ComparisonOperator::Lte => ordering != Ordering::Greater,
        ComparisonOperator::In => ordering == Ordering::Equal,
    })
}

fn invalid_operand(path: &str, op: ComparisonOperator, message: &str) -> QueryExecutionError {
    QueryExecutionError::InvalidOperator {
        field: path.to_string(),
        operator: op.store_tag().to_string(),
        message: message.to_string(),
    }
}

/// Read a query-string value as the type of the stored value
fn cast(path: &str, raw: &str, stored: &Value) -> Result<Value, QueryExecutionError> {
    let failed = |expected: &str| QueryExecutionError::Cast {
        field: path.to_string(),
        value: raw.to_string(),
        expected: expected.to_string(),
    };

    match stored {
        Value::Number(_) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| failed("Number")),
        Value::Bool(_) => match raw.trim() {
            "true" | "1" => Ok(Value::Bool(true)),
            "false" | "0" => Ok(Value::Bool(false)),
            _ => Err(failed("Boolean")),
        },
        _ => Ok(Value::String(raw.to_string())),
    }
}

// =============================================================================
// Ordering
// =============================================================================

/// Cross-type order: missing/null, numbers, strings, objects, arrays, booleans
fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let by_type = type_rank(a).cmp(&type_rank(b));
    if by_type != Ordering::Equal {
        return by_type;
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => compare_strings(x, y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Array(x)), Some(Value::Array(y))) => x
            .iter()
            .zip(y)
            .map(|(l, r)| compare_values(Some(l), Some(r)))
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (Some(Value::Object(x)), Some(Value::Object(y))) => x
            .iter()
            .zip(y)
            .map(|((lk, lv), (rk, rv))| lk.cmp(rk).then_with(|| compare_values(Some(lv), Some(rv))))
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        _ => Ordering::Equal,
    }
}

/// Timestamps compare chronologically, everything else lexically
fn compare_strings(x: &str, y: &str) -> Ordering {
    match (
        DateTime::parse_from_rfc3339(x),
        DateTime::parse_from_rfc3339(y),
    ) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => x.cmp(y),
    }
}

/// Stable multi-key sort
fn sort_documents(documents: &mut [&Document], sort: &SortSpec) {
    documents.sort_by(|a, b| {
        sort.keys()
            .iter()
            .map(|key| {
                let ordering = compare_values(lookup(a, &key.field), lookup(b, &key.field));
                match key.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            })
            .find(|ordering| *ordering != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}

// =============================================================================
// Projection and populate
// =============================================================================

/// Compiled field projection
#[derive(Debug, Clone, PartialEq, Eq)]
enum ProjectionPlan {
    Include(Vec<Vec<String>>),
    Exclude(Vec<Vec<String>>),
}

impl ProjectionPlan {
    /// `None` when the projection keeps every field
    fn compile(projection: &Projection) -> Result<Option<Self>, QueryExecutionError> {
        let mut include = Vec::new();
        let mut exclude = Vec::new();
        let mut keep_id = true;

        for field in projection.fields() {
            match field.strip_prefix('-') {
                Some(ID_FIELD) => keep_id = false,
                Some(name) => exclude.push(split_path(name)),
                None => include.push(split_path(field.strip_prefix('+').unwrap_or(field))),
            }
        }

        if !include.is_empty() {
            if let Some(excluded) = exclude.first() {
                return Err(QueryExecutionError::InvalidProjection {
                    message: format!(
                        "Cannot do exclusion on field {} in inclusion projection",
                        excluded.join(".")
                    ),
                });
            }
            if keep_id {
                include.push(vec![ID_FIELD.to_string()]);
            }
            return Ok(Some(ProjectionPlan::Include(include)));
        }

        if !keep_id {
            exclude.push(vec![ID_FIELD.to_string()]);
        }
        Ok((!exclude.is_empty()).then_some(ProjectionPlan::Exclude(exclude)))
    }

    fn apply(&self, document: &Document) -> Document {
        match self {
            ProjectionPlan::Include(paths) => {
                let paths: Vec<&[String]> = paths.iter().map(Vec::as_slice).collect();
                include_paths(document, &paths)
            }
            ProjectionPlan::Exclude(paths) => {
                let mut projected = document.clone();
                for path in paths {
                    exclude_path(&mut projected, path);
                }
                projected
            }
        }
    }
}

fn split_path(field: &str) -> Vec<String> {
    field.split('.').map(String::from).collect()
}

/// Keep only the listed paths, in document order
fn include_paths(document: &Document, paths: &[&[String]]) -> Document {
    let mut projected = Document::new();
    for (key, value) in document {
        let tails: Vec<&[String]> = paths
            .iter()
            .filter_map(|path| match path.split_first() {
                Some((head, tail)) if head == key => Some(tail),
                _ => None,
            })
            .collect();

        if tails.is_empty() {
            continue;
        }
        if tails.iter().any(|tail| tail.is_empty()) {
            projected.insert(key.clone(), value.clone());
        } else if let Value::Object(inner) = value {
            let nested = include_paths(inner, &tails);
            if !nested.is_empty() {
                projected.insert(key.clone(), Value::Object(nested));
            }
        }
    }
    projected
}

fn exclude_path(document: &mut Document, path: &[String]) {
    match path {
        [] => {}
        [last] => document.retain(|key, _| key != last),
        [head, rest @ ..] => {
            if let Some(Value::Object(inner)) = document.get_mut(head) {
                exclude_path(inner, rest);
            }
        }
    }
}

fn populate(
    collections: &Collections,
    document: &mut Document,
    relation: &Relation,
    select: Option<&ProjectionPlan>,
) {
    let shape = |related: &Document| {
        Value::Object(match select {
            Some(plan) => plan.apply(related),
            None => related.clone(),
        })
    };

    match relation {
        Relation::BelongsTo { path, target } => {
            // Nothing to resolve when the projection dropped the reference
            let Some(Value::String(id)) = document.get(path) else {
                return;
            };
            let related = collections
                .get(target)
                .and_then(|records| records.get(id))
                .map(shape)
                .unwrap_or(Value::Null);
            document.insert(path.clone(), related);
        }
        Relation::HasMany {
            path,
            target,
            foreign_field,
        } => {
            let Some(id) = document.get(ID_FIELD).and_then(Value::as_str) else {
                return;
            };
            let related: Vec<Value> = collections
                .get(target)
                .map(|records| {
                    records
                        .values()
                        .filter(|record| {
                            record.get(foreign_field).and_then(Value::as_str) == Some(id)
                        })
                        .map(shape)
                        .collect()
                })
                .unwrap_or_default();
            document.insert(path.clone(), Value::Array(related));
        }
    }
}
