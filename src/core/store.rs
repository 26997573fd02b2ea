//! Store capability consumed by the query layer
//!
//! A [`FindQuery`] is an immutable description of one fetch: filter,
//! projection, sort, window and join. Each `with_*` step returns a new value,
//! so the order in which they are applied does not matter. A [`Collection`]
//! executes the description in one go and counts matches separately.

use crate::core::error::QueryExecutionError;
use crate::core::filter::FilterExpression;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;

/// A stored record: a JSON object keyed by field name
pub type Document = Map<String, Value>;

/// Field projection (`select=name,description`)
///
/// A leading `-` excludes a field instead of including it. Identifier fields
/// are implicit and returned unless explicitly excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    fields: Vec<String>,
}

impl Projection {
    /// Parse a comma-separated field list; blanks are skipped
    pub fn parse(raw: &str) -> Self {
        Self {
            fields: split_list(raw),
        }
    }

    /// Space-delimited fields (`name description`)
    pub fn of<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fields.join(" "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// One sort criterion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix('-') {
            Some(field) => Self {
                field: field.to_string(),
                direction: SortDirection::Descending,
            },
            None => Self {
                field: raw.strip_prefix('+').unwrap_or(raw).to_string(),
                direction: SortDirection::Ascending,
            },
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            SortDirection::Ascending => f.write_str(&self.field),
            SortDirection::Descending => write!(f, "-{}", self.field),
        }
    }
}

/// Multi-key sort (`sort=-averageCost,name`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<SortKey>,
}

impl SortSpec {
    pub fn parse(raw: &str) -> Self {
        Self {
            keys: split_list(raw).iter().map(|key| SortKey::parse(key)).collect(),
        }
    }

    pub fn keys(&self) -> &[SortKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self.keys.iter().map(ToString::to_string).collect();
        f.write_str(&keys.join(" "))
    }
}

/// Eager-join instruction: attach related records under `path`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinSpec {
    pub path: String,
    pub select: Option<Projection>,
}

impl JoinSpec {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            select: None,
        }
    }

    /// Restrict the joined records to a space-delimited field list
    pub fn with_select(mut self, fields: &str) -> Self {
        self.select = Some(Projection::of(fields.split_whitespace()));
        self
    }
}

/// Skip/take pair applied after sorting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub skip: u64,
    pub limit: u64,
}

/// Immutable description of one fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    filter: FilterExpression,
    projection: Option<Projection>,
    sort: Option<SortSpec>,
    window: Option<Window>,
    join: Option<JoinSpec>,
}

impl FindQuery {
    pub fn new(filter: FilterExpression) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn with_projection(self, projection: Projection) -> Self {
        Self {
            projection: Some(projection),
            ..self
        }
    }

    pub fn with_sort(self, sort: SortSpec) -> Self {
        Self {
            sort: Some(sort),
            ..self
        }
    }

    pub fn with_window(self, skip: u64, limit: u64) -> Self {
        Self {
            window: Some(Window { skip, limit }),
            ..self
        }
    }

    pub fn with_join(self, join: JoinSpec) -> Self {
        Self {
            join: Some(join),
            ..self
        }
    }

    pub fn filter(&self) -> &FilterExpression {
        &self.filter
    }

    pub fn projection(&self) -> Option<&Projection> {
        self.projection.as_ref()
    }

    pub fn sort(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    pub fn window(&self) -> Option<Window> {
        self.window
    }

    pub fn join(&self) -> Option<&JoinSpec> {
        self.join.as_ref()
    }
}

/// Read side of a store collection
#[async_trait]
pub trait Collection: Send + Sync {
    /// Collection name (`bootcamps`)
    fn name(&self) -> &str;

    /// Start a fetch description filtered by `filter`
    fn find(&self, filter: FilterExpression) -> FindQuery {
        FindQuery::new(filter)
    }

    /// Run a fetch description
    async fn execute(&self, query: &FindQuery) -> Result<Vec<Value>, QueryExecutionError>;

    /// Count the records matching `filter`, ignoring any window
    async fn count(&self, filter: &FilterExpression) -> Result<u64, QueryExecutionError>;
}

/// Write side of a store collection
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a document, assigning an `id` when missing
    async fn create(&self, document: Document) -> Result<Document, QueryExecutionError>;

    async fn get(&self, id: &str) -> Result<Option<Document>, QueryExecutionError>;

    /// Merge `changes` into the stored document
    async fn update(
        &self,
        id: &str,
        changes: Document,
    ) -> Result<Option<Document>, QueryExecutionError>;

    async fn delete(&self, id: &str) -> Result<bool, QueryExecutionError>;

    /// Delete every record matching `filter`, returning how many went
    async fn delete_many(&self, filter: &FilterExpression) -> Result<u64, QueryExecutionError>;

    /// First record matching `filter`, in insertion order
    async fn find_one(
        &self,
        filter: &FilterExpression,
    ) -> Result<Option<Document>, QueryExecutionError>;
}

/// A collection that can be both queried and written
pub trait DocumentCollection: Collection + RecordStore {}

impl<T: Collection + RecordStore> DocumentCollection for T {}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_is_space_delimited() {
        let projection = Projection::parse("name, description,,");
        assert_eq!(projection.fields(), ["name", "description"]);
        assert_eq!(projection.to_string(), "name description");
    }

    #[test]
    fn test_sort_spec_parses_direction() {
        let sort = SortSpec::parse("-averageCost,name");
        assert_eq!(
            sort.keys(),
            [
                SortKey {
                    field: "averageCost".into(),
                    direction: SortDirection::Descending
                },
                SortKey {
                    field: "name".into(),
                    direction: SortDirection::Ascending
                },
            ]
        );
        assert_eq!(sort.to_string(), "-averageCost name");
    }

    #[test]
    fn test_join_select() {
        let join = JoinSpec::new("bootcamp").with_select("name description");
        assert_eq!(join.path, "bootcamp");
        assert_eq!(
            join.select.map(|s| s.fields().to_vec()),
            Some(vec!["name".to_string(), "description".to_string()])
        );
    }

    #[test]
    fn test_find_query_steps_are_order_independent() {
        let filter = FilterExpression::match_all().with_equals("housing", "true");

        let a = FindQuery::new(filter.clone())
            .with_projection(Projection::parse("name"))
            .with_sort(SortSpec::parse("-createdAt"))
            .with_window(25, 25)
            .with_join(JoinSpec::new("courses"));
        let b = FindQuery::new(filter)
            .with_join(JoinSpec::new("courses"))
            .with_window(25, 25)
            .with_sort(SortSpec::parse("-createdAt"))
            .with_projection(Projection::parse("name"));

        assert_eq!(a, b);
        assert_eq!(a.window(), Some(Window { skip: 25, limit: 25 }));
    }
}
