//! Advanced results: filtered, sorted, paginated list queries
//!
//! [`QueryTranslator::build_results`] turns the raw query string of a list
//! request into one [`FindQuery`] plus a count, and wraps the page in a
//! [`ResultEnvelope`] with links to the neighbouring pages.

use crate::core::error::QueryExecutionError;
use crate::core::filter::FilterExpression;
use crate::core::query::{
    LIMIT_KEY, PAGE_KEY, PaginationWindow, QueryParameters, ResultEnvelope, SELECT_KEY, SORT_KEY,
};
use crate::core::store::{Collection, FindQuery, JoinSpec, Projection, SortSpec};
use serde::{Deserialize, Serialize};

/// Page size when `limit` is missing
pub const DEFAULT_LIMIT: u64 = 25;

/// Sort applied when `sort` is missing (newest first)
pub const DEFAULT_SORT: &str = "-createdAt";

/// Deployment-level defaults of the query layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryDefaults {
    pub default_limit: u64,
    pub default_sort: String,
}

impl Default for QueryDefaults {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LIMIT,
            default_sort: DEFAULT_SORT.to_string(),
        }
    }
}

/// Translates list-request parameters into store queries
///
/// Holds only its defaults, so one instance can serve every request.
#[derive(Debug, Clone, Default)]
pub struct QueryTranslator {
    defaults: QueryDefaults,
}

impl QueryTranslator {
    pub fn new(defaults: QueryDefaults) -> Self {
        Self { defaults }
    }

    pub fn defaults(&self) -> &QueryDefaults {
        &self.defaults
    }

    /// Build the fetch description and pagination window for `params`
    ///
    /// `params` is only read; the filter is derived from a copy without the
    /// control keys.
    pub fn translate(
        &self,
        collection: &(impl Collection + ?Sized),
        params: &QueryParameters,
        join: Option<JoinSpec>,
    ) -> (FindQuery, PaginationWindow) {
        let filter = FilterExpression::from_params(&params.filter_only());
        let mut query = collection.find(filter);

        if let Some(select) = params.control(SELECT_KEY) {
            let projection = Projection::parse(select);
            if !projection.is_empty() {
                query = query.with_projection(projection);
            }
        }

        let sort = params
            .control(SORT_KEY)
            .map(SortSpec::parse)
            .filter(|sort| !sort.is_empty())
            .unwrap_or_else(|| SortSpec::parse(&self.defaults.default_sort));
        if !sort.is_empty() {
            query = query.with_sort(sort);
        }

        let window = PaginationWindow::resolve(
            params.control(PAGE_KEY),
            params.control(LIMIT_KEY),
            self.defaults.default_limit,
        );
        query = query.with_window(window.start_index(), window.limit);

        if let Some(join) = join {
            query = query.with_join(join);
        }

        (query, window)
    }

    /// Run a list request against `collection`
    ///
    /// The count and the page fetch share one filter and run concurrently.
    /// A write landing between the two may leave `total` slightly stale.
    pub async fn build_results(
        &self,
        collection: &(impl Collection + ?Sized),
        params: &QueryParameters,
        join: Option<JoinSpec>,
    ) -> Result<ResultEnvelope, QueryExecutionError> {
        let (query, window) = self.translate(collection, params, join);

        tracing::debug!(
            collection = collection.name(),
            filter = %query.filter(),
            page = window.page,
            limit = window.limit,
            "Running advanced results query"
        );

        let (total, data) =
            futures::try_join!(collection.count(query.filter()), collection.execute(&query))?;

        Ok(ResultEnvelope::new(data, window.pagination(total)))
    }
}

/// [`QueryTranslator::build_results`] with the default limit and sort
pub async fn build_results(
    collection: &(impl Collection + ?Sized),
    params: &QueryParameters,
    join: Option<JoinSpec>,
) -> Result<ResultEnvelope, QueryExecutionError> {
    QueryTranslator::default()
        .build_results(collection, params, join)
        .await
}
