//! Core module containing the query layer, store traits and shared types

pub mod advanced;
pub mod auth;
pub mod entity;
pub mod error;
pub mod filter;
pub mod query;
pub mod store;

pub use advanced::{QueryDefaults, QueryTranslator, build_results};
pub use auth::{
    AuthContext, AuthPolicy, AuthenticatedUser, CredentialService, Role, StaticTokenCredentials,
};
pub use entity::Entity;
pub use error::{ApiError, ApiResult, EntityError, QueryExecutionError, RequestError};
pub use filter::{ComparisonOperator, FilterExpression, FilterKey, FilterNode};
pub use query::{PageLink, Pagination, PaginationWindow, QueryParameters, ResultEnvelope};
pub use store::{
    Collection, Document, DocumentCollection, FindQuery, JoinSpec, Projection, RecordStore,
    SortDirection, SortKey, SortSpec,
};
