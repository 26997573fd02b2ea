//! HTTP handlers, one module per resource

pub mod bootcamps;
pub mod courses;
pub mod reviews;
pub mod users;

use crate::core::auth::AuthenticatedUser;
use crate::core::entity::Entity;
use crate::core::error::{ApiResult, RequestError};
use crate::core::filter::FilterExpression;
use crate::core::store::DocumentCollection;
use crate::storage::in_memory::ID_FIELD;
use axum::Json;
use axum::http::StatusCode;
use serde::Serialize;
use serde_json::{Map, Value};

/// `{ "success": true, "data": ... }`
#[derive(Debug, Clone, Serialize)]
pub struct DataResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

impl DataResponse<Value> {
    /// Body of a successful delete
    pub fn empty() -> Self {
        Self::new(Value::Object(Map::new()))
    }
}

/// `{ "success": true, "count": n, "data": [...] }`, without pagination
#[derive(Debug, Clone, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<Value>,
}

impl ListResponse {
    pub fn new(data: Vec<Value>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}

pub(crate) type Created<T> = (StatusCode, Json<DataResponse<T>>);

pub(crate) fn created<T>(data: T) -> Created<T> {
    (StatusCode::CREATED, Json(DataResponse::new(data)))
}

/// Filter matching records whose `field` equals `value`
pub(crate) fn by_field(field: &str, value: &str) -> FilterExpression {
    FilterExpression::match_all().with_equals(field, value)
}

pub(crate) fn by_id(id: &str) -> FilterExpression {
    by_field(ID_FIELD, id)
}

/// Fetch and decode one record, or fail with the entity's 404
pub(crate) async fn load<E: Entity>(collection: &dyn DocumentCollection, id: &str) -> ApiResult<E> {
    let document = collection.get(id).await?.ok_or_else(|| E::not_found(id))?;
    Ok(E::from_document(document)?)
}

/// Only the owner of a record, or an admin, may change it
pub(crate) fn ensure_can_modify<E: Entity>(
    user: &AuthenticatedUser,
    entity: &E,
    action: &str,
) -> Result<(), RequestError> {
    if user.can_modify(entity.owner_id()) {
        return Ok(());
    }
    tracing::warn!(
        user = %user.id,
        entity = E::resource_name_singular(),
        id = entity.id(),
        "Caller does not own the record"
    );
    Err(RequestError::Unauthorized {
        message: format!(
            "User {} is not authorized to {} this {}",
            user.id,
            action,
            E::resource_name_singular().to_lowercase()
        ),
    })
}

/// Every record of `collection` whose `field` references `id`
pub(crate) async fn list_related(
    collection: &dyn DocumentCollection,
    field: &str,
    id: &str,
) -> ApiResult<ListResponse> {
    let data = collection
        .execute(&collection.find(by_field(field, id)))
        .await?;
    Ok(ListResponse::new(data))
}
