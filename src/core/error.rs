//! Typed error handling for the directory service
//!
//! Handlers return [`ApiError`], which groups the more specific error types
//! and renders itself as a JSON response with the matching status code.
//!
//! # Error Categories
//!
//! - [`QueryExecutionError`]: the store rejected a query or is unavailable
//! - [`EntityError`]: a record is missing, duplicated or unreadable
//! - [`RequestError`]: authentication, authorization and bad requests
//! - [`ValidationError`]: invalid request payloads
//!
//! # Example
//!
//! ```rust,ignore
//! async fn get_bootcamp(id: &str) -> Result<Document, ApiError> {
//!     bootcamps.get(id).await?.ok_or_else(|| {
//!         EntityError::NotFound {
//!             entity_type: "Bootcamp".to_string(),
//!             id: id.to_string(),
//!         }
//!         .into()
//!     })
//! }
//! ```

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt;

/// The main error type returned by request handlers
#[derive(Debug)]
pub enum ApiError {
    /// The store rejected or failed a query
    Query(QueryExecutionError),

    /// Record-level errors (CRUD operations)
    Entity(EntityError),

    /// Authentication, authorization and malformed requests
    Request(RequestError),

    /// Invalid request payloads
    Validation(ValidationError),

    /// Unexpected failures (should not happen in normal operation)
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Query(e) => write!(f, "{}", e),
            ApiError::Entity(e) => write!(f, "{}", e),
            ApiError::Request(e) => write!(f, "{}", e),
            ApiError::Validation(e) => write!(f, "{}", e),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Query(e) => Some(e),
            ApiError::Entity(e) => Some(e),
            ApiError::Request(e) => Some(e),
            ApiError::Validation(e) => Some(e),
            ApiError::Internal(_) => None,
        }
    }
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always `false`, mirroring the `success` flag of successful responses
    pub success: bool,
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Query(e) => e.status_code(),
            ApiError::Entity(e) => e.status_code(),
            ApiError::Request(e) => e.status_code(),
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Query(e) => e.error_code(),
            ApiError::Entity(e) => e.error_code(),
            ApiError::Request(e) => e.error_code(),
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            success: false,
            code: self.error_code().to_string(),
            error: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::Entity(EntityError::NotFound { entity_type, id }) => {
                Some(serde_json::json!({
                    "entity_type": entity_type,
                    "id": id
                }))
            }
            ApiError::Validation(ValidationError::FieldErrors(errors)) => {
                Some(serde_json::json!({ "fields": errors }))
            }
            ApiError::Query(QueryExecutionError::Cast { field, value, .. }) => {
                Some(serde_json::json!({ "field": field, "value": value }))
            }
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Query Errors
// =============================================================================

/// Errors raised by a store while running a query
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryExecutionError {
    /// A filter value cannot be read as the stored field's type
    #[error("Cast to {expected} failed for value \"{value}\" at path \"{field}\"")]
    Cast {
        field: String,
        value: String,
        expected: String,
    },

    /// Inclusion and exclusion mixed in one projection
    #[error("Invalid projection: {message}")]
    InvalidProjection { message: String },

    /// Populate path not registered for the collection
    #[error("Cannot populate path `{path}` of collection `{collection}`")]
    UnknownRelation { collection: String, path: String },

    /// Operator applied to a value of the wrong shape
    #[error("Invalid use of {operator} on field \"{field}\": {message}")]
    InvalidOperator {
        field: String,
        operator: String,
        message: String,
    },

    /// Identifier already taken
    #[error("Duplicate key in collection `{collection}`: id \"{id}\" already exists")]
    DuplicateKey { collection: String, id: String },

    /// The store cannot serve requests
    #[error("Store unavailable: {message}")]
    Unavailable { message: String },
}

impl QueryExecutionError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            QueryExecutionError::Cast { .. } => StatusCode::BAD_REQUEST,
            QueryExecutionError::InvalidProjection { .. } => StatusCode::BAD_REQUEST,
            QueryExecutionError::UnknownRelation { .. } => StatusCode::BAD_REQUEST,
            QueryExecutionError::InvalidOperator { .. } => StatusCode::BAD_REQUEST,
            QueryExecutionError::DuplicateKey { .. } => StatusCode::CONFLICT,
            QueryExecutionError::Unavailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            QueryExecutionError::Cast { .. } => "QUERY_CAST_ERROR",
            QueryExecutionError::InvalidProjection { .. } => "QUERY_INVALID_PROJECTION",
            QueryExecutionError::UnknownRelation { .. } => "QUERY_UNKNOWN_RELATION",
            QueryExecutionError::InvalidOperator { .. } => "QUERY_INVALID_OPERATOR",
            QueryExecutionError::DuplicateKey { .. } => "DUPLICATE_KEY",
            QueryExecutionError::Unavailable { .. } => "STORE_UNAVAILABLE",
        }
    }
}

impl From<QueryExecutionError> for ApiError {
    fn from(err: QueryExecutionError) -> Self {
        ApiError::Query(err)
    }
}

// =============================================================================
// Entity Errors
// =============================================================================

/// Errors related to entity operations
#[derive(Debug)]
pub enum EntityError {
    /// Entity was not found
    NotFound { entity_type: String, id: String },

    /// Failed to serialize/deserialize entity
    SerializationError {
        entity_type: String,
        message: String,
    },
}

impl fmt::Display for EntityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityError::NotFound { entity_type, id } => {
                write!(f, "{} not found with id of {}", entity_type, id)
            }
            EntityError::SerializationError {
                entity_type,
                message,
            } => {
                write!(
                    f,
                    "Failed to serialize/deserialize {}: {}",
                    entity_type, message
                )
            }
        }
    }
}

impl std::error::Error for EntityError {}

impl EntityError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            EntityError::NotFound { .. } => StatusCode::NOT_FOUND,
            EntityError::SerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            EntityError::NotFound { .. } => "ENTITY_NOT_FOUND",
            EntityError::SerializationError { .. } => "ENTITY_SERIALIZATION_ERROR",
        }
    }
}

impl From<EntityError> for ApiError {
    fn from(err: EntityError) -> Self {
        ApiError::Entity(err)
    }
}

// =============================================================================
// Request Errors
// =============================================================================

/// Errors related to HTTP requests
#[derive(Debug)]
pub enum RequestError {
    /// No valid credentials, or the caller may not touch this resource
    Unauthorized { message: String },

    /// Authenticated, but the role is not allowed
    Forbidden { message: String },

    /// The request conflicts with a business rule
    BadRequest { message: String },
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::Unauthorized { message } => write!(f, "{}", message),
            RequestError::Forbidden { message } => write!(f, "{}", message),
            RequestError::BadRequest { message } => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for RequestError {}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            RequestError::Forbidden { .. } => StatusCode::FORBIDDEN,
            RequestError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            RequestError::Unauthorized { .. } => "UNAUTHORIZED",
            RequestError::Forbidden { .. } => "FORBIDDEN",
            RequestError::BadRequest { .. } => "BAD_REQUEST",
        }
    }
}

impl From<RequestError> for ApiError {
    fn from(err: RequestError) -> Self {
        ApiError::Request(err)
    }
}

// =============================================================================
// Validation Errors
// =============================================================================

/// Errors related to input validation
#[derive(Debug)]
pub enum ValidationError {
    /// Field validation errors, one entry per failed rule
    FieldErrors(Vec<FieldValidationError>),

    /// Body is not valid JSON or does not fit the payload type
    InvalidJson { message: String },
}

/// A single field validation error
#[derive(Debug, Clone, Serialize)]
pub struct FieldValidationError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::FieldErrors(errors) => {
                let msgs: Vec<String> = errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect();
                write!(f, "Validation errors: {}", msgs.join(", "))
            }
            ValidationError::InvalidJson { message } => {
                write!(f, "Invalid JSON: {}", message)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Validation(err)
    }
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldValidationError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, failures)| {
                failures.iter().map(move |failure| FieldValidationError {
                    field: field.to_string(),
                    message: failure
                        .message
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_else(|| failure.code.to_string()),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::Validation(ValidationError::FieldErrors(fields))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(ValidationError::InvalidJson {
            message: rejection.body_text(),
        })
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Validation(ValidationError::InvalidJson {
            message: err.to_string(),
        })
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// A specialized Result type for request handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_error_display() {
        let err = EntityError::NotFound {
            entity_type: "Bootcamp".to_string(),
            id: "5d713995b721c3bb38c1f5d0".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Bootcamp not found with id of 5d713995b721c3bb38c1f5d0"
        );
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_query_error_status_codes() {
        let cast = QueryExecutionError::Cast {
            field: "averageCost".into(),
            value: "abc".into(),
            expected: "Number".into(),
        };
        assert_eq!(cast.status_code(), StatusCode::BAD_REQUEST);
        assert!(cast.to_string().contains("averageCost"));

        let down = QueryExecutionError::Unavailable {
            message: "poisoned".into(),
        };
        assert_eq!(down.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(down.error_code(), "STORE_UNAVAILABLE");
    }

    #[test]
    fn test_api_error_conversion() {
        let err: ApiError = RequestError::Forbidden {
            message: "User role user is not authorized to access this route".into(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.error_code(), "FORBIDDEN");
    }

    #[test]
    fn test_error_response_serialization() {
        let err = ApiError::Entity(EntityError::NotFound {
            entity_type: "Course".to_string(),
            id: "abc".to_string(),
        });
        let body = serde_json::to_value(err.to_response()).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "ENTITY_NOT_FOUND");
        assert_eq!(body["error"], "Course not found with id of abc");
        assert_eq!(body["details"]["id"], "abc");
    }

    #[test]
    fn test_validation_error_multiple_fields() {
        let err = ValidationError::FieldErrors(vec![
            FieldValidationError {
                field: "name".to_string(),
                message: "required".to_string(),
            },
            FieldValidationError {
                field: "email".to_string(),
                message: "invalid format".to_string(),
            },
        ]);
        let display = err.to_string();
        assert!(display.contains("name"));
        assert!(display.contains("email"));
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: ApiError = json_err.into();
        assert!(matches!(
            err,
            ApiError::Validation(ValidationError::InvalidJson { .. })
        ));
    }
}
