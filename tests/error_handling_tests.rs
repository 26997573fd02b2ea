//! Tests for the typed error handling system
//!
//! These tests verify that:
//! - Errors return correct HTTP status codes
//! - Error responses carry the `success: false` envelope
//! - External errors convert into the handler error type

use axum::http::StatusCode;
use axum::response::IntoResponse;
use devcamper::core::error::{
    ApiError, EntityError, FieldValidationError, QueryExecutionError, RequestError,
    ValidationError,
};

fn not_found(entity_type: &str, id: &str) -> ApiError {
    ApiError::Entity(EntityError::NotFound {
        entity_type: entity_type.to_string(),
        id: id.to_string(),
    })
}

fn cast(field: &str, value: &str) -> QueryExecutionError {
    QueryExecutionError::Cast {
        field: field.to_string(),
        value: value.to_string(),
        expected: "Number".to_string(),
    }
}

// =============================================================================
// HTTP Status Code Tests
// =============================================================================

mod status_code_tests {
    use super::*;

    #[test]
    fn test_entity_not_found_returns_404() {
        assert_eq!(
            not_found("Bootcamp", "5d713995b721c3bb38c1f5d0").status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_query_errors_are_client_errors() {
        let errors = [
            cast("averageCost", "cheap"),
            QueryExecutionError::InvalidProjection {
                message: "cannot mix inclusion and exclusion".to_string(),
            },
            QueryExecutionError::UnknownRelation {
                collection: "bootcamps".to_string(),
                path: "instructors".to_string(),
            },
            QueryExecutionError::InvalidOperator {
                field: "careers".to_string(),
                operator: "$in".to_string(),
                message: "expected a list".to_string(),
            },
        ];

        for err in errors {
            assert_eq!(ApiError::Query(err).status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_duplicate_key_returns_409() {
        let err = ApiError::Query(QueryExecutionError::DuplicateKey {
            collection: "users".to_string(),
            id: "u1".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_store_unavailable_returns_500() {
        let err = ApiError::Query(QueryExecutionError::Unavailable {
            message: "lock poisoned".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_request_errors() {
        let unauthorized = ApiError::Request(RequestError::Unauthorized {
            message: "Not authorized to access this route".to_string(),
        });
        let forbidden = ApiError::Request(RequestError::Forbidden {
            message: "User role user is not authorized to access this route".to_string(),
        });
        let bad = ApiError::Request(RequestError::BadRequest {
            message: "User u1 has already reviewed this bootcamp".to_string(),
        });

        assert_eq!(unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(forbidden.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(bad.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_validation_error_returns_400() {
        let err = ApiError::Validation(ValidationError::InvalidJson {
            message: "expected value".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_error_returns_500() {
        let err = ApiError::Internal("unexpected".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

// =============================================================================
// Error Code Tests
// =============================================================================

mod error_code_tests {
    use super::*;

    #[test]
    fn test_codes_per_category() {
        assert_eq!(not_found("Review", "r1").error_code(), "ENTITY_NOT_FOUND");
        assert_eq!(
            ApiError::Query(cast("rating", "x")).error_code(),
            "QUERY_CAST_ERROR"
        );
        assert_eq!(
            ApiError::Validation(ValidationError::FieldErrors(vec![])).error_code(),
            "VALIDATION_ERROR"
        );
        assert_eq!(
            ApiError::Request(RequestError::Forbidden {
                message: String::new()
            })
            .error_code(),
            "FORBIDDEN"
        );
        assert_eq!(
            ApiError::Internal(String::new()).error_code(),
            "INTERNAL_ERROR"
        );
    }
}

// =============================================================================
// Error Response Tests
// =============================================================================

mod error_response_tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_the_resource() {
        let response = not_found("Bootcamp", "5d725a1b7b292f5f8ceff788").to_response();

        assert!(!response.success);
        assert_eq!(response.code, "ENTITY_NOT_FOUND");
        assert_eq!(
            response.error,
            "Bootcamp not found with id of 5d725a1b7b292f5f8ceff788"
        );
        let details = response.details.unwrap();
        assert_eq!(details["entity_type"], "Bootcamp");
        assert_eq!(details["id"], "5d725a1b7b292f5f8ceff788");
    }

    #[test]
    fn test_cast_error_details_name_the_field() {
        let response = ApiError::Query(cast("averageCost", "cheap")).to_response();

        let details = response.details.unwrap();
        assert_eq!(details["field"], "averageCost");
        assert_eq!(details["value"], "cheap");
        assert!(response.error.contains("averageCost"));
    }

    #[test]
    fn test_validation_errors_include_field_details() {
        let err = ApiError::Validation(ValidationError::FieldErrors(vec![
            FieldValidationError {
                field: "email".to_string(),
                message: "Please add a valid email".to_string(),
            },
            FieldValidationError {
                field: "name".to_string(),
                message: "Please add a name".to_string(),
            },
        ]));

        let response = err.to_response();

        let details = response.details.unwrap();
        let fields = details["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0]["field"], "email");
    }

    #[test]
    fn test_request_errors_have_no_details() {
        let response = ApiError::Request(RequestError::Unauthorized {
            message: "Not authorized to access this route".to_string(),
        })
        .to_response();

        assert!(response.details.is_none());
        assert_eq!(response.error, "Not authorized to access this route");
    }

    #[test]
    fn test_serialized_body_omits_missing_details() {
        let body = serde_json::to_value(ApiError::Internal("boom".to_string()).to_response())
            .unwrap();

        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert!(body.get("details").is_none());
    }
}

// =============================================================================
// Error Conversion Tests
// =============================================================================

mod error_conversion_tests {
    use super::*;

    #[test]
    fn test_query_error_converts() {
        let err: ApiError = cast("weeks", "many").into();
        assert!(matches!(err, ApiError::Query(QueryExecutionError::Cast { .. })));
    }

    #[test]
    fn test_serde_json_error_converts_to_invalid_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();

        let err: ApiError = json_err.into();

        assert!(matches!(
            err,
            ApiError::Validation(ValidationError::InvalidJson { .. })
        ));
    }

    #[test]
    fn test_anyhow_error_converts_to_internal() {
        let err: ApiError = anyhow::anyhow!("store offline").into();
        assert!(matches!(err, ApiError::Internal(ref msg) if msg == "store offline"));
    }
}

// =============================================================================
// IntoResponse Tests
// =============================================================================

mod into_response_tests {
    use super::*;

    #[test]
    fn test_not_found_into_response_status() {
        let response = not_found("Course", "c9").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_cast_into_response_status() {
        let response = ApiError::Query(cast("tuition", "free")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
