//! Axum extractors for the directory handlers
//!
//! - [`AuthContext`]: the caller, resolved from the bearer token
//! - [`QueryParameters`]: the bracket-aware query string of list requests
//! - [`ValidatedJson`]: a request body deserialized and checked with `validator`

use crate::core::auth::AuthContext;
use crate::core::error::{ApiError, RequestError};
use crate::core::query::QueryParameters;
use crate::server::state::AppState;
use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use validator::Validate;

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(state
            .credentials
            .context_from_headers(&parts.headers)
            .await?)
    }
}

impl<S> FromRequestParts<S> for QueryParameters
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri).map_err(
            |rejection| RequestError::BadRequest {
                message: rejection.body_text(),
            },
        )?;
        Ok(QueryParameters::from_pairs(pairs))
    }
}

/// JSON body that passed its `validator` rules
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state).await?;
        payload.validate()?;
        Ok(Self(payload))
    }
}
