//! `/reviews` routes

use super::courses::bootcamp_summary;
use super::{DataResponse, by_id, ensure_can_modify, load};
use crate::core::auth::{AuthContext, AuthPolicy, Role};
use crate::core::entity::Entity;
use crate::core::error::ApiResult;
use crate::core::query::{QueryParameters, ResultEnvelope};
use crate::entities::{Review, UpdateReview};
use crate::server::extractors::ValidatedJson;
use crate::server::state::AppState;
use axum::Json;
use axum::extract::{Path, State};
use serde_json::Value;

pub(crate) fn reviewers() -> AuthPolicy {
    AuthPolicy::roles(&[Role::User, Role::Admin])
}

/// `GET /reviews`
pub async fn list_reviews(
    State(state): State<AppState>,
    params: QueryParameters,
) -> ApiResult<Json<ResultEnvelope>> {
    let envelope = state
        .translator
        .build_results(&*state.reviews, &params, Some(bootcamp_summary()))
        .await?;
    Ok(Json(envelope))
}

pub async fn get_review(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DataResponse<Value>>> {
    let query = state.reviews.find(by_id(&id)).with_join(bootcamp_summary());
    let review = state
        .reviews
        .execute(&query)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| Review::not_found(&id))?;
    Ok(Json(DataResponse::new(review)))
}

pub async fn update_review(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateReview>,
) -> ApiResult<Json<DataResponse<Review>>> {
    let user = ctx.authorize(&reviewers())?;
    let review = load::<Review>(&*state.reviews, &id).await?;
    ensure_can_modify(user, &review, "update")?;

    let updated = state
        .reviews
        .update(&id, payload.changes()?)
        .await?
        .ok_or_else(|| Review::not_found(&id))?;
    Ok(Json(DataResponse::new(Review::from_document(updated)?)))
}

pub async fn delete_review(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<DataResponse<Value>>> {
    let user = ctx.authorize(&reviewers())?;
    let review = load::<Review>(&*state.reviews, &id).await?;
    ensure_can_modify(user, &review, "delete")?;

    state.reviews.delete(&id).await?;
    Ok(Json(DataResponse::empty()))
}
