//! `/courses` routes

use super::bootcamps::publishers;
use super::{DataResponse, by_id, ensure_can_modify, load};
use crate::core::auth::AuthContext;
use crate::core::entity::Entity;
use crate::core::error::ApiResult;
use crate::core::query::{QueryParameters, ResultEnvelope};
use crate::core::store::JoinSpec;
use crate::entities::{Course, UpdateCourse};
use crate::server::extractors::ValidatedJson;
use crate::server::state::AppState;
use axum::Json;
use axum::extract::{Path, State};
use serde_json::Value;

/// The owning bootcamp, reduced to its name and description
pub(crate) fn bootcamp_summary() -> JoinSpec {
    JoinSpec::new("bootcamp").with_select("name description")
}

/// `GET /courses`
pub async fn list_courses(
    State(state): State<AppState>,
    params: QueryParameters,
) -> ApiResult<Json<ResultEnvelope>> {
    let envelope = state
        .translator
        .build_results(&*state.courses, &params, Some(bootcamp_summary()))
        .await?;
    Ok(Json(envelope))
}

/// `GET /courses/{id}` with its bootcamp populated
pub async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DataResponse<Value>>> {
    let query = state.courses.find(by_id(&id)).with_join(bootcamp_summary());
    let course = state
        .courses
        .execute(&query)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| Course::not_found(&id))?;
    Ok(Json(DataResponse::new(course)))
}

pub async fn update_course(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateCourse>,
) -> ApiResult<Json<DataResponse<Course>>> {
    let user = ctx.authorize(&publishers())?;
    let course = load::<Course>(&*state.courses, &id).await?;
    ensure_can_modify(user, &course, "update")?;

    let updated = state
        .courses
        .update(&id, payload.changes()?)
        .await?
        .ok_or_else(|| Course::not_found(&id))?;
    Ok(Json(DataResponse::new(Course::from_document(updated)?)))
}

pub async fn delete_course(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<DataResponse<Value>>> {
    let user = ctx.authorize(&publishers())?;
    let course = load::<Course>(&*state.courses, &id).await?;
    ensure_can_modify(user, &course, "delete")?;

    state.courses.delete(&id).await?;
    tracing::info!(id = %id, bootcamp = %course.bootcamp, "Course deleted");
    Ok(Json(DataResponse::empty()))
}
