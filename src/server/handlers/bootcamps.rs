//! `/bootcamps` routes

use super::reviews::reviewers;
use super::{
    Created, DataResponse, ListResponse, by_field, created, ensure_can_modify, list_related, load,
};
use crate::core::auth::{AuthContext, AuthPolicy, Role};
use crate::core::entity::Entity;
use crate::core::error::{ApiResult, RequestError};
use crate::core::query::{QueryParameters, ResultEnvelope};
use crate::core::store::JoinSpec;
use crate::entities::{
    Bootcamp, Course, NewBootcamp, NewCourse, NewReview, Review, UpdateBootcamp,
};
use crate::server::extractors::ValidatedJson;
use crate::server::state::AppState;
use axum::Json;
use axum::extract::{Path, State};
use serde_json::Value;

/// Roles allowed to publish bootcamps and courses
pub(crate) fn publishers() -> AuthPolicy {
    AuthPolicy::roles(&[Role::Publisher, Role::Admin])
}

/// `GET /bootcamps`, each bootcamp with its courses
pub async fn list_bootcamps(
    State(state): State<AppState>,
    params: QueryParameters,
) -> ApiResult<Json<ResultEnvelope>> {
    let envelope = state
        .translator
        .build_results(
            &*state.bootcamps,
            &params,
            Some(JoinSpec::new(Course::resource_name())),
        )
        .await?;
    Ok(Json(envelope))
}

pub async fn get_bootcamp(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DataResponse<Bootcamp>>> {
    let bootcamp = load::<Bootcamp>(&*state.bootcamps, &id).await?;
    Ok(Json(DataResponse::new(bootcamp)))
}

/// `POST /bootcamps`
///
/// Publishers own at most one bootcamp; admins may create any number.
pub async fn create_bootcamp(
    State(state): State<AppState>,
    ctx: AuthContext,
    ValidatedJson(payload): ValidatedJson<NewBootcamp>,
) -> ApiResult<Created<Bootcamp>> {
    let user = ctx.authorize(&publishers())?;

    if !user.is_admin()
        && state
            .bootcamps
            .find_one(&by_field("user", &user.id))
            .await?
            .is_some()
    {
        return Err(RequestError::BadRequest {
            message: format!("The user with ID {} has already published a bootcamp", user.id),
        }
        .into());
    }

    let bootcamp = payload.into_bootcamp(&user.id);
    let stored = state.bootcamps.create(bootcamp.to_document()?).await?;
    let bootcamp = Bootcamp::from_document(stored)?;

    tracing::info!(id = %bootcamp.id, user = %user.id, "Bootcamp created");
    Ok(created(bootcamp))
}

pub async fn update_bootcamp(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateBootcamp>,
) -> ApiResult<Json<DataResponse<Bootcamp>>> {
    let user = ctx.authorize(&publishers())?;
    let bootcamp = load::<Bootcamp>(&*state.bootcamps, &id).await?;
    ensure_can_modify(user, &bootcamp, "update")?;

    let updated = state
        .bootcamps
        .update(&id, payload.changes()?)
        .await?
        .ok_or_else(|| Bootcamp::not_found(&id))?;
    Ok(Json(DataResponse::new(Bootcamp::from_document(updated)?)))
}

/// `DELETE /bootcamps/{id}`, removing its courses and reviews too
pub async fn delete_bootcamp(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<DataResponse<Value>>> {
    let user = ctx.authorize(&publishers())?;
    let bootcamp = load::<Bootcamp>(&*state.bootcamps, &id).await?;
    ensure_can_modify(user, &bootcamp, "delete")?;

    let courses = state.courses.delete_many(&by_field("bootcamp", &id)).await?;
    let reviews = state.reviews.delete_many(&by_field("bootcamp", &id)).await?;
    state.bootcamps.delete(&id).await?;

    tracing::info!(id = %id, courses, reviews, "Bootcamp deleted");
    Ok(Json(DataResponse::empty()))
}

/// `GET /bootcamps/{id}/courses`
pub async fn list_bootcamp_courses(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ListResponse>> {
    Ok(Json(list_related(&*state.courses, "bootcamp", &id).await?))
}

/// `POST /bootcamps/{id}/courses`, restricted to the bootcamp's owner
pub async fn create_bootcamp_course(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<NewCourse>,
) -> ApiResult<Created<Course>> {
    let user = ctx.authorize(&publishers())?;
    let bootcamp = load::<Bootcamp>(&*state.bootcamps, &id).await?;
    ensure_can_modify(user, &bootcamp, "add a course to")?;

    let course = payload.into_course(&bootcamp.id, &user.id);
    let stored = state.courses.create(course.to_document()?).await?;
    Ok(created(Course::from_document(stored)?))
}

/// `GET /bootcamps/{id}/reviews`
pub async fn list_bootcamp_reviews(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ListResponse>> {
    Ok(Json(list_related(&*state.reviews, "bootcamp", &id).await?))
}

/// `POST /bootcamps/{id}/reviews`, one review per user and bootcamp
pub async fn create_bootcamp_review(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<NewReview>,
) -> ApiResult<Created<Review>> {
    let user = ctx.authorize(&reviewers())?;
    let bootcamp = load::<Bootcamp>(&*state.bootcamps, &id).await?;

    let existing = by_field("bootcamp", &bootcamp.id).with_equals("user", user.id.clone());
    if state.reviews.find_one(&existing).await?.is_some() {
        return Err(RequestError::BadRequest {
            message: format!("User {} has already reviewed this bootcamp", user.id),
        }
        .into());
    }

    let review = payload.into_review(&bootcamp.id, &user.id);
    let stored = state.reviews.create(review.to_document()?).await?;
    Ok(created(Review::from_document(stored)?))
}
