//! `/auth` routes: the caller's own profile and admin user management

use super::{Created, DataResponse, by_field, created, load};
use crate::core::auth::{AuthContext, AuthPolicy, Role};
use crate::core::entity::Entity;
use crate::core::error::{ApiResult, RequestError};
use crate::core::query::{QueryParameters, ResultEnvelope};
use crate::core::store::DocumentCollection;
use crate::entities::{NewUser, UpdateUser, User, UserDetails};
use crate::server::extractors::ValidatedJson;
use crate::server::state::AppState;
use axum::Json;
use axum::extract::{Path, State};
use serde_json::Value;

fn admins() -> AuthPolicy {
    AuthPolicy::roles(&[Role::Admin])
}

/// Reject an email already used by another account
async fn ensure_email_free(
    users: &dyn DocumentCollection,
    email: &str,
    owner: Option<&str>,
) -> ApiResult<()> {
    let taken = users
        .find_one(&by_field("email", &email.to_lowercase()))
        .await?
        .and_then(|user| user.get("id").and_then(Value::as_str).map(str::to_string));
    match taken {
        Some(id) if Some(id.as_str()) != owner => Err(RequestError::BadRequest {
            message: "Duplicate field value entered".to_string(),
        }
        .into()),
        _ => Ok(()),
    }
}

/// `GET /auth/me`
pub async fn me(
    State(state): State<AppState>,
    ctx: AuthContext,
) -> ApiResult<Json<DataResponse<User>>> {
    let caller = ctx.authorize(&AuthPolicy::Authenticated)?;
    let user = load::<User>(&*state.users, &caller.id).await?;
    Ok(Json(DataResponse::new(user)))
}

/// `PUT /auth/updatedetails`: name and email of the caller
pub async fn update_details(
    State(state): State<AppState>,
    ctx: AuthContext,
    ValidatedJson(payload): ValidatedJson<UserDetails>,
) -> ApiResult<Json<DataResponse<User>>> {
    let caller = ctx.authorize(&AuthPolicy::Authenticated)?;
    if let Some(email) = &payload.email {
        ensure_email_free(&*state.users, email, Some(&caller.id)).await?;
    }

    let updated = state
        .users
        .update(&caller.id, payload.changes()?)
        .await?
        .ok_or_else(|| User::not_found(&caller.id))?;
    Ok(Json(DataResponse::new(User::from_document(updated)?)))
}

/// `GET /auth/users`
pub async fn list_users(
    State(state): State<AppState>,
    ctx: AuthContext,
    params: QueryParameters,
) -> ApiResult<Json<ResultEnvelope>> {
    ctx.authorize(&admins())?;
    let envelope = state
        .translator
        .build_results(&*state.users, &params, None)
        .await?;
    Ok(Json(envelope))
}

pub async fn get_user(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<DataResponse<User>>> {
    ctx.authorize(&admins())?;
    let user = load::<User>(&*state.users, &id).await?;
    Ok(Json(DataResponse::new(user)))
}

pub async fn create_user(
    State(state): State<AppState>,
    ctx: AuthContext,
    ValidatedJson(payload): ValidatedJson<NewUser>,
) -> ApiResult<Created<User>> {
    ctx.authorize(&admins())?;
    ensure_email_free(&*state.users, &payload.email, None).await?;

    let user = payload.into_user();
    let stored = state.users.create(user.to_document()?).await?;
    tracing::info!(id = %user.id, role = %user.role, "User created");
    Ok(created(User::from_document(stored)?))
}

pub async fn update_user(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateUser>,
) -> ApiResult<Json<DataResponse<User>>> {
    ctx.authorize(&admins())?;
    if let Some(email) = &payload.email {
        ensure_email_free(&*state.users, email, Some(&id)).await?;
    }

    let updated = state
        .users
        .update(&id, payload.changes()?)
        .await?
        .ok_or_else(|| User::not_found(&id))?;
    Ok(Json(DataResponse::new(User::from_document(updated)?)))
}

pub async fn delete_user(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(id): Path<String>,
) -> ApiResult<Json<DataResponse<Value>>> {
    ctx.authorize(&admins())?;
    if !state.users.delete(&id).await? {
        return Err(User::not_found(&id).into());
    }
    Ok(Json(DataResponse::empty()))
}
