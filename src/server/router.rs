//! Route table of the directory API

use super::handlers::{bootcamps, courses, reviews, users};
use super::state::AppState;
use axum::Router;
use axum::routing::{get, put};

/// Build the resource routes
///
/// - `GET|POST /bootcamps`, `GET|PUT|DELETE /bootcamps/{id}`
/// - `GET|POST /bootcamps/{id}/courses`, `GET|POST /bootcamps/{id}/reviews`
/// - `GET /courses`, `GET|PUT|DELETE /courses/{id}`
/// - `GET /reviews`, `GET|PUT|DELETE /reviews/{id}`
/// - `GET /auth/me`, `PUT /auth/updatedetails`
/// - `GET|POST /auth/users`, `GET|PUT|DELETE /auth/users/{id}` (admin)
pub fn build_api_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/bootcamps",
            get(bootcamps::list_bootcamps).post(bootcamps::create_bootcamp),
        )
        .route(
            "/bootcamps/{id}",
            get(bootcamps::get_bootcamp)
                .put(bootcamps::update_bootcamp)
                .delete(bootcamps::delete_bootcamp),
        )
        .route(
            "/bootcamps/{id}/courses",
            get(bootcamps::list_bootcamp_courses).post(bootcamps::create_bootcamp_course),
        )
        .route(
            "/bootcamps/{id}/reviews",
            get(bootcamps::list_bootcamp_reviews).post(bootcamps::create_bootcamp_review),
        )
        .route("/courses", get(courses::list_courses))
        .route(
            "/courses/{id}",
            get(courses::get_course)
                .put(courses::update_course)
                .delete(courses::delete_course),
        )
        .route("/reviews", get(reviews::list_reviews))
        .route(
            "/reviews/{id}",
            get(reviews::get_review)
                .put(reviews::update_review)
                .delete(reviews::delete_review),
        )
        .route("/auth/me", get(users::me))
        .route("/auth/updatedetails", put(users::update_details))
        .route(
            "/auth/users",
            get(users::list_users).post(users::create_user),
        )
        .route(
            "/auth/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .with_state(state)
}
