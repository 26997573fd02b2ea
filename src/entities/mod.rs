//! Resource models of the directory
//!
//! Each model implements [`Entity`](crate::core::Entity) and comes with
//! validated create/update payloads.

pub mod bootcamp;
pub mod course;
pub mod review;
pub mod user;

pub use bootcamp::{Bootcamp, Career, Location, NewBootcamp, UpdateBootcamp};
pub use course::{Course, MinimumSkill, NewCourse, UpdateCourse};
pub use review::{NewReview, Review, UpdateReview};
pub use user::{NewUser, UpdateUser, User, UserDetails};

use crate::core::entity::Entity;
use crate::core::error::EntityError;
use crate::core::store::Document;
use crate::storage::in_memory::{InMemoryDatabase, Relation};
use serde::Serialize;
use serde_json::Value;

/// Collections filled by the seeder, in import order
pub const SEEDED_COLLECTIONS: [&str; 4] = ["bootcamps", "courses", "users", "reviews"];

/// Register the populate paths used by the list endpoints
///
/// - `bootcamps.courses`: every course of the bootcamp
/// - `bootcamps.reviews`: every review of the bootcamp
/// - `courses.bootcamp` / `reviews.bootcamp`: the owning bootcamp
pub fn register_relations(db: InMemoryDatabase) -> InMemoryDatabase {
    db.with_relation(
        Bootcamp::resource_name(),
        Relation::has_many("courses", Course::resource_name(), "bootcamp"),
    )
    .with_relation(
        Bootcamp::resource_name(),
        Relation::has_many("reviews", Review::resource_name(), "bootcamp"),
    )
    .with_relation(
        Course::resource_name(),
        Relation::belongs_to("bootcamp", Bootcamp::resource_name()),
    )
    .with_relation(
        Review::resource_name(),
        Relation::belongs_to("bootcamp", Bootcamp::resource_name()),
    )
}

/// Serialize an update payload into the fields it actually sets
///
/// Payload fields left out of the request are skipped, so the store only
/// merges what the caller sent.
pub(crate) fn changes_document<T: Serialize>(
    entity_type: &str,
    payload: &T,
) -> Result<Document, EntityError> {
    match serde_json::to_value(payload) {
        Ok(Value::Object(changes)) => Ok(changes
            .into_iter()
            .filter(|(_, value)| !value.is_null())
            .collect()),
        Ok(other) => Err(EntityError::SerializationError {
            entity_type: entity_type.to_string(),
            message: format!("expected an object, got {}", other),
        }),
        Err(e) => Err(EntityError::SerializationError {
            entity_type: entity_type.to_string(),
            message: e.to_string(),
        }),
    }
}
