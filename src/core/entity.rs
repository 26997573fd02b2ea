//! Entity trait shared by every resource model

use crate::core::error::EntityError;
use crate::core::store::Document;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Base trait for all resource models.
///
/// Entities are stored as JSON documents; `to_document` and
/// `from_document` convert between the typed model and its stored form.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The collection and URL segment (e.g., "bootcamps")
    fn resource_name() -> &'static str;

    /// Name used in messages (e.g., "Bootcamp")
    fn resource_name_singular() -> &'static str;

    /// Get the unique identifier for this entity instance
    fn id(&self) -> &str;

    /// Id of the user who owns this record, if any
    fn owner_id(&self) -> Option<&str> {
        None
    }

    fn to_document(&self) -> Result<Document, EntityError> {
        match serde_json::to_value(self) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(other) => Err(EntityError::SerializationError {
                entity_type: Self::resource_name_singular().to_string(),
                message: format!("expected an object, got {}", other),
            }),
            Err(e) => Err(EntityError::SerializationError {
                entity_type: Self::resource_name_singular().to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn from_document(document: Document) -> Result<Self, EntityError> {
        serde_json::from_value(Value::Object(document)).map_err(|e| {
            EntityError::SerializationError {
                entity_type: Self::resource_name_singular().to_string(),
                message: e.to_string(),
            }
        })
    }

    /// Not-found error for an id of this entity type
    fn not_found(id: &str) -> EntityError {
        EntityError::NotFound {
            entity_type: Self::resource_name_singular().to_string(),
            id: id.to_string(),
        }
    }
}
