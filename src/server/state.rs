//! Shared state handed to every request handler

use crate::core::advanced::QueryTranslator;
use crate::core::auth::CredentialService;
use crate::core::entity::Entity;
use crate::core::store::DocumentCollection;
use crate::entities::{Bootcamp, Course, Review, User};
use crate::storage::InMemoryDatabase;
use std::sync::Arc;

/// Collections, query layer and credential service of one running server
#[derive(Clone)]
pub struct AppState {
    pub bootcamps: Arc<dyn DocumentCollection>,
    pub courses: Arc<dyn DocumentCollection>,
    pub reviews: Arc<dyn DocumentCollection>,
    pub users: Arc<dyn DocumentCollection>,
    pub translator: Arc<QueryTranslator>,
    pub credentials: Arc<dyn CredentialService>,
}

impl AppState {
    /// Bind the four resource collections of `db`
    pub fn from_database(
        db: &InMemoryDatabase,
        translator: QueryTranslator,
        credentials: Arc<dyn CredentialService>,
    ) -> Self {
        Self {
            bootcamps: Arc::new(db.collection(Bootcamp::resource_name())),
            courses: Arc::new(db.collection(Course::resource_name())),
            reviews: Arc::new(db.collection(Review::resource_name())),
            users: Arc::new(db.collection(User::resource_name())),
            translator: Arc::new(translator),
            credentials,
        }
    }
}
