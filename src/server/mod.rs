//! Server module for building the directory HTTP server
//!
//! `ServerBuilder` wires the collections of an `InMemoryDatabase`, the
//! query translator and a credential service into an Axum router.

pub mod builder;
pub mod exposure;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod state;

pub use builder::ServerBuilder;
pub use exposure::RestExposure;
pub use extractors::ValidatedJson;
pub use handlers::{DataResponse, ListResponse};
pub use state::AppState;
