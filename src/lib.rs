//! # DevCamper
//!
//! A bootcamp directory service: bootcamps, their courses and reviews, served
//! over a REST API whose list endpoints share one generic query layer.
//!
//! ## Features
//!
//! - **Advanced results**: `field[gt]=5000`, `select`, `sort`, `page` and `limit`
//!   on every list endpoint, answered with a paginated envelope
//! - **Store abstraction**: list queries are built against the `Collection`
//!   trait, so any document store can back them
//! - **In-memory document store**: operator filters, dotted paths, multi-key
//!   sort, projection and populate of related records
//! - **Role-based access**: `user`, `publisher` and `admin` with owner checks
//! - **Fixture seeding**: bulk import and removal of JSON data files
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use devcamper::prelude::*;
//!
//! let db = register_relations(InMemoryDatabase::new());
//! devcamper::storage::seed::import_dir(&db, "demos/directory_api/_data").await?;
//!
//! ServerBuilder::from_config(&AppConfig::default())
//!     .with_database(db)
//!     .serve("127.0.0.1:5000")
//!     .await?;
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Query layer ===
    pub use crate::core::{
        advanced::{QueryDefaults, QueryTranslator, build_results},
        filter::{ComparisonOperator, FilterExpression},
        query::{Pagination, PaginationWindow, QueryParameters, ResultEnvelope},
        store::{Collection, Document, DocumentCollection, FindQuery, JoinSpec, RecordStore},
    };

    // === Core Traits ===
    pub use crate::core::{
        auth::{AuthContext, AuthPolicy, AuthenticatedUser, CredentialService, Role},
        entity::Entity,
        error::{ApiError, ApiResult, QueryExecutionError},
    };

    // === Entities ===
    pub use crate::entities::{Bootcamp, Course, Review, User, register_relations};

    // === Storage ===
    pub use crate::storage::{InMemoryCollection, InMemoryDatabase, Relation};

    // === Config ===
    pub use crate::config::AppConfig;

    // === Server ===
    pub use crate::server::{AppState, ServerBuilder};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};

    // === Axum ===
    pub use axum::{
        Router,
        extract::{Path, State},
        routing::{delete, get, post, put},
    };
}
