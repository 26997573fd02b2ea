//! Storage implementations

pub mod in_memory;
pub mod seed;

pub use in_memory::{InMemoryCollection, InMemoryDatabase, Relation};
