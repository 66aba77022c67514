//! Storage module
//!
//! Provides blob storage for model payloads and the registry of
//! short-lived handles that make those payloads dereferenceable.

pub mod blob_store;
pub mod handles;

pub use blob_store::BlobStore;
pub use handles::{BlobHandle, HandleRegistry};
