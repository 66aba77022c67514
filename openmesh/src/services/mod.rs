//! Services module
//!
//! Business logic that sits between callers and the storage backends.

pub mod catalog;

pub use catalog::CatalogService;
