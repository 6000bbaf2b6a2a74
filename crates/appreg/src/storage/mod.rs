//! Storage traits for client applications.
//!
//! # Implementations
//!
//! Storage implementations are provided in separate crates:
//!
//! - `appreg-memory` - in-memory storage backend

pub mod application;

pub use application::{ApplicationFilter, ApplicationStore};
