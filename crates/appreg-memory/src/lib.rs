//! In-memory application store for appreg.
//!
//! This crate provides an in-memory implementation of the `ApplicationStore`
//! trait from `appreg`, using a papaya lock-free HashMap for concurrent access.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use appreg::{ApplicationDescriptor, ApplicationManager};
//! use appreg_memory::{Collation, InMemoryApplicationStore};
//!
//! let store = Arc::new(InMemoryApplicationStore::with_collation(Collation::CaseInsensitive));
//! let manager = ApplicationManager::new(store);
//!
//! let record = manager
//!     .create_from_descriptor(&ApplicationDescriptor::new("portal"), &cancel)
//!     .await?;
//! ```

pub mod storage;

pub use storage::{Collation, InMemoryApplicationStore, MemoryStoreError};
