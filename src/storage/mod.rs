//! Storage backends for sample and alert-event persistence
//!
//! This module provides a trait-based abstraction for the store shared by
//! probers and checkers (possibly across several monitoring processes).
//!
//! ## Design
//!
//! - **Trait-based**: `StorageBackend` allows swapping implementations
//! - **Async**: All operations are async for compatibility with Tokio
//! - **Race-aware**: alert events are written through a conditional append
//!   keyed on the last stored event id, so the Alert/Recovery alternation
//!   holds even under concurrent checkers
//!
//! ## Backends
//!
//! - **SQLite** (default): embedded database, safe to share between processes
//! - **In-Memory**: no persistence, for tests and `"backend": "none"`

pub mod backend;
pub mod error;
pub mod memory;
pub mod schema;

#[cfg(feature = "storage-sqlite")]
pub mod sqlite;

pub use backend::{HealthStatus, StorageBackend};
pub use error::{StorageError, StorageResult};
pub use schema::StoredAlertEvent;
