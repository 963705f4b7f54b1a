//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Cleanup: purges expired entries and stale rate limit counters

mod cleanup;

pub use cleanup::spawn_cleanup_task;
