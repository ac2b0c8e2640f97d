//! GlossVault sync engine.
//!
//! This module provides:
//! - The sync procedure gating every byte through the protection middleware
//! - A self-scheduling driver with a bounded retry budget
//! - The HTTP transport for the remote sync endpoint
//! - The storage collaborator seam

pub mod engine;
pub mod scheduler;
pub mod store;
pub mod transport;

pub use engine::SyncEngine;
pub use scheduler::{SyncOptions, SyncScheduler, SyncStatus};
pub use store::{GlossaryStore, MemoryStore};
pub use transport::{HttpTransport, SyncTransport};
