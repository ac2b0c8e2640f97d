//! Security layer for GlossVault.
//!
//! This module provides:
//! - Stateless validation, sanitization, and screening rules
//! - Permission lookup through a host capability query
//! - The protection middleware gating every glossary read/write

pub mod middleware;
pub mod permissions;
pub mod policy;

pub use middleware::{
    DenyReason, OperationData, ProcessedData, ProtectionMiddleware, Verdict, STORAGE_OPERATION,
};
pub use permissions::{PermissionSource, StaticPermissions};
pub use policy::{SecurityPolicy, MAX_CONTENT_SIZE, MAX_INPUT_LENGTH};
