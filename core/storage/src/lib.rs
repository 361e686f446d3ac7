//! Object storage operations for CloudFiles.
//!
//! This module exposes a small, fixed set of file operations (list,
//! upload, read, delete, copy, move) over an object storage backend.
//!
//! # Design Principles
//! - Lazy clients: a backend client is attached to a [`RequestContext`]
//!   by its first operation and reused afterwards
//! - Flattened failures: operations return `None`/`false`, never errors;
//!   the cause goes to the diagnostic log
//! - Backend isolation: no SDK types outside [`s3`]

pub mod backend;
pub mod client;
pub mod context;
pub mod memory;
pub mod operations;
pub mod report;
pub mod s3;

#[cfg(test)]
mod testing;

pub use backend::{ByteStream, ObjectBackend, LIST_PAGE_SIZE};
pub use client::{ClientFactory, ClientProvider, S3ClientFactory, SharedClientFactory};
pub use context::RequestContext;
pub use memory::{BackendOp, FaultKind, MemoryBackend};
pub use operations::CloudStorage;
pub use s3::S3Backend;
