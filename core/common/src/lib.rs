//! Common utilities and types shared across CloudFiles modules.
//!
//! This module provides the error type, the configuration holder and the
//! value types that describe objects and uploads.

pub mod config;
pub mod error;
pub mod types;

pub use config::{ConfigOverrides, StorageConfig};
pub use error::{Error, ErrorKind, Result};
pub use types::{Acl, FileContent, FileDescriptor, ObjectRef};
