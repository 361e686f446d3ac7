//! Object backend trait and its request parameters.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::fmt;
use std::pin::Pin;

use cloudfiles_common::{Acl, FileDescriptor, ObjectRef, Result};

/// Maximum number of keys a single listing page returns.
pub const LIST_PAGE_SIZE: usize = 1000;

/// Byte stream returned by object reads.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Parameters for a single-page listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListParams {
    pub bucket: String,
    pub prefix: String,
}

/// Object payload. `Debug` never prints the content.
#[derive(Clone, PartialEq, Eq)]
pub struct Body(pub Bytes);

impl Body {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Body([REDACTED; {} bytes])", self.0.len())
    }
}

/// Parameters for writing one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutParams {
    pub bucket: String,
    pub key: String,
    pub body: Body,
    pub content_type: String,
    pub acl: Acl,
}

impl From<FileDescriptor> for PutParams {
    fn from(file: FileDescriptor) -> Self {
        Self {
            bucket: file.bucket,
            key: file.key,
            body: Body(Bytes::from(file.content)),
            content_type: file.content_type,
            acl: Acl::from_public(file.is_public),
        }
    }
}

/// Parameters for deleting several keys of one bucket in a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteManyParams {
    pub bucket: String,
    pub keys: Vec<String>,
}

/// Parameters for a server-side copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyParams {
    pub source: ObjectRef,
    pub destination: ObjectRef,
    pub acl: Acl,
}

/// Vendor-agnostic object storage backend.
///
/// Implementations report a missing object as `Error::NotFound` and any
/// other failure as `Error::Backend`. Retries and timeouts are the
/// implementation's own concern.
#[async_trait]
pub trait ObjectBackend: Send + Sync {
    /// Get the backend name (e.g., "s3", "memory").
    fn name(&self) -> &str;

    /// List keys under a prefix.
    ///
    /// Returns at most [`LIST_PAGE_SIZE`] keys; no continuation is attempted.
    async fn list_objects(&self, params: ListParams) -> Result<Vec<String>>;

    /// Write an object, replacing any existing object at the same key.
    async fn put_object(&self, params: PutParams) -> Result<()>;

    /// Open an object for reading.
    ///
    /// # Errors
    /// - `NotFound` if the key does not exist
    async fn get_object(&self, object: ObjectRef) -> Result<ByteStream>;

    /// Delete an object. Deleting a missing key succeeds.
    async fn delete_object(&self, object: ObjectRef) -> Result<()>;

    /// Delete several keys in one request.
    ///
    /// Succeeds when the request itself succeeds, whichever keys existed.
    async fn delete_objects(&self, params: DeleteManyParams) -> Result<()>;

    /// Copy an object server-side.
    ///
    /// # Errors
    /// - `NotFound` if the source does not exist
    async fn copy_object(&self, params: CopyParams) -> Result<()>;
}
