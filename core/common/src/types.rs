//! Common types used throughout CloudFiles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a stored object.
///
/// Bucket and key are passed to the backend verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

impl ObjectRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Composite `bucket/key` form used as a copy source.
    pub fn to_copy_source(&self) -> String {
        format!("{}/{}", self.bucket, self.key)
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Canned access control applied to a written object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Acl {
    #[default]
    Private,
    PublicRead,
}

impl Acl {
    /// Map the caller's public flag to an ACL. Unset means private.
    pub fn from_public(is_public: bool) -> Self {
        if is_public {
            Acl::PublicRead
        } else {
            Acl::Private
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Acl::Private => "private",
            Acl::PublicRead => "public-read",
        }
    }
}

impl fmt::Display for Acl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file to upload as part of a batch.
#[derive(Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub bucket: String,
    pub key: String,
    pub content: Vec<u8>,
    pub content_type: String,
    pub is_public: bool,
}

impl FileDescriptor {
    /// Create a private file descriptor.
    pub fn new(
        bucket: impl Into<String>,
        key: impl Into<String>,
        content: impl Into<Vec<u8>>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            content: content.into(),
            content_type: content_type.into(),
            is_public: false,
        }
    }

    /// Mark the file as publicly readable.
    pub fn public(mut self) -> Self {
        self.is_public = true;
        self
    }
}

impl fmt::Debug for FileDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileDescriptor")
            .field("bucket", &self.bucket)
            .field("key", &self.key)
            .field("content", &format_args!("[REDACTED; {} bytes]", self.content.len()))
            .field("content_type", &self.content_type)
            .field("is_public", &self.is_public)
            .finish()
    }
}

/// Content returned by a read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContent {
    Bytes(Vec<u8>),
    Text(String),
}

impl FileContent {
    /// Build from raw bytes, decoding as (lossy) UTF-8 when `as_string` is set.
    pub fn from_bytes(data: Vec<u8>, as_string: bool) -> Self {
        if as_string {
            match String::from_utf8(data) {
                Ok(text) => FileContent::Text(text),
                Err(e) => FileContent::Text(String::from_utf8_lossy(e.as_bytes()).into_owned()),
            }
        } else {
            FileContent::Bytes(data)
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FileContent::Bytes(data) => data,
            FileContent::Text(text) => text.as_bytes(),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            FileContent::Bytes(data) => data,
            FileContent::Text(text) => text.into_bytes(),
        }
    }
}
