//! In-memory object backend for testing.

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use cloudfiles_common::{Acl, Error, ObjectRef, Result};

use crate::backend::{
    ByteStream, CopyParams, DeleteManyParams, ListParams, ObjectBackend, PutParams, LIST_PAGE_SIZE,
};

/// Size of the chunks `get_object` streams back.
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Backend call, as recorded in the call log and matched by faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOp {
    List,
    Put,
    Get,
    Delete,
    DeleteMany,
    Copy,
}

/// Failure an injected fault produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    NotFound,
    Backend,
}

#[derive(Debug, Clone)]
struct Fault {
    op: BackendOp,
    key: Option<String>,
    kind: FaultKind,
}

/// A stored object with the attributes it was written with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
    pub acl: Acl,
}

type Buckets = HashMap<String, BTreeMap<String, StoredObject>>;

/// In-memory object backend.
///
/// Buckets must be created before use; calls against an unknown bucket
/// fail like a real service would. All data is lost on drop.
#[derive(Default)]
pub struct MemoryBackend {
    buckets: RwLock<Buckets>,
    faults: RwLock<Vec<Fault>>,
    calls: RwLock<Vec<BackendOp>>,
}

impl MemoryBackend {
    /// Create a backend without buckets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend with the given buckets.
    pub fn with_buckets<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let backend = Self::new();
        if let Ok(mut buckets) = backend.buckets.write() {
            for name in names {
                buckets.entry(name.into()).or_default();
            }
        }
        backend
    }

    /// Create a bucket. Existing buckets are left untouched.
    pub fn create_bucket(&self, name: impl Into<String>) -> Result<()> {
        self.write_buckets()?.entry(name.into()).or_default();
        Ok(())
    }

    /// Make every later call of `op` fail with `kind`.
    ///
    /// With `key` set, only calls touching that key fail (the source key
    /// for copies).
    pub fn inject_fault(&self, op: BackendOp, key: Option<&str>, kind: FaultKind) -> Result<()> {
        self.faults
            .write()
            .map_err(|_| poisoned())?
            .push(Fault {
                op,
                key: key.map(String::from),
                kind,
            });
        Ok(())
    }

    /// Remove all injected faults.
    pub fn clear_faults(&self) -> Result<()> {
        self.faults.write().map_err(|_| poisoned())?.clear();
        Ok(())
    }

    /// Look up a stored object.
    pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
        self.buckets
            .read()
            .ok()
            .and_then(|buckets| buckets.get(bucket).and_then(|b| b.get(key)).cloned())
    }

    /// Whether an object exists.
    pub fn contains(&self, bucket: &str, key: &str) -> bool {
        self.object(bucket, key).is_some()
    }

    /// Backend calls received so far, in order.
    pub fn calls(&self) -> Vec<BackendOp> {
        self.calls.read().map(|c| c.clone()).unwrap_or_default()
    }

    fn read_buckets(&self) -> Result<RwLockReadGuard<'_, Buckets>> {
        self.buckets.read().map_err(|_| poisoned())
    }

    fn write_buckets(&self) -> Result<RwLockWriteGuard<'_, Buckets>> {
        self.buckets.write().map_err(|_| poisoned())
    }

    /// Record the call and fail it if a matching fault is injected.
    fn enter(&self, op: BackendOp, key: Option<&str>) -> Result<()> {
        self.calls.write().map_err(|_| poisoned())?.push(op);

        let faults = self.faults.read().map_err(|_| poisoned())?;
        let hit = faults.iter().find(|fault| {
            fault.op == op
                && match (&fault.key, key) {
                    (None, _) => true,
                    (Some(expected), Some(actual)) => expected == actual,
                    (Some(_), None) => false,
                }
        });

        match hit.map(|fault| fault.kind) {
            None => Ok(()),
            Some(FaultKind::NotFound) => Err(Error::NotFound(format!(
                "NoSuchKey: injected for {:?} {}",
                op,
                key.unwrap_or_default()
            ))),
            Some(FaultKind::Backend) => Err(Error::Backend(format!(
                "InternalError: injected failure for {:?} {}",
                op,
                key.unwrap_or_default()
            ))),
        }
    }
}

fn poisoned() -> Error {
    Error::Backend("memory backend lock poisoned".to_string())
}

fn no_such_bucket(bucket: &str) -> Error {
    Error::Backend(format!("NoSuchBucket: {}", bucket))
}

#[async_trait]
impl ObjectBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn list_objects(&self, params: ListParams) -> Result<Vec<String>> {
        self.enter(BackendOp::List, Some(params.prefix.as_str()))?;

        let buckets = self.read_buckets()?;
        let objects = buckets
            .get(&params.bucket)
            .ok_or_else(|| no_such_bucket(&params.bucket))?;

        Ok(objects
            .keys()
            .filter(|key| key.starts_with(&params.prefix))
            .take(LIST_PAGE_SIZE)
            .cloned()
            .collect())
    }

    async fn put_object(&self, params: PutParams) -> Result<()> {
        self.enter(BackendOp::Put, Some(params.key.as_str()))?;

        let mut buckets = self.write_buckets()?;
        let objects = buckets
            .get_mut(&params.bucket)
            .ok_or_else(|| no_such_bucket(&params.bucket))?;

        objects.insert(
            params.key,
            StoredObject {
                data: params.body.0,
                content_type: params.content_type,
                acl: params.acl,
            },
        );
        Ok(())
    }

    async fn get_object(&self, object: ObjectRef) -> Result<ByteStream> {
        self.enter(BackendOp::Get, Some(object.key.as_str()))?;

        let data = {
            let buckets = self.read_buckets()?;
            let objects = buckets
                .get(&object.bucket)
                .ok_or_else(|| no_such_bucket(&object.bucket))?;
            objects
                .get(&object.key)
                .map(|stored| stored.data.clone())
                .ok_or_else(|| Error::NotFound(format!("NoSuchKey: {}", object)))?
        };

        let chunks: Vec<Result<Bytes>> = data
            .chunks(READ_CHUNK_SIZE)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();
        Ok(Box::pin(stream::iter(chunks)))
    }

    async fn delete_object(&self, object: ObjectRef) -> Result<()> {
        self.enter(BackendOp::Delete, Some(object.key.as_str()))?;

        let mut buckets = self.write_buckets()?;
        let objects = buckets
            .get_mut(&object.bucket)
            .ok_or_else(|| no_such_bucket(&object.bucket))?;
        objects.remove(&object.key);
        Ok(())
    }

    async fn delete_objects(&self, params: DeleteManyParams) -> Result<()> {
        self.enter(BackendOp::DeleteMany, None)?;

        let mut buckets = self.write_buckets()?;
        let objects = buckets
            .get_mut(&params.bucket)
            .ok_or_else(|| no_such_bucket(&params.bucket))?;
        for key in &params.keys {
            objects.remove(key);
        }
        Ok(())
    }

    async fn copy_object(&self, params: CopyParams) -> Result<()> {
        self.enter(BackendOp::Copy, Some(params.source.key.as_str()))?;

        let mut buckets = self.write_buckets()?;
        let source = buckets
            .get(&params.source.bucket)
            .ok_or_else(|| no_such_bucket(&params.source.bucket))?
            .get(&params.source.key)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("NoSuchKey: {}", params.source)))?;

        let destination = buckets
            .get_mut(&params.destination.bucket)
            .ok_or_else(|| no_such_bucket(&params.destination.bucket))?;
        destination.insert(
            params.destination.key,
            StoredObject {
                acl: params.acl,
                ..source
            },
        );
        Ok(())
    }
}
