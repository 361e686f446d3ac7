//! File operations over an object backend.
//!
//! Every operation resolves exactly once and never returns an error to
//! the caller: failures are logged through [`crate::report`] and reduced
//! to `None` or `false`.

use bytes::Bytes;
use futures::future::join_all;
use futures::TryStreamExt;
use std::fmt::Debug;
use tracing::warn;

use cloudfiles_common::{
    Acl, ConfigOverrides, Error, FileContent, FileDescriptor, ObjectRef, Result, StorageConfig,
};

use crate::backend::{Body, CopyParams, DeleteManyParams, ListParams, ObjectBackend, PutParams};
use crate::client::{ClientFactory, ClientProvider, S3ClientFactory};
use crate::context::RequestContext;
use crate::report::{settle, timing_audit, NotFoundPolicy};

/// Non-sensitive summary of an upload, used in diagnostics.
#[derive(Debug)]
struct UploadSummary<'a> {
    bucket: &'a str,
    key: &'a str,
    content_type: &'a str,
}

/// Non-sensitive summary of a batch upload, used in diagnostics.
#[derive(Debug)]
struct BatchSummary {
    files: Vec<String>,
}

/// Uniform file surface over object storage.
pub struct CloudStorage {
    provider: ClientProvider,
}

impl CloudStorage {
    /// Create a facade backed by S3.
    pub fn new(config: StorageConfig) -> Self {
        Self::with_factory(config, S3ClientFactory)
    }

    /// Create a facade backed by S3, merging `overrides` over the defaults.
    pub fn load(overrides: Option<ConfigOverrides>) -> Self {
        Self::new(StorageConfig::load(overrides))
    }

    /// Create a facade with a custom client factory.
    pub fn with_factory(config: StorageConfig, factory: impl ClientFactory + 'static) -> Self {
        Self {
            provider: ClientProvider::new(config, factory),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        self.provider.config()
    }

    /// Attach a client to `ctx` if none is attached yet.
    pub fn ensure_client(&self, ctx: &mut RequestContext) {
        self.provider.ensure_client(ctx);
    }

    /// List keys in `bucket` under `prefix` (default: all keys).
    ///
    /// Returns a single page of at most 1000 keys. An empty result is
    /// `Some(vec![])`; `None` means the listing failed.
    pub async fn get_objects_list(
        &self,
        ctx: &mut RequestContext,
        bucket: &str,
        prefix: Option<&str>,
    ) -> Option<Vec<String>> {
        let client = self.provider.client(ctx);
        let params = ListParams {
            bucket: bucket.to_string(),
            prefix: prefix.unwrap_or_default().to_string(),
        };

        timing_audit(ctx, "Start", "Get files list");
        let result = client.list_objects(params.clone()).await;
        finish(ctx, "Get files list", "Get Files List", &params, result, NotFoundPolicy::Log)
    }

    /// Upload one file, replacing any existing object at `key`.
    ///
    /// The object is private unless `is_public` is set.
    pub async fn upload_file(
        &self,
        ctx: &mut RequestContext,
        bucket: &str,
        key: &str,
        content: impl Into<Bytes>,
        content_type: &str,
        is_public: bool,
    ) -> bool {
        let client = self.provider.client(ctx);
        let params = PutParams {
            bucket: bucket.to_string(),
            key: key.to_string(),
            body: Body(content.into()),
            content_type: content_type.to_string(),
            acl: Acl::from_public(is_public),
        };
        let summary = UploadSummary {
            bucket,
            key,
            content_type,
        };

        timing_audit(ctx, "Start", "Upload file");
        let result = client.put_object(params).await;
        finish(ctx, "Upload file", "Upload File", &summary, result, NotFoundPolicy::Log).is_some()
    }

    /// Upload several files concurrently.
    ///
    /// `true` only if every upload succeeded. Files written before a
    /// failure stay written.
    pub async fn upload_files(&self, ctx: &mut RequestContext, files: Vec<FileDescriptor>) -> bool {
        let client = self.provider.client(ctx);
        let total = files.len();
        let summary = BatchSummary {
            files: files.iter().map(|f| format!("{}/{}", f.bucket, f.key)).collect(),
        };

        timing_audit(ctx, "Start", "Upload files");
        let uploads = files.into_iter().map(|file| {
            let client = client.clone();
            async move { client.put_object(PutParams::from(file)).await }
        });
        let results = join_all(uploads).await;

        let mut failures = results.into_iter().filter_map(|r| r.err());
        let result = match failures.next() {
            None => Ok(()),
            Some(first) => Err(Error::PartialBatchFailure {
                failed: 1 + failures.count(),
                total,
                cause: Box::new(first),
            }),
        };
        finish(ctx, "Upload files", "Upload Files", &summary, result, NotFoundPolicy::Log).is_some()
    }

    /// Read a whole object, as text when `as_string` is set.
    ///
    /// `None` when the object is missing (not logged) or the read failed
    /// (logged).
    pub async fn get_file(
        &self,
        ctx: &mut RequestContext,
        bucket: &str,
        key: &str,
        as_string: bool,
    ) -> Option<FileContent> {
        let client = self.provider.client(ctx);
        let object = ObjectRef::new(bucket, key);

        timing_audit(ctx, "Start", "Read file");
        let result = read_all(client.as_ref(), object.clone()).await;

        finish(ctx, "Read file", "Get File", &object, result, NotFoundPolicy::Suppress)
            .map(|data| FileContent::from_bytes(data, as_string))
    }

    /// Delete one object. A missing object counts as deleted.
    pub async fn delete_file(&self, ctx: &mut RequestContext, bucket: &str, key: &str) -> bool {
        let client = self.provider.client(ctx);
        let object = ObjectRef::new(bucket, key);

        timing_audit(ctx, "Start", "Delete file");
        let result = match client.delete_object(object.clone()).await {
            Err(err) if err.is_not_found() => Ok(()),
            other => other,
        };
        finish(ctx, "Delete file", "Delete File", &object, result, NotFoundPolicy::Log).is_some()
    }

    /// Delete several objects of one bucket in a single request.
    ///
    /// `true` when the request succeeded, whichever keys existed.
    pub async fn delete_files(
        &self,
        ctx: &mut RequestContext,
        bucket: &str,
        keys: Vec<String>,
    ) -> bool {
        let client = self.provider.client(ctx);
        let params = DeleteManyParams {
            bucket: bucket.to_string(),
            keys,
        };

        timing_audit(ctx, "Start", "Delete files");
        let result = client.delete_objects(params.clone()).await;
        finish(ctx, "Delete files", "Delete File(s)", &params, result, NotFoundPolicy::Log).is_some()
    }

    /// Copy an object. The copy is private unless `is_public` is set.
    ///
    /// A missing source yields `false` without a diagnostic entry.
    pub async fn copy_file(
        &self,
        ctx: &mut RequestContext,
        source: &ObjectRef,
        destination: &ObjectRef,
        is_public: bool,
    ) -> bool {
        let client = self.provider.client(ctx);
        let params = CopyParams {
            source: source.clone(),
            destination: destination.clone(),
            acl: Acl::from_public(is_public),
        };

        timing_audit(ctx, "Start", "Copy file");
        let result = client.copy_object(params.clone()).await;
        finish(ctx, "Copy file", "Copy File", &params, result, NotFoundPolicy::Suppress).is_some()
    }

    /// Move an object: copy it, then delete the source.
    ///
    /// Returns `false` without deleting anything if the copy fails. Once
    /// the copy succeeded the result is `true` even if deleting the source
    /// fails, in which case the object exists at both locations.
    pub async fn move_file(
        &self,
        ctx: &mut RequestContext,
        source: &ObjectRef,
        destination: &ObjectRef,
        is_public: bool,
    ) -> bool {
        if !self.copy_file(ctx, source, destination, is_public).await {
            return false;
        }

        if !self.delete_file(ctx, &source.bucket, &source.key).await {
            warn!(
                request_id = %ctx.id(),
                source = %source,
                destination = %destination,
                "Move left source object in place"
            );
        }
        true
    }
}

/// Read an object's stream to the end.
async fn read_all(client: &dyn ObjectBackend, object: ObjectRef) -> Result<Vec<u8>> {
    let chunks: Vec<Bytes> = client.get_object(object).await?.try_collect().await?;
    Ok(chunks.concat())
}

/// Close the timing audit on success, then flatten the result.
fn finish<T>(
    ctx: &RequestContext,
    label: &str,
    cmd: &str,
    params: &dyn Debug,
    result: Result<T>,
    policy: NotFoundPolicy,
) -> Option<T> {
    if result.is_ok() {
        timing_audit(ctx, "End", label);
    }
    settle(ctx, cmd, params, result, policy)
}
