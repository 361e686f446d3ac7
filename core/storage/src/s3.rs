//! S3 object backend built on the AWS SDK.

use async_trait::async_trait;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::timeout::TimeoutConfig;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream as SdkByteStream;
use aws_sdk_s3::types::{Delete, ObjectCannedAcl, ObjectIdentifier};
use aws_sdk_s3::Client;
use std::time::Duration;

use cloudfiles_common::{Acl, Error, ObjectRef, Result, StorageConfig};

use crate::backend::{
    ByteStream, CopyParams, DeleteManyParams, ListParams, ObjectBackend, PutParams,
};

/// Error codes S3 uses for a missing object.
const NOT_FOUND_CODES: &[&str] = &["NoSuchKey", "NotFound"];

/// S3 backend.
///
/// Wraps one SDK client bound to the configuration it was built with.
pub struct S3Backend {
    client: Client,
}

impl S3Backend {
    /// Build a client from static configuration.
    ///
    /// Construction does not touch the network; credentials are only
    /// exercised by the first request.
    pub fn new(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "cloudfiles-static",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .retry_config(RetryConfig::standard().with_max_attempts(config.max_attempts.max(1)))
            .timeout_config(
                TimeoutConfig::builder()
                    .operation_attempt_timeout(Duration::from_millis(config.timeout_ms))
                    .build(),
            )
            .force_path_style(config.force_path_style);

        if let Some(ref endpoint) = config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        Self {
            client: Client::from_conf(builder.build()),
        }
    }
}

fn canned_acl(acl: Acl) -> ObjectCannedAcl {
    match acl {
        Acl::Private => ObjectCannedAcl::Private,
        Acl::PublicRead => ObjectCannedAcl::PublicRead,
    }
}

/// Map an SDK failure onto the common error, keeping the full error chain.
fn classify<E, R>(err: SdkError<E, R>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let code = err.as_service_error().and_then(|e| e.code()).map(String::from);
    let message = DisplayErrorContext(&err).to_string();

    match code {
        Some(code) if NOT_FOUND_CODES.contains(&code.as_str()) => Error::NotFound(message),
        _ => Error::Backend(message),
    }
}

#[async_trait]
impl ObjectBackend for S3Backend {
    fn name(&self) -> &str {
        "s3"
    }

    async fn list_objects(&self, params: ListParams) -> Result<Vec<String>> {
        let output = self
            .client
            .list_objects()
            .bucket(&params.bucket)
            .prefix(&params.prefix)
            .send()
            .await
            .map_err(classify)?;

        Ok(output
            .contents()
            .iter()
            .filter_map(|object| object.key().map(String::from))
            .collect())
    }

    async fn put_object(&self, params: PutParams) -> Result<()> {
        self.client
            .put_object()
            .bucket(&params.bucket)
            .key(&params.key)
            .body(SdkByteStream::from(params.body.0))
            .content_type(&params.content_type)
            .acl(canned_acl(params.acl))
            .send()
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn get_object(&self, object: ObjectRef) -> Result<ByteStream> {
        let output = self
            .client
            .get_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .send()
            .await
            .map_err(classify)?;

        let stream = futures::stream::try_unfold(output.body, |mut body| async move {
            let chunk = body
                .try_next()
                .await
                .map_err(|e| Error::Backend(format!("Body read failed: {}", e)))?;
            Ok(chunk.map(|bytes| (bytes, body)))
        });
        Ok(Box::pin(stream))
    }

    async fn delete_object(&self, object: ObjectRef) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&object.bucket)
            .key(&object.key)
            .send()
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn delete_objects(&self, params: DeleteManyParams) -> Result<()> {
        let identifiers = params
            .keys
            .iter()
            .map(|key| {
                ObjectIdentifier::builder()
                    .key(key)
                    .build()
                    .map_err(|e| Error::InvalidInput(format!("Invalid object identifier: {}", e)))
            })
            .collect::<Result<Vec<_>>>()?;

        let delete = Delete::builder()
            .set_objects(Some(identifiers))
            .build()
            .map_err(|e| Error::InvalidInput(format!("Invalid delete request: {}", e)))?;

        self.client
            .delete_objects()
            .bucket(&params.bucket)
            .delete(delete)
            .send()
            .await
            .map_err(classify)?;
        Ok(())
    }

    async fn copy_object(&self, params: CopyParams) -> Result<()> {
        self.client
            .copy_object()
            .copy_source(params.source.to_copy_source())
            .bucket(&params.destination.bucket)
            .key(&params.destination.key)
            .acl(canned_acl(params.acl))
            .send()
            .await
            .map_err(classify)?;
        Ok(())
    }
}
