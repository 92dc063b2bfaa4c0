use std::time::Duration;

use aws_sdk_s3::Client;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::types::Object;
use aws_smithy_types::byte_stream::ByteStream;
use tracing::debug;

use crate::error::StorageError;

/// The S3 bucket holding every tenant's records and files.
#[derive(Clone, Debug)]
pub struct Bucket {
    client: Client,
    name: String,
}

/// Body and metadata of a fetched object.
pub struct Fetched {
    pub body: Vec<u8>,
    pub etag: Option<String>,
    pub content_type: Option<String>,
}

/// Listing entry with size and modification time.
#[derive(Debug, Clone)]
pub struct ObjectMeta {
    pub key: String,
    pub size: i64,
    pub last_modified: Option<String>,
}

impl Bucket {
    pub fn new(client: Client, name: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn get(&self, key: &str) -> Result<Fetched, StorageError> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.name)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let err = e.into_service_error();
                if err.is_no_such_key() {
                    StorageError::NotFound {
                        key: key.to_string(),
                    }
                } else {
                    StorageError::GetObject(err.to_string())
                }
            })?;

        let etag = resp.e_tag().map(str::to_string);
        let content_type = resp.content_type().map(str::to_string);
        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| StorageError::GetObject(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(Fetched {
            body,
            etag,
            content_type,
        })
    }

    /// Size of an object, or `NotFound` if it was never uploaded.
    pub async fn head_size(&self, key: &str) -> Result<i64, StorageError> {
        let resp = self
            .client
            .head_object()
            .bucket(&self.name)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let err = e.into_service_error();
                if err.is_not_found() {
                    StorageError::NotFound {
                        key: key.to_string(),
                    }
                } else {
                    StorageError::HeadObject(err.to_string())
                }
            })?;
        Ok(resp.content_length().unwrap_or(0))
    }

    /// Write an object. Returns the new ETag.
    pub async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        self.put_with_condition(key, body, content_type, None).await
    }

    /// Write an object only if its current ETag is `expected_etag`.
    pub async fn put_if_match(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
        expected_etag: &str,
    ) -> Result<String, StorageError> {
        self.put_with_condition(key, body, content_type, Some(expected_etag))
            .await
    }

    async fn put_with_condition(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
        if_match: Option<&str>,
    ) -> Result<String, StorageError> {
        let resp = self
            .client
            .put_object()
            .bucket(&self.name)
            .key(key)
            .body(ByteStream::from(body))
            .set_content_type(content_type.map(str::to_string))
            .set_if_match(if_match.map(str::to_string))
            .send()
            .await
            .map_err(|e| {
                let err = e.into_service_error();
                if err.code() == Some("PreconditionFailed") {
                    StorageError::PreconditionFailed {
                        key: key.to_string(),
                    }
                } else {
                    StorageError::PutObject(err.to_string())
                }
            })?;

        Ok(resp.e_tag().unwrap_or_default().to_string())
    }

    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.name)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::DeleteObject(e.into_service_error().to_string()))?;
        Ok(())
    }

    /// Delete every object under `prefix`. Returns how many were removed.
    pub async fn delete_prefix(&self, prefix: &str) -> Result<usize, StorageError> {
        let keys = self.list_keys(prefix).await?;
        for key in &keys {
            self.delete(key).await?;
        }
        debug!(prefix, count = keys.len(), "deleted prefix");
        Ok(keys.len())
    }

    pub async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let objects = self.list_objects(prefix).await?;
        Ok(objects
            .iter()
            .filter_map(|o| o.key().map(str::to_string))
            .collect())
    }

    pub async fn list_with_metadata(&self, prefix: &str) -> Result<Vec<ObjectMeta>, StorageError> {
        let objects = self.list_objects(prefix).await?;
        Ok(objects
            .iter()
            .filter_map(|o| {
                o.key().map(|key| ObjectMeta {
                    key: key.to_string(),
                    size: o.size().unwrap_or(0),
                    last_modified: o.last_modified().map(|t| t.to_string()),
                })
            })
            .collect())
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<Object>, StorageError> {
        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let resp = self
                .client
                .list_objects_v2()
                .bucket(&self.name)
                .prefix(prefix)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|e| StorageError::ListObjects(e.into_service_error().to_string()))?;

            objects.extend(resp.contents().iter().cloned());

            if resp.is_truncated() == Some(true) {
                continuation_token = resp.next_continuation_token().map(str::to_string);
            } else {
                break;
            }
        }

        Ok(objects)
    }

    /// Presigned GET URL for downloading an object from the browser.
    pub async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, StorageError> {
        let presigned = self
            .client
            .get_object()
            .bucket(&self.name)
            .key(key)
            .presigned(presign_config(expires_in)?)
            .await
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }

    /// Presigned PUT URL for uploading straight from the browser.
    pub async fn presign_put(
        &self,
        key: &str,
        content_type: Option<&str>,
        expires_in: Duration,
    ) -> Result<String, StorageError> {
        let presigned = self
            .client
            .put_object()
            .bucket(&self.name)
            .key(key)
            .set_content_type(content_type.map(str::to_string))
            .presigned(presign_config(expires_in)?)
            .await
            .map_err(|e| StorageError::Presign(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }
}

fn presign_config(expires_in: Duration) -> Result<PresigningConfig, StorageError> {
    PresigningConfig::builder()
        .expires_in(expires_in)
        .build()
        .map_err(|e| StorageError::Presign(e.to_string()))
}
