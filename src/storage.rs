//! Object storage for post attachments. S3 in production; anything implementing `ObjectStore` in tests.

use crate::error::AppError;
use crate::models::Attachment;
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;

/// A file received from a multipart request.
#[derive(Clone, Debug)]
pub struct UploadedFile {
    pub content_type: String,
    /// Extension derived from the content type.
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `file` under `folder` and return its public URL and key.
    async fn upload(&self, folder: &str, file: UploadedFile) -> Result<Attachment, AppError>;

    async fn delete(&self, public_id: &str) -> Result<(), AppError>;
}

pub struct S3Store {
    client: Client,
    bucket: String,
    public_url: String,
}

impl S3Store {
    pub fn new(client: Client, bucket: impl Into<String>, public_url: impl Into<String>) -> Self {
        S3Store {
            client,
            bucket: bucket.into(),
            public_url: public_url.into(),
        }
    }

    /// Client configured from the standard AWS environment (credentials, region, endpoint).
    pub async fn from_env(bucket: impl Into<String>, public_url: impl Into<String>) -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config), bucket, public_url)
    }
}

/// Object key for a new upload: `{folder}/{uuid}.{ext}`.
pub fn object_key(folder: &str, extension: &str) -> String {
    format!(
        "{}/{}.{}",
        folder.trim_end_matches('/'),
        uuid::Uuid::new_v4(),
        extension
    )
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn upload(&self, folder: &str, file: UploadedFile) -> Result<Attachment, AppError> {
        let key = object_key(folder, file.extension);
        let size = file.bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(&file.content_type)
            .body(ByteStream::from(file.bytes))
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("put {}: {}", key, e)))?;
        tracing::info!(key = %key, size, "attachment uploaded");
        Ok(Attachment {
            secure_url: format!("{}/{}", self.public_url, key),
            public_id: key,
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(public_id)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("delete {}: {}", public_id, e)))?;
        Ok(())
    }
}
