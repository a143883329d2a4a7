use anyhow::Result;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::{
  config::{Credentials, SharedCredentialsProvider},
  primitives::ByteStream,
  Client as S3Client,
};

use crate::config::S3Config;

/// Object storage used for user uploads. Returns public URLs for stored objects.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
  async fn upload_file(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<String>;
  async fn delete_file(&self, key: &str) -> Result<()>;
  /// Maps a URL previously returned by `upload_file` back to its key.
  /// Returns `None` for URLs that do not point into this storage.
  fn extract_key_from_url(&self, url: &str) -> Option<String>;
}

#[derive(Clone)]
pub struct S3Storage {
  client: S3Client,
  bucket: String,
  endpoint: Option<String>,
  public_endpoint: Option<String>,
}

impl S3Storage {
  pub async fn new(config: &S3Config) -> Result<Self> {
    let credentials = Credentials::new(
      config.access_key.clone(),
      config.secret_key.clone(),
      None,
      None,
      "trip-planner",
    );
    let credentials_provider = SharedCredentialsProvider::new(credentials);

    let mut config_builder = aws_config::defaults(BehaviorVersion::latest())
      .region(Region::new(config.region.clone()))
      .credentials_provider(credentials_provider);

    if let Some(ref endpoint_url) = config.endpoint {
      config_builder = config_builder.endpoint_url(endpoint_url);
    }

    let sdk_config = config_builder.load().await;
    let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&sdk_config);

    // Self-hosted endpoints (MinIO, RustFS) only serve path-style URLs.
    if config.endpoint.is_some() {
      s3_config_builder = s3_config_builder.force_path_style(true);
    }

    let client = S3Client::from_conf(s3_config_builder.build());

    tracing::info!(bucket = %config.bucket, "Object storage configured");

    Ok(Self {
      client,
      bucket: config.bucket.clone(),
      endpoint: config.endpoint.clone(),
      public_endpoint: config.public_endpoint.clone(),
    })
  }

  fn url_prefix(&self) -> String {
    match self.public_endpoint.as_ref().or(self.endpoint.as_ref()) {
      Some(endpoint) => format!("{}/{}/", endpoint.trim_end_matches('/'), self.bucket),
      None => format!("https://{}.s3.amazonaws.com/", self.bucket),
    }
  }
}

#[async_trait]
impl ObjectStorage for S3Storage {
  async fn upload_file(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<String> {
    let byte_stream = ByteStream::from(data);

    self
      .client
      .put_object()
      .bucket(&self.bucket)
      .key(key)
      .body(byte_stream)
      .content_type(content_type)
      .send()
      .await
      .map_err(|e| anyhow::anyhow!("Failed to upload file to S3: {:?}", e))?;

    Ok(format!("{}{}", self.url_prefix(), key))
  }

  async fn delete_file(&self, key: &str) -> Result<()> {
    self
      .client
      .delete_object()
      .bucket(&self.bucket)
      .key(key)
      .send()
      .await
      .map_err(|e| anyhow::anyhow!("Failed to delete file from S3: {:?}", e))?;

    Ok(())
  }

  fn extract_key_from_url(&self, url: &str) -> Option<String> {
    url
      .strip_prefix(&self.url_prefix())
      .filter(|key| !key.is_empty())
      .map(str::to_string)
  }
}
