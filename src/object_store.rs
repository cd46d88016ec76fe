use crate::config::S3Config;
use crate::upload::StagedUpload;
use anyhow::{Context, Result};
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Builder as S3ConfigBuilder;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use tracing::{debug, info, instrument};

/// S3 client for durable image storage
pub struct ObjectStore {
    client: S3Client,
    bucket: String,
    public_url_base: String,
}

impl ObjectStore {
    /// Create a new object store client
    pub async fn new(config: &S3Config) -> Result<Self> {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;

        let mut s3_config_builder = S3ConfigBuilder::from(&aws_config);

        // Configure custom endpoint for MinIO/LocalStack
        if let Some(ref endpoint_url) = config.endpoint_url {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint_url);
        }

        // Force path-style access for MinIO compatibility
        if config.force_path_style {
            s3_config_builder = s3_config_builder.force_path_style(true);
        }

        let s3_config = s3_config_builder.build();
        let client = S3Client::from_conf(s3_config);

        info!(
            bucket = %config.bucket,
            region = %config.region,
            "Object store client initialized"
        );

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            public_url_base: public_url_base(config),
        })
    }

    /// Upload a staged image under its staged filename as key.
    ///
    /// Key uniqueness comes from the staged name's time prefix; there is no
    /// overwrite protection beyond that, and no retry.
    #[instrument(skip(self, staged), fields(key = %staged.file_name()))]
    pub async fn put_image(&self, staged: &StagedUpload) -> Result<String> {
        let key = staged.file_name().to_string();
        let data = staged
            .read()
            .await
            .map_err(|e| anyhow::anyhow!("failed to read staged upload: {e}"))?;

        debug!(
            key = %key,
            size_bytes = data.len(),
            "Uploading image to object store"
        );

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(data))
            .content_type(staged.content_type())
            .send()
            .await
            .context("Failed to upload image to S3")?;

        info!(key = %key, "Image uploaded successfully");

        Ok(key)
    }

    /// Publicly addressable URL for a stored key
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url_base, key)
    }
}

/// Base URL for public object links, honoring an explicit override for
/// non-AWS endpoints
fn public_url_base(config: &S3Config) -> String {
    match config.public_url_base {
        Some(ref base) => base.trim_end_matches('/').to_string(),
        None => format!(
            "https://{}.s3.{}.amazonaws.com",
            config.bucket, config.region
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> S3Config {
        S3Config {
            bucket: "sightsafe-images".to_string(),
            region: "us-east-1".to_string(),
            endpoint_url: None,
            force_path_style: false,
            public_url_base: None,
        }
    }

    #[test]
    fn test_public_url_base_default() {
        let config = test_config();
        assert_eq!(
            public_url_base(&config),
            "https://sightsafe-images.s3.us-east-1.amazonaws.com"
        );
    }

    #[test]
    fn test_public_url_base_override() {
        let config = S3Config {
            public_url_base: Some("http://localhost:9000/sightsafe-images/".to_string()),
            ..test_config()
        };
        assert_eq!(
            public_url_base(&config),
            "http://localhost:9000/sightsafe-images"
        );
    }
}
