//! Presigned-upload broker for client-side direct-to-storage uploads
//!
//! The API server never receives media bytes. Clients request a
//! time-limited presigned PUT URL, upload directly to the S3-compatible
//! store, and then reference the returned public URL when creating a
//! post or story. Nothing verifies that the upload actually completed;
//! orphaned objects are left to a storage lifecycle policy.

use anyhow::Result;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    Client,
    config::{Credentials, Region},
    presigning::PresigningConfig,
};
use chrono::Utc;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// How long a presigned PUT URL stays valid
const PRESIGN_VALIDITY: Duration = Duration::from_secs(3600);

/// S3 configuration
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Endpoint URL of the S3-compatible store
    pub endpoint: String,
    /// Region name
    pub region: String,
    /// Bucket receiving uploads
    pub bucket: String,
    /// Access key id
    pub access_key: String,
    /// Secret access key
    pub secret_key: String,
}

impl S3Config {
    /// Create a new `S3Config` from environment variables
    ///
    /// # Environment Variables
    /// - `S3_ENDPOINT`: Endpoint URL (required)
    /// - `S3_REGION`: Region name (default: `us-east-1`)
    /// - `S3_BUCKET`: Bucket name (required)
    /// - `S3_ACCESS_KEY` / `S3_SECRET_KEY`: Credentials (required)
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var("S3_ENDPOINT")
            .map_err(|_| anyhow::anyhow!("S3_ENDPOINT environment variable not set"))?;
        let region =
            std::env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let bucket = std::env::var("S3_BUCKET")
            .map_err(|_| anyhow::anyhow!("S3_BUCKET environment variable not set"))?;
        let access_key = std::env::var("S3_ACCESS_KEY")
            .map_err(|_| anyhow::anyhow!("S3_ACCESS_KEY environment variable not set"))?;
        let secret_key = std::env::var("S3_SECRET_KEY")
            .map_err(|_| anyhow::anyhow!("S3_SECRET_KEY environment variable not set"))?;

        Ok(S3Config {
            endpoint,
            region,
            bucket,
            access_key,
            secret_key,
        })
    }
}

/// A presigned upload grant
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUpload {
    /// Write-capable URL, valid for one hour
    pub url: String,
    /// Publicly readable URL of the same object
    pub public_url: String,
    /// Content type the client must send
    pub content_type: String,
}

/// Issues presigned PUT URLs scoped under the requesting user
#[derive(Clone)]
pub struct UploadBroker {
    client: Client,
    endpoint: String,
    bucket: String,
}

impl UploadBroker {
    /// Build an S3 client for the configured endpoint and credentials
    pub async fn new(config: &S3Config) -> Self {
        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "qawafi-env",
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .load()
            .await;

        // Path-style addressing for S3-compatible stores.
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .endpoint_url(&config.endpoint)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(s3_config),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            bucket: config.bucket.clone(),
        }
    }

    /// Issue a presigned PUT for a new object owned by `user_id`
    ///
    /// The content type is derived from `kind` alone (`video` maps to
    /// `video/mp4`, everything else to `image/jpeg`), never from the
    /// extension or the eventual bytes.
    pub async fn presign(
        &self,
        user_id: Uuid,
        kind: &str,
        ext: Option<&str>,
    ) -> Result<PresignedUpload> {
        let content_type = content_type_for(kind);
        let key = upload_key(user_id, ext, Utc::now().timestamp_millis());

        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .presigned(PresigningConfig::expires_in(PRESIGN_VALIDITY)?)
            .await?;

        Ok(PresignedUpload {
            url: presigned.uri().to_string(),
            public_url: format!("{}/{}/{}", self.endpoint, self.bucket, key),
            content_type: content_type.to_string(),
        })
    }
}

/// Content type implied by the requested upload kind
fn content_type_for(kind: &str) -> &'static str {
    if kind == "video" {
        "video/mp4"
    } else {
        "image/jpeg"
    }
}

/// Storage key scoped under the owner with a timestamp to avoid collisions
///
/// The extension is client-supplied, so anything beyond plain
/// alphanumerics (slashes, dots) falls back to `jpg` to keep the key
/// inside the owner's prefix.
fn upload_key(user_id: Uuid, ext: Option<&str>, timestamp_millis: i64) -> String {
    let ext = match ext {
        Some(e) if !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()) => e,
        _ => "jpg",
    };
    format!("uploads/{}/{}.{}", user_id, timestamp_millis, ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> S3Config {
        S3Config {
            endpoint: "http://localhost:9000".to_string(),
            region: "us-east-1".to_string(),
            bucket: "qawafi-media".to_string(),
            access_key: "test-access".to_string(),
            secret_key: "test-secret".to_string(),
        }
    }

    #[test]
    fn content_type_depends_on_kind_only() {
        assert_eq!(content_type_for("video"), "video/mp4");
        assert_eq!(content_type_for("image"), "image/jpeg");
        // Extension never enters the mapping; unknown kinds fall back to image.
        assert_eq!(content_type_for("audio"), "image/jpeg");
        assert_eq!(content_type_for(""), "image/jpeg");
    }

    #[test]
    fn upload_key_is_scoped_and_timestamped() {
        let user_id = Uuid::new_v4();
        let key = upload_key(user_id, Some("mp4"), 1_700_000_000_000);
        assert_eq!(key, format!("uploads/{}/1700000000000.mp4", user_id));
    }

    #[test]
    fn upload_key_defaults_to_jpg() {
        let user_id = Uuid::new_v4();
        assert!(upload_key(user_id, None, 1).ends_with(".jpg"));
        assert!(upload_key(user_id, Some(""), 1).ends_with(".jpg"));
    }

    #[test]
    fn upload_key_rejects_non_alphanumeric_extensions() {
        let user_id = Uuid::new_v4();
        assert_eq!(
            upload_key(user_id, Some("png/../../x"), 1),
            format!("uploads/{}/1.jpg", user_id)
        );
        assert!(upload_key(user_id, Some("tar.gz"), 1).ends_with(".jpg"));
        assert!(upload_key(user_id, Some("webp"), 1).ends_with(".webp"));
    }

    // Presigning is pure computation over the configured credentials, so
    // it works without a running object store.
    #[tokio::test]
    async fn presign_issues_scoped_url() {
        let broker = UploadBroker::new(&test_config()).await;
        let user_id = Uuid::new_v4();

        let grant = broker.presign(user_id, "video", Some("mp4")).await.unwrap();

        assert_eq!(grant.content_type, "video/mp4");
        assert!(grant.url.contains("qawafi-media"));
        assert!(grant.url.contains(&format!("uploads/{}/", user_id)));
        assert!(
            grant
                .public_url
                .starts_with("http://localhost:9000/qawafi-media/uploads/")
        );
        assert!(grant.public_url.ends_with(".mp4"));
    }

    #[tokio::test]
    async fn presign_defaults_to_image_jpeg() {
        let broker = UploadBroker::new(&test_config()).await;

        let grant = broker
            .presign(Uuid::new_v4(), "image", None)
            .await
            .unwrap();

        assert_eq!(grant.content_type, "image/jpeg");
        assert!(grant.public_url.ends_with(".jpg"));
    }
}
