use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use derive_more::Display;
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

/// Explicit storage configuration. Upload directory names are injected here at
/// construction instead of living as process-wide constants.
#[derive(Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    pub record_dir: String,
    pub compare_dir: String,
}

#[derive(Debug, Display, derive_more::Error)]
pub enum StorageError {
    /// Network-level failure talking to the object store; safe to retry.
    #[display("Transient storage failure: {message}")]
    Transient { message: String },
    /// The store rejected the request (permissions, bucket config); retrying
    /// will not help.
    #[display("Storage request rejected: {message}")]
    Rejected { message: String },
    /// Local filesystem failure while preparing the upload.
    #[display("Local file error: {message}")]
    Io { message: String },
}

impl StorageError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Transient { .. })
    }
}

/// Thin wrapper over the S3 client: uploads byte buffers or local temp files
/// under a generated key and returns the public object URL.
pub struct ObjectStorage {
    client: Client,
    config: StorageConfig,
}

impl ObjectStorage {
    pub fn new(client: Client, config: StorageConfig) -> Self {
        Self { client, config }
    }

    /// Builds a client from the ambient AWS environment (credentials chain)
    /// with the configured region.
    pub async fn from_env(config: StorageConfig) -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;
        Self::new(Client::new(&sdk_config), config)
    }

    pub fn record_dir(&self) -> &str {
        &self.config.record_dir
    }

    pub fn compare_dir(&self) -> &str {
        &self.config.compare_dir
    }

    /// Uploads an in-memory buffer and returns the public URL.
    pub async fn upload_bytes(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        content_type: &str,
        dir: &str,
    ) -> Result<String, StorageError> {
        let key = self.build_key(dir, file_name, "");
        self.put_object(ByteStream::from(bytes), &key, content_type)
            .await?;
        Ok(self.object_url(&key))
    }

    /// Uploads a local temporary file and returns the public URL. The temp
    /// file is removed after the upload; a failed removal is logged and does
    /// not fail the upload.
    pub async fn upload_file(
        &self,
        path: &Path,
        original_name: &str,
        content_type: &str,
        dir: &str,
    ) -> Result<String, StorageError> {
        let extension = original_name
            .rfind('.')
            .map(|idx| original_name[idx..].to_string())
            .unwrap_or_default();
        let key = self.build_key(dir, original_name, &extension);

        let body = ByteStream::from_path(path).await.map_err(|e| {
            StorageError::Io {
                message: format!("Failed to read upload file: {}", e),
            }
        })?;
        let result = self.put_object(body, &key, content_type).await;

        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!("Failed to remove temp upload file {:?}: {}", path, e);
        }
        result?;

        Ok(self.object_url(&key))
    }

    async fn put_object(
        &self,
        body: ByteStream,
        key: &str,
        content_type: &str,
    ) -> Result<(), StorageError> {
        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(classify_sdk_error)?;
        info!("Uploaded object {}", key);
        Ok(())
    }

    // Unique key so repeated uploads of the same file name never collide. The
    // extension is appended only when the name does not already end with it.
    fn build_key(&self, dir: &str, file_name: &str, extension: &str) -> String {
        let uuid = Uuid::new_v4();
        if file_name.ends_with(extension) {
            format!("{}/{}_{}", dir, uuid, file_name)
        } else {
            format!("{}/{}_{}{}", dir, uuid, file_name, extension)
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.config.bucket, self.config.region, key
        )
    }
}

fn classify_sdk_error<E>(err: SdkError<E>) -> StorageError
where
    E: std::error::Error + Send + Sync + 'static,
{
    match &err {
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) | SdkError::ResponseError(_) => {
            StorageError::Transient {
                message: format!("{}", err),
            }
        }
        _ => StorageError::Rejected {
            message: format!("{}", err),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_s3::Config;

    fn test_storage() -> ObjectStorage {
        let config = Config::builder()
            .behavior_version(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new("ap-northeast-2"))
            .build();
        ObjectStorage::new(
            Client::from_conf(config),
            StorageConfig {
                bucket: "talktrack-test".to_string(),
                region: "ap-northeast-2".to_string(),
                record_dir: "record".to_string(),
                compare_dir: "compare".to_string(),
            },
        )
    }

    #[test]
    fn key_lands_under_directory_with_unique_prefix() {
        let storage = test_storage();
        let key = storage.build_key("record", "take1.wav", ".wav");

        assert!(key.starts_with("record/"));
        assert!(key.ends_with("_take1.wav"));
        // uuid_name segment, extension not duplicated
        assert_eq!(key.matches(".wav").count(), 1);
    }

    #[test]
    fn key_appends_missing_extension() {
        let storage = test_storage();
        let key = storage.build_key(storage.compare_dir(), "take1", ".wav");
        assert!(key.starts_with("compare/"));
        assert!(key.ends_with("_take1.wav"));
    }

    #[test]
    fn keys_never_collide_for_the_same_name() {
        let storage = test_storage();
        let first = storage.build_key("record", "take1.wav", ".wav");
        let second = storage.build_key("record", "take1.wav", ".wav");
        assert_ne!(first, second);
    }

    #[test]
    fn object_url_is_publicly_resolvable_form() {
        let storage = test_storage();
        let url = storage.object_url("record/abc_take1.wav");
        assert_eq!(
            url,
            "https://talktrack-test.s3.ap-northeast-2.amazonaws.com/record/abc_take1.wav"
        );
    }
}
