use crate::config::UploadConfig;
use crate::error::PredictError;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A validated upload staged on local disk.
///
/// The staged copy is only a handoff buffer to durable storage; dropping the
/// guard removes the file, so every exit path of the pipeline releases it.
#[derive(Debug)]
pub struct StagedUpload {
    path: PathBuf,
    file_name: String,
    content_type: String,
    size_bytes: usize,
}

impl StagedUpload {
    /// Validate and stage an uploaded file under the configured directory.
    ///
    /// The staged name is `{unix_millis}-{sanitized original name}` so
    /// concurrent uploads of the same filename land under distinct keys.
    pub async fn stage(
        config: &UploadConfig,
        original_name: &str,
        data: &[u8],
    ) -> Result<Self, PredictError> {
        let extension = validate(config, original_name, data.len())?;

        let file_name = format!(
            "{}-{}",
            Utc::now().timestamp_millis(),
            sanitize_file_name(original_name)
        );
        let path = Path::new(&config.dir).join(&file_name);

        tokio::fs::create_dir_all(&config.dir)
            .await
            .map_err(|e| PredictError::ValidationFailed(format!("cannot create upload dir: {e}")))?;
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| PredictError::ValidationFailed(format!("cannot stage upload: {e}")))?;

        debug!(path = %path.display(), size_bytes = data.len(), "Upload staged");

        Ok(Self {
            path,
            file_name,
            content_type: content_type_for_extension(&extension),
            size_bytes: data.len(),
        })
    }

    /// Read the staged bytes back for the durable upload
    pub async fn read(&self) -> Result<Vec<u8>, PredictError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|e| PredictError::ValidationFailed(format!("cannot read staged upload: {e}")))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedUpload {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to remove staged upload");
        }
    }
}

/// Check extension allow-list and size ceiling, returning the extension.
/// The comparison is exact: `cat.JPG` is not an allowed type. Runs before
/// anything touches the disk.
fn validate(
    config: &UploadConfig,
    original_name: &str,
    size_bytes: usize,
) -> Result<String, PredictError> {
    let extension = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_string)
        .ok_or_else(|| {
            PredictError::ValidationFailed(format!("file {original_name:?} has no extension"))
        })?;

    if !config.allowed_extensions.contains(&extension) {
        return Err(PredictError::ValidationFailed(format!(
            "extension .{extension} is not an allowed image type"
        )));
    }

    if size_bytes > config.max_size_bytes {
        return Err(PredictError::ValidationFailed(format!(
            "file size {size_bytes} exceeds limit of {} bytes",
            config.max_size_bytes
        )));
    }

    Ok(extension)
}

/// Sanitize a filename to prevent path traversal in staged names and S3 keys
fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
            _ => '_',
        })
        .collect()
}

/// Content type for an image extension
fn content_type_for_extension(extension: &str) -> String {
    match extension {
        "jpeg" | "jpg" => "image/jpeg".to_string(),
        "png" => "image/png".to_string(),
        _ => "application/octet-stream".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(dir: &Path) -> UploadConfig {
        UploadConfig {
            dir: dir.to_string_lossy().into_owned(),
            ..UploadConfig::default()
        }
    }

    #[test]
    fn test_validate_rejects_disallowed_extension() {
        let config = UploadConfig::default();
        let result = validate(&config, "cat.bmp", 1000);
        assert!(matches!(result, Err(PredictError::ValidationFailed(_))));
    }

    #[test]
    fn test_validate_rejects_missing_extension() {
        let config = UploadConfig::default();
        assert!(validate(&config, "cat", 1000).is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_file() {
        let config = UploadConfig::default();
        let result = validate(&config, "dog.jpg", 2 * 1024 * 1024);
        assert!(matches!(result, Err(PredictError::ValidationFailed(_))));
    }

    #[test]
    fn test_validate_accepts_allowed_extensions() {
        let config = UploadConfig::default();
        assert_eq!(validate(&config, "cat.png", 500 * 1024).unwrap(), "png");
        assert_eq!(validate(&config, "cat.jpg", 500 * 1024).unwrap(), "jpg");
        assert_eq!(validate(&config, "cat.jpeg", 500 * 1024).unwrap(), "jpeg");
    }

    #[test]
    fn test_validate_extension_match_is_case_sensitive() {
        let config = UploadConfig::default();
        let result = validate(&config, "cat.JPG", 1000);
        assert!(matches!(result, Err(PredictError::ValidationFailed(_))));
        assert!(validate(&config, "cat.Png", 1000).is_err());
    }

    #[test]
    fn test_validate_accepts_file_at_exact_limit() {
        let config = UploadConfig::default();
        assert!(validate(&config, "cat.png", config.max_size_bytes).is_ok());
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("cat.png"), "cat.png");
        assert_eq!(sanitize_file_name("../etc/passwd.png"), ".._etc_passwd.png");
        assert_eq!(sanitize_file_name("my photo.jpg"), "my_photo.jpg");
        assert_eq!(sanitize_file_name("a/b.png"), "a_b.png");
    }

    #[test]
    fn test_content_type_for_extension() {
        assert_eq!(content_type_for_extension("png"), "image/png");
        assert_eq!(content_type_for_extension("jpg"), "image/jpeg");
        assert_eq!(content_type_for_extension("jpeg"), "image/jpeg");
    }

    #[tokio::test]
    async fn test_stage_writes_and_drop_removes() {
        let dir = std::env::temp_dir().join(format!("sightsafe-test-{}", uuid::Uuid::new_v4()));
        let config = test_config(&dir);

        let path = {
            let staged = StagedUpload::stage(&config, "cat.png", b"fake png bytes")
                .await
                .unwrap();
            assert!(staged.path().exists());
            assert!(staged.file_name().ends_with("-cat.png"));
            assert_eq!(staged.content_type(), "image/png");
            assert_eq!(staged.size_bytes(), 14);
            assert_eq!(staged.read().await.unwrap(), b"fake png bytes");
            staged.path().to_path_buf()
        };

        // Guard dropped, staged copy must be gone
        assert!(!path.exists());
        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_stage_rejects_before_touching_disk() {
        let dir = std::env::temp_dir().join(format!("sightsafe-test-{}", uuid::Uuid::new_v4()));
        let config = test_config(&dir);

        let result = StagedUpload::stage(&config, "cat.bmp", b"bmp bytes").await;
        assert!(result.is_err());
        // Rejected uploads never create the staging directory
        assert!(!dir.exists());
    }
}
