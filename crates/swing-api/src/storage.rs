//! Local storage for uploaded swing videos.

use std::path::{Path, PathBuf};

use axum::extract::multipart::Field;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ApiResult;

/// Video container extensions accepted for analysis.
pub const ALLOWED_EXTENSIONS: &[&str] = &[".mp4", ".mov", ".avi", ".webm"];

/// Normalized extension (lowercase, leading dot) of an accepted video
/// filename, or `None` if the type is not accepted.
pub fn video_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?;
    let ext = format!(".{}", ext.to_lowercase());
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Fresh swing identifier, e.g. `swing-1a2b3c4d`.
pub fn new_swing_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("swing-{}", &hex[..8])
}

/// Directory that holds uploaded videos, one file per swing.
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the upload directory if needed.
    pub async fn ensure_dir(&self) -> ApiResult<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    pub fn path_for(&self, swing_id: &str, ext: &str) -> PathBuf {
        self.root.join(format!("{}{}", swing_id, ext))
    }

    /// Stream a multipart field to `{root}/{swing_id}{ext}` and return the
    /// path and byte count. A partial file is removed on failure.
    pub async fn save_field(
        &self,
        swing_id: &str,
        ext: &str,
        field: Field<'_>,
    ) -> ApiResult<(PathBuf, u64)> {
        let path = self.path_for(swing_id, ext);
        self.ensure_dir().await?;

        match write_field(&path, field).await {
            Ok(size) => {
                debug!(path = %path.display(), size, "Saved upload");
                Ok((path, size))
            }
            Err(e) => {
                if let Err(rm) = fs::remove_file(&path).await {
                    warn!(path = %path.display(), "Failed to remove partial upload: {}", rm);
                }
                Err(e)
            }
        }
    }
}

async fn write_field(path: &Path, mut field: Field<'_>) -> ApiResult<u64> {
    let mut file = fs::File::create(path).await?;
    let mut size = 0u64;

    while let Some(chunk) = field.chunk().await? {
        file.write_all(&chunk).await?;
        size += chunk.len() as u64;
    }
    file.flush().await?;

    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_extension() {
        assert_eq!(video_extension("forehand.mp4").as_deref(), Some(".mp4"));
        assert_eq!(video_extension("Serve.MOV").as_deref(), Some(".mov"));
        assert_eq!(video_extension("clip.final.webm").as_deref(), Some(".webm"));
        assert_eq!(video_extension("notes.txt"), None);
        assert_eq!(video_extension("noext"), None);
        assert_eq!(video_extension(""), None);
    }

    #[test]
    fn test_swing_id_format() {
        let id = new_swing_id();
        assert!(id.starts_with("swing-"));
        assert_eq!(id.len(), "swing-".len() + 8);
        assert!(id["swing-".len()..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, new_swing_id());
    }

    #[test]
    fn test_path_for() {
        let store = UploadStore::new("/data/uploads");
        assert_eq!(
            store.path_for("swing-1a2b3c4d", ".mp4"),
            PathBuf::from("/data/uploads/swing-1a2b3c4d.mp4")
        );
    }
}
