//! Image uploads for product pictures and profile photos.
//!
//! Images arrive as base64 `data:` URLs (what a browser `FileReader` produces),
//! are written to `UPLOAD_DIR` under a random name and served from `/uploads`.

use std::path::{Path, PathBuf};

use base64::{Engine, engine::general_purpose::STANDARD};
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

/// Largest accepted image after decoding.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// URL prefix the upload directory is mounted at.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Errors from storing an uploaded image.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Invalid image data")]
    InvalidDataUrl,

    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),

    #[error("Image is larger than 5 MB")]
    TooLarge,

    #[error("failed to store image: {0}")]
    Io(#[from] std::io::Error),
}

/// Accepted image types as (mime subtype, file extension).
const IMAGE_TYPES: [(&str, &str); 5] = [
    ("png", "png"),
    ("jpeg", "jpg"),
    ("jpg", "jpg"),
    ("gif", "gif"),
    ("webp", "webp"),
];

/// A decoded `data:image/...;base64,...` URL.
#[derive(Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

impl DecodedImage {
    /// Parse and decode a data URL.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDataUrl` for anything that is not a base64 image data
    /// URL, `UnsupportedType` for image types other than png/jpeg/gif/webp and
    /// `TooLarge` when the decoded image exceeds [`MAX_IMAGE_BYTES`].
    pub fn from_data_url(data_url: &str) -> Result<Self, UploadError> {
        let rest = data_url
            .trim()
            .strip_prefix("data:")
            .ok_or(UploadError::InvalidDataUrl)?;
        let (meta, payload) = rest.split_once(',').ok_or(UploadError::InvalidDataUrl)?;
        let mime = meta
            .strip_suffix(";base64")
            .ok_or(UploadError::InvalidDataUrl)?;
        let subtype = mime
            .strip_prefix("image/")
            .ok_or_else(|| UploadError::UnsupportedType(mime.to_string()))?
            .to_ascii_lowercase();

        let extension = IMAGE_TYPES
            .iter()
            .find(|(t, _)| *t == subtype)
            .map(|(_, ext)| *ext)
            .ok_or(UploadError::UnsupportedType(subtype))?;

        // Reject early: base64 expands by 4/3
        if payload.len() / 4 * 3 > MAX_IMAGE_BYTES + 3 {
            return Err(UploadError::TooLarge);
        }
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|_| UploadError::InvalidDataUrl)?;
        if bytes.is_empty() {
            return Err(UploadError::InvalidDataUrl);
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(UploadError::TooLarge);
        }

        Ok(Self { extension, bytes })
    }
}

/// Writes uploaded images to disk.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory images are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Decode and store a data URL, returning its public URL.
    ///
    /// # Errors
    ///
    /// Returns `UploadError` if the data URL is rejected or the file cannot be written.
    #[instrument(skip(self, data_url), fields(dir = %self.dir.display()))]
    pub async fn save_data_url(&self, data_url: &str) -> Result<String, UploadError> {
        let image = DecodedImage::from_data_url(data_url)?;
        let filename = format!("{}.{}", Uuid::new_v4(), image.extension);

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&filename), &image.bytes).await?;

        info!(file = %filename, bytes = image.bytes.len(), "Stored uploaded image");
        Ok(format!("{PUBLIC_PREFIX}/{filename}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // 1x1 transparent PNG
    const PNG_1X1: &str =
        "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

    #[test]
    fn test_decode_png() {
        let image =
            DecodedImage::from_data_url(&format!("data:image/png;base64,{PNG_1X1}")).unwrap();
        assert_eq!(image.extension, "png");
        assert_eq!(&image.bytes[1..4], b"PNG");
    }

    #[test]
    fn test_jpeg_uses_jpg_extension() {
        let image =
            DecodedImage::from_data_url(&format!("data:image/JPEG;base64,{PNG_1X1}")).unwrap();
        assert_eq!(image.extension, "jpg");
    }

    #[test]
    fn test_rejects_non_images() {
        assert!(matches!(
            DecodedImage::from_data_url("data:text/plain;base64,aGVsbG8="),
            Err(UploadError::UnsupportedType(t)) if t == "text/plain"
        ));
        assert!(matches!(
            DecodedImage::from_data_url("data:image/svg+xml;base64,PHN2Zz4="),
            Err(UploadError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in [
            "",
            "https://example.com/a.png",
            "data:image/png,rawbytes",
            "data:image/png;base64,!!!notbase64",
            "data:image/png;base64,",
        ] {
            assert!(
                matches!(DecodedImage::from_data_url(bad), Err(UploadError::InvalidDataUrl)),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_rejects_oversized() {
        let big = STANDARD.encode(vec![0u8; MAX_IMAGE_BYTES + 1]);
        assert!(matches!(
            DecodedImage::from_data_url(&format!("data:image/png;base64,{big}")),
            Err(UploadError::TooLarge)
        ));
    }

    #[tokio::test]
    async fn test_save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path().join("nested"));

        let url = store
            .save_data_url(&format!("data:image/png;base64,{PNG_1X1}"))
            .await
            .unwrap();
        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with(".png"));

        let filename = url.trim_start_matches("/uploads/");
        let written = std::fs::read(store.dir().join(filename)).unwrap();
        assert_eq!(&written[1..4], b"PNG");
    }
}
