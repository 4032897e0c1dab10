// Image attachments: read a file (or a pasted data URL) into a base64 payload

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;

use crate::error::MediaError;

const FALLBACK_MIME: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub name: String,
    pub mime_type: String,
    pub base64_data: String,
    /// Size of the decoded image in bytes
    pub size: usize,
}

impl ImageAttachment {
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Self {
        let name = name.into();
        let mime_type = detect_mime(&name, bytes);
        Self {
            name,
            mime_type,
            base64_data: STANDARD.encode(bytes),
            size: bytes.len(),
        }
    }

    /// Parse `data:<mime>;base64,<payload>`. The payload is everything after the first comma.
    pub fn from_data_url(url: &str) -> Result<Self, MediaError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| MediaError::DataUrl("missing data: prefix".to_string()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| MediaError::DataUrl("missing comma".to_string()))?;

        let mime_type = header
            .split(';')
            .next()
            .filter(|mime| !mime.is_empty())
            .unwrap_or(FALLBACK_MIME)
            .to_string();

        Ok(Self {
            name: "pasted image".to_string(),
            mime_type,
            base64_data: payload.to_string(),
            size: payload.trim_end_matches('=').len() * 3 / 4,
        })
    }

    /// Human readable summary for the preview line.
    pub fn describe(&self) -> String {
        format!("{} ({}, {})", self.name, self.mime_type, format_size(self.size))
    }
}

/// Read an image from disk and encode it.
pub async fn load_image(path: &Path) -> Result<ImageAttachment, MediaError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| MediaError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

    Ok(ImageAttachment::from_bytes(name, &bytes))
}

/// Resolve whatever the user typed in the image field: a data URL or a file path.
pub async fn resolve_input(input: &str) -> Result<ImageAttachment, MediaError> {
    let input = input.trim();
    if input.starts_with("data:") {
        return ImageAttachment::from_data_url(input);
    }
    load_image(Path::new(input)).await
}

fn detect_mime(name: &str, bytes: &[u8]) -> String {
    if let Some(kind) = infer::get(bytes) {
        return kind.mime_type().to_string();
    }

    let extension = Path::new(name)
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase());

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("heic") => "image/heic",
        Some("heif") => "image/heif",
        _ => FALLBACK_MIME,
    }
    .to_string()
}

#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: usize) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_from_bytes_sniffs_png() {
        let image = ImageAttachment::from_bytes("photo.bin", &PNG_HEADER);
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.base64_data, STANDARD.encode(PNG_HEADER));
        assert_eq!(image.size, 8);
    }

    #[test]
    fn test_from_bytes_falls_back_to_extension() {
        let image = ImageAttachment::from_bytes("diagram.webp", b"not really an image");
        assert_eq!(image.mime_type, "image/webp");

        let unknown = ImageAttachment::from_bytes("notes.txt", b"plain");
        assert_eq!(unknown.mime_type, "application/octet-stream");
    }

    #[test]
    fn test_from_data_url_splits_on_first_comma() {
        let image = ImageAttachment::from_data_url("data:image/jpeg;base64,AAAA,BBBB").unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.base64_data, "AAAA,BBBB");
    }

    #[test]
    fn test_from_data_url_size_ignores_padding() {
        let encoded = STANDARD.encode(PNG_HEADER);
        assert!(encoded.ends_with('='));
        let data_url = format!("data:image/png;base64,{encoded}");
        let image = ImageAttachment::from_data_url(&data_url).unwrap();
        assert_eq!(image.size, PNG_HEADER.len());
    }

    #[test]
    fn test_from_data_url_rejects_garbage() {
        assert!(ImageAttachment::from_data_url("image/png;base64").is_err());
        assert!(ImageAttachment::from_data_url("data:image/png;base64").is_err());
    }

    #[tokio::test]
    async fn test_load_image_from_disk() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&PNG_HEADER).unwrap();

        let image = load_image(file.path()).await.unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.size, PNG_HEADER.len());
        assert!(!image.name.is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_image_reports_path() {
        let err = resolve_input("/definitely/not/here.png").await.unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.png"));
    }

    #[test]
    fn test_describe() {
        let image = ImageAttachment::from_bytes("cat.png", &[b'x'; 2048]);
        assert_eq!(image.describe(), "cat.png (image/png, 2.0 KB)");
    }
}
