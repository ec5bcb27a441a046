use anyhow::Context;
use async_trait::async_trait;
use std::io::Cursor;
use std::path::PathBuf;

/// JPEG quality used for captured stills.
const STILL_JPEG_QUALITY: u8 = 80;

/// On-demand still capture.
#[async_trait]
pub trait Camera: Send + Sync {
    /// Capture one frame as JPEG bytes.
    async fn capture_still(&self) -> anyhow::Result<Vec<u8>>;
}

/// Camera whose "frame" is an image file on disk.
///
/// Any format the `image` crate decodes (PNG, JPEG) is accepted and
/// re-encoded as JPEG, as a browser canvas export would.
pub struct FileCamera {
    path: PathBuf,
}

impl FileCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Camera for FileCamera {
    async fn capture_still(&self) -> anyhow::Result<Vec<u8>> {
        let raw = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Camera unavailable: {}", self.path.display()))?;
        let jpeg = tokio::task::spawn_blocking(move || encode_jpeg(&raw)).await??;
        tracing::debug!(bytes = jpeg.len(), "Captured still");
        Ok(jpeg)
    }
}

/// Decode any supported image and re-encode it as RGB JPEG.
pub fn encode_jpeg(raw: &[u8]) -> anyhow::Result<Vec<u8>> {
    let decoded = image::load_from_memory(raw).context("Unsupported image data")?;
    let rgb = decoded.to_rgb8();
    let mut out = Cursor::new(Vec::new());
    let encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, STILL_JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .context("Failed to encode JPEG")?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_png() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(4, 4, image::Rgba([200, 30, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn png_is_reencoded_as_jpeg() {
        let jpeg = encode_jpeg(&tiny_png()).unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(encode_jpeg(b"definitely not an image").is_err());
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let camera = FileCamera::new(dir.path().join("missing.png"));
        assert!(camera.capture_still().await.is_err());
    }

    #[tokio::test]
    async fn file_camera_captures_jpeg() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("shrine.png");
        std::fs::write(&path, tiny_png()).unwrap();
        let jpeg = FileCamera::new(&path).capture_still().await.unwrap();
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    }
}
