//! Logo asset loading and preparation.
//!
//! The logo is fetched fresh for every render, bounded to a small pixel size,
//! flattened onto white and re-encoded as JPEG before it is embedded. Any
//! failure here is recoverable: callers render without the logo.

use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbImage};
use std::path::PathBuf;
use thiserror::Error;

/// Longest side of the embedded logo, in pixels.
pub const LOGO_MAX_PX: u32 = 300;
pub const LOGO_JPEG_QUALITY: u8 = 80;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to fetch logo: {0}")]
    Fetch(#[source] reqwest::Error),
    #[error("logo request returned HTTP {0}")]
    Status(u16),
    #[error("failed to read logo file: {0}")]
    Read(#[source] std::io::Error),
    #[error("failed to decode logo: {0}")]
    Decode(#[source] image::ImageError),
    #[error("failed to re-encode logo: {0}")]
    Encode(#[source] image::ImageError),
}

/// Source of the raw logo bytes.
#[async_trait]
pub trait AssetSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<u8>, AssetError>;

    /// Where the asset comes from, for log lines.
    fn describe(&self) -> String;
}

pub struct HttpAssetSource {
    client: reqwest::Client,
    url: String,
}

impl HttpAssetSource {
    pub fn new(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl AssetSource for HttpAssetSource {
    async fn fetch(&self) -> Result<Vec<u8>, AssetError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(AssetError::Fetch)?;

        if !response.status().is_success() {
            return Err(AssetError::Status(response.status().as_u16()));
        }

        let bytes = response.bytes().await.map_err(AssetError::Fetch)?;
        Ok(bytes.to_vec())
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

pub struct FileAssetSource {
    path: PathBuf,
}

impl FileAssetSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl AssetSource for FileAssetSource {
    async fn fetch(&self) -> Result<Vec<u8>, AssetError> {
        tokio::fs::read(&self.path).await.map_err(AssetError::Read)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Logo ready for embedding: baseline JPEG bytes, placed in the PDF as-is.
#[derive(Clone)]
pub struct PreparedLogo {
    width_px: u32,
    height_px: u32,
    pub jpeg: Vec<u8>,
}

impl std::fmt::Debug for PreparedLogo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedLogo")
            .field("width_px", &self.width_px())
            .field("height_px", &self.height_px())
            .field("jpeg_bytes", &self.jpeg.len())
            .finish()
    }
}

impl PreparedLogo {
    pub fn prepare(bytes: &[u8]) -> Result<Self, AssetError> {
        let decoded = image::load_from_memory(bytes).map_err(AssetError::Decode)?;

        let (width, height) = decoded.dimensions();
        let bounded = if width > LOGO_MAX_PX || height > LOGO_MAX_PX {
            decoded.resize(LOGO_MAX_PX, LOGO_MAX_PX, FilterType::Lanczos3)
        } else {
            decoded
        };

        let flat = flatten_on_white(&bounded);

        let mut jpeg = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, LOGO_JPEG_QUALITY);
            encoder.encode_image(&flat).map_err(AssetError::Encode)?;
        }

        Ok(Self {
            width_px: flat.width(),
            height_px: flat.height(),
            jpeg,
        })
    }

    pub fn width_px(&self) -> u32 {
        self.width_px
    }

    pub fn height_px(&self) -> u32 {
        self.height_px
    }

    /// Height over width.
    pub fn aspect_ratio(&self) -> f32 {
        self.height_px() as f32 / self.width_px().max(1) as f32
    }
}

/// Composite every pixel over opaque white.
pub fn flatten_on_white(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let px = rgba.get_pixel(x, y);
        let alpha = u16::from(px[3]);
        let blend = |c: u8| -> u8 { ((u16::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8 };
        image::Rgb([blend(px[0]), blend(px[1]), blend(px[2])])
    })
}

/// Fetch and prepare, logging and swallowing any failure.
pub async fn load_logo(source: &dyn AssetSource) -> Option<Vec<u8>> {
    match source.fetch().await {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            log::warn!(
                "Logo from {} unavailable, rendering without it: {}",
                source.describe(),
                e
            );
            None
        }
    }
}

/// Decode fetched bytes, logging and swallowing any failure.
pub fn prepare_or_skip(bytes: Option<&[u8]>) -> Option<PreparedLogo> {
    let bytes = bytes?;
    match PreparedLogo::prepare(bytes) {
        Ok(logo) => Some(logo),
        Err(e) => {
            log::warn!("Logo could not be prepared, rendering without it: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(img: RgbaImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_large_logo_is_bounded_keeping_aspect() {
        let bytes = png_bytes(RgbaImage::from_pixel(1200, 600, Rgba([10, 20, 30, 255])));
        let logo = PreparedLogo::prepare(&bytes).unwrap();

        assert_eq!(logo.width_px(), LOGO_MAX_PX);
        assert_eq!(logo.height_px(), 150);
        assert!((logo.aspect_ratio() - 0.5).abs() < 0.01);
        assert!(logo.jpeg.starts_with(&[0xFF, 0xD8]));
    }

    #[test]
    fn test_small_logo_is_not_upscaled() {
        let bytes = png_bytes(RgbaImage::from_pixel(40, 20, Rgba([0, 0, 0, 255])));
        let logo = PreparedLogo::prepare(&bytes).unwrap();
        assert_eq!((logo.width_px(), logo.height_px()), (40, 20));
    }

    #[test]
    fn test_transparency_flattens_to_white() {
        let transparent = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 0])));
        let flat = flatten_on_white(&transparent);
        assert_eq!(flat.get_pixel(0, 0).0, [255, 255, 255]);

        let opaque = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([200, 0, 0, 255])));
        assert_eq!(flatten_on_white(&opaque).get_pixel(3, 3).0, [200, 0, 0]);
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        let err = PreparedLogo::prepare(b"not an image").unwrap_err();
        assert!(matches!(err, AssetError::Decode(_)));
        assert!(prepare_or_skip(Some(b"not an image")).is_none());
    }

    #[tokio::test]
    async fn test_missing_file_is_skipped() {
        let source = FileAssetSource::new(PathBuf::from("/nonexistent/logo.png"));
        assert!(matches!(source.fetch().await, Err(AssetError::Read(_))));
        assert!(load_logo(&source).await.is_none());
    }
}
