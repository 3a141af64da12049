//! Thumbnail generation and image key naming.

use std::io::Cursor;

use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use tracing::warn;
use uuid::Uuid;

/// Key of the thumbnail stored next to `blob_id`.
pub fn thumbnail_key(blob_id: &str, percent: u32) -> String {
    format!("{}_thumb{}", blob_id, percent)
}

/// Fresh object key for an upload, keeping a recognisable extension.
pub fn new_blob_id(content_type: &str) -> String {
    format!("{}{}", Uuid::new_v4(), extension_for(content_type))
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => ".jpg",
        "image/png" => ".png",
        "image/webp" => ".webp",
        "image/gif" => ".gif",
        "image/heic" => ".heic",
        "image/heif" => ".heif",
        "image/bmp" => ".bmp",
        _ => "",
    }
}

/// The declared content type when it names an image, otherwise whatever the
/// magic bytes say, otherwise `application/octet-stream`.
pub fn resolve_content_type(declared: Option<&str>, bytes: &[u8]) -> String {
    if let Some(declared) = declared.map(str::trim).filter(|ct| ct.starts_with("image/")) {
        return declared.to_string();
    }
    image::guess_format(bytes)
        .ok()
        .and_then(mime_for)
        .unwrap_or("application/octet-stream")
        .to_string()
}

fn mime_for(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("image/png"),
        ImageFormat::Jpeg => Some("image/jpeg"),
        ImageFormat::Gif => Some("image/gif"),
        ImageFormat::WebP => Some("image/webp"),
        ImageFormat::Bmp => Some("image/bmp"),
        ImageFormat::Tiff => Some("image/tiff"),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub bytes: Bytes,
    pub content_type: String,
    /// False when the original bytes are stored as-is
    pub resized: bool,
}

impl Thumbnail {
    fn passthrough(original: Bytes, content_type: &str) -> Self {
        Self {
            bytes: original,
            content_type: content_type.to_string(),
            resized: false,
        }
    }
}

/// Scale `original` to `percent` of its dimensions on the blocking pool.
///
/// Never fails: undecodable input is returned unchanged so the thumbnail key
/// always resolves.
pub async fn make_thumbnail(original: Bytes, content_type: String, percent: u32) -> Thumbnail {
    let fallback = original.clone();
    match tokio::task::spawn_blocking(move || scale(original, &content_type, percent)).await {
        Ok(thumbnail) => thumbnail,
        Err(e) => {
            warn!(error = %e, "Thumbnail task failed, keeping original bytes");
            Thumbnail::passthrough(fallback, "application/octet-stream")
        }
    }
}

fn scale(original: Bytes, content_type: &str, percent: u32) -> Thumbnail {
    let source = match image::load_from_memory(&original) {
        Ok(img) => img,
        Err(e) => {
            warn!(error = %e, content_type, "Cannot decode image, storing original as thumbnail");
            return Thumbnail::passthrough(original, content_type);
        }
    };

    let (width, height) = source.dimensions();
    let target_w = scaled(width, percent);
    let target_h = scaled(height, percent);
    let resized = source.resize_exact(target_w, target_h, FilterType::Triangle);

    let format = image::guess_format(&original)
        .ok()
        .filter(|f| {
            matches!(
                f,
                ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::Gif | ImageFormat::Bmp
            )
        })
        .unwrap_or(ImageFormat::Png);

    match encode(resized, format) {
        Ok(bytes) => Thumbnail {
            bytes,
            content_type: mime_for(format).unwrap_or("image/png").to_string(),
            resized: true,
        },
        Err(e) => {
            warn!(error = %e, ?format, "Cannot encode thumbnail, storing original");
            Thumbnail::passthrough(original, content_type)
        }
    }
}

fn scaled(side: u32, percent: u32) -> u32 {
    ((u64::from(side) * u64::from(percent)) / 100).max(1) as u32
}

fn encode(img: DynamicImage, format: ImageFormat) -> image::ImageResult<Bytes> {
    // JPEG has no alpha channel.
    let img = match format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
        _ => img,
    };
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), format)?;
    Ok(Bytes::from(buffer))
}
