//! Image normalization: resize, re-encode as JPEG, bound the payload size.
//!
//! Vision endpoints reject oversized inline images, so every uploaded photo is
//! capped at 800 px per side, re-encoded at JPEG quality 85 and checked
//! against a 4 MiB limit before it is base64-encoded for transport.

use std::fmt;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, RgbImage};
use iris_ai::Content;

use crate::error::{Error, Result};

/// Longest side, in pixels, of a normalized image
pub const MAX_DIMENSION: u32 = 800;

/// JPEG quality used for re-encoding
pub const JPEG_QUALITY: u8 = 85;

/// Upper bound on the encoded JPEG size (4 MiB)
pub const MAX_ENCODED_BYTES: usize = 4 * 1024 * 1024;

/// Upload formats the assistant accepts
pub const ALLOWED_FORMATS: &[ImageFormat] = &[ImageFormat::Png, ImageFormat::Jpeg];

/// MIME type of every normalized payload
pub const PAYLOAD_MIME_TYPE: &str = "image/jpeg";

/// An uploaded image as received from the host: raw bytes plus a display name.
///
/// Cloning is cheap; the bytes are shared. Only the container format is
/// sniffed on construction, full decoding happens during normalization.
#[derive(Clone)]
pub struct SourceImage {
    name: String,
    format: ImageFormat,
    bytes: Arc<[u8]>,
}

impl SourceImage {
    /// Wrap uploaded bytes, rejecting anything that is not PNG or JPEG.
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes: Vec<u8> = bytes.into();
        let format = ImageReader::new(Cursor::new(&bytes))
            .with_guessed_format()?
            .format()
            .ok_or_else(|| Error::UnsupportedFormat("unrecognized image data".to_string()))?;

        if !ALLOWED_FORMATS.contains(&format) {
            return Err(Error::UnsupportedFormat(format!("{:?}", format)));
        }

        Ok(Self {
            name: name.into(),
            format,
            bytes: bytes.into(),
        })
    }

    /// Read an image file from disk
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_bytes(name, bytes)
    }

    /// Display name (usually the file name)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sniffed container format
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Raw uploaded bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Size of the upload in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Whether two handles refer to the same upload
    pub fn same_upload(&self, other: &SourceImage) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

impl fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceImage")
            .field("name", &self.name)
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A normalized, transport-ready JPEG
#[derive(Clone, PartialEq, Eq)]
pub struct EncodedPayload {
    bytes: Vec<u8>,
    base64: String,
    width: u32,
    height: u32,
}

impl EncodedPayload {
    /// JPEG bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Base64 of the JPEG bytes (standard alphabet, no line wrapping)
    pub fn base64(&self) -> &str {
        &self.base64
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `data:image/jpeg;base64,...` URL
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", PAYLOAD_MIME_TYPE, self.base64)
    }

    /// Image content part for an inference request
    pub fn to_content(&self) -> Content {
        Content::image(self.base64.clone(), PAYLOAD_MIME_TYPE)
    }
}

impl fmt::Debug for EncodedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncodedPayload")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// Normalization limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    /// Longest allowed side in pixels
    pub max_dimension: u32,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Maximum encoded size in bytes
    pub max_bytes: usize,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            max_dimension: MAX_DIMENSION,
            jpeg_quality: JPEG_QUALITY,
            max_bytes: MAX_ENCODED_BYTES,
        }
    }
}

/// Converts uploaded images into bounded JPEG payloads
#[derive(Debug, Clone, Default)]
pub struct ImageNormalizer {
    options: NormalizeOptions,
}

impl ImageNormalizer {
    pub fn new(options: NormalizeOptions) -> Self {
        Self { options }
    }

    /// Normalize an uploaded image
    pub fn normalize(&self, image: &SourceImage) -> Result<EncodedPayload> {
        self.normalize_bytes(image.bytes())
    }

    /// Decode arbitrary image bytes and normalize them
    pub fn normalize_bytes(&self, bytes: &[u8]) -> Result<EncodedPayload> {
        let decoded = image::load_from_memory(bytes).map_err(Error::Decode)?;
        self.normalize_image(&decoded)
    }

    /// Normalize an already decoded raster.
    ///
    /// Downscales (never upscales) so both sides fit `max_dimension`, encodes a
    /// single JPEG pass at `jpeg_quality` and fails if the result is larger
    /// than `max_bytes`. No lower-quality retry is attempted.
    pub fn normalize_image(&self, image: &DynamicImage) -> Result<EncodedPayload> {
        let max = self.options.max_dimension.max(1);
        let (src_w, src_h) = (image.width(), image.height());

        let resized;
        let image = if src_w > max || src_h > max {
            resized = image.resize(max, max, FilterType::Lanczos3);
            &resized
        } else {
            image
        };

        let rgb = flatten_to_rgb(image);
        let (width, height) = rgb.dimensions();

        let mut bytes = Vec::new();
        JpegEncoder::new_with_quality(&mut bytes, self.options.jpeg_quality)
            .encode_image(&rgb)
            .map_err(Error::Encode)?;

        tracing::debug!(
            src_w,
            src_h,
            width,
            height,
            encoded = bytes.len(),
            "normalized image"
        );

        if bytes.len() > self.options.max_bytes {
            return Err(Error::EncodingTooLarge {
                size: bytes.len(),
                limit: self.options.max_bytes,
            });
        }

        let base64 = BASE64.encode(&bytes);
        Ok(EncodedPayload {
            bytes,
            base64,
            width,
            height,
        })
    }
}

/// Normalize with the default limits (800 px, quality 85, 4 MiB)
pub fn normalize(image: &SourceImage) -> Result<EncodedPayload> {
    ImageNormalizer::default().normalize(image)
}

/// JPEG carries no alpha: composite transparent pixels over white.
fn flatten_to_rgb(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let pixel = rgba.get_pixel(x, y);
        let alpha = u16::from(pixel[3]);
        let blend = |channel: u8| -> u8 {
            ((u16::from(channel) * alpha + 255 * (255 - alpha)) / 255) as u8
        };
        image::Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])])
    })
}

/// Encode a synthetic eye-ish gradient as an upload, for tests.
#[cfg(test)]
pub(crate) fn png_fixture(width: u32, height: u32) -> SourceImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Png)
        .expect("encode png fixture");
    SourceImage::from_bytes(format!("eye_{}x{}.png", width, height), buf.into_inner())
        .expect("png fixture is a valid upload")
}
