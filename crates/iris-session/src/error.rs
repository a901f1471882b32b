//! Error types for iris-session

use thiserror::Error;

/// Result type alias using iris-session Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to the host by the normalizer and the session
#[derive(Error, Debug)]
pub enum Error {
    /// Reading an image file failed
    #[error("Failed to read image: {0}")]
    Io(#[from] std::io::Error),

    /// The bytes are not a decodable raster image
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// Recognized image, but not a format the assistant accepts
    #[error("Unsupported image format: {0}. Allowed: PNG, JPEG")]
    UnsupportedFormat(String),

    /// JPEG re-encoding failed
    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    /// Re-encoded payload is still over the transport limit
    #[error("Image size exceeds {} MB limit after compression ({size} bytes)", limit / (1024 * 1024))]
    EncodingTooLarge { size: usize, limit: usize },

    /// A query was submitted with no image loaded
    #[error("Please upload an eye image first!")]
    NoImage,

    /// A query with no text
    #[error("Query is empty")]
    EmptyQuery,

    /// The inference service failed (only surfaced outside a session turn)
    #[error(transparent)]
    Inference(#[from] iris_ai::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_large_message() {
        let e = Error::EncodingTooLarge {
            size: 5 * 1024 * 1024,
            limit: 4 * 1024 * 1024,
        };
        assert_eq!(
            e.to_string(),
            "Image size exceeds 4 MB limit after compression (5242880 bytes)"
        );
    }

    #[test]
    fn test_no_image_message() {
        assert_eq!(Error::NoImage.to_string(), "Please upload an eye image first!");
    }
}
