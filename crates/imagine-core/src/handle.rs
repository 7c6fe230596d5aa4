//! Decoded image handle passed through filter chains.
//!
//! Wraps an `image::DynamicImage` together with the two pieces of source
//! information the pixels alone lose: the container format (used to pick an
//! output encoding) and the EXIF orientation (used by `autorotate`).

use exif::{In, Reader, Tag, Value};
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;
use std::path::Path;

use crate::error::StorageError;

/// A decoded image plus the source metadata filters care about.
#[derive(Debug, Clone)]
pub struct Image {
    pixels: DynamicImage,
    format: Option<ImageFormat>,
    orientation: Option<u32>,
}

impl Image {
    /// Wrap already-decoded pixels with no source metadata.
    pub fn new(pixels: DynamicImage) -> Self {
        Self {
            pixels,
            format: None,
            orientation: None,
        }
    }

    /// Attach a source format.
    pub fn with_format(mut self, format: ImageFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Attach an EXIF orientation value (1-8).
    pub fn with_orientation(mut self, orientation: u32) -> Self {
        self.orientation = Some(orientation);
        self
    }

    /// Decode raw bytes into an image.
    ///
    /// The format is sniffed from the content first and falls back to the
    /// key's extension. Bytes that are not a recognised image fail with
    /// [`StorageError::Decode`].
    pub fn decode(bytes: &[u8], key: &str) -> Result<Self, StorageError> {
        let mut reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| StorageError::Decode {
                key: key.to_string(),
                message: format!("Cannot detect image format: {}", e),
            })?;
        let format = match reader.format() {
            Some(f) => f,
            None => {
                let f = ImageFormat::from_path(key).map_err(|_| StorageError::Decode {
                    key: key.to_string(),
                    message: "Unrecognized image format".to_string(),
                })?;
                reader.set_format(f);
                f
            }
        };
        let pixels = reader.decode().map_err(|e| StorageError::Decode {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            pixels,
            format: Some(format),
            orientation: read_orientation(bytes),
        })
    }

    /// Encode the image for storage under `key`.
    ///
    /// The output format follows the key's extension when it names a
    /// writable format, then the source format, then PNG.
    pub fn encode(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let format = self.output_format(key);
        let mut buffer = Cursor::new(Vec::new());

        let result = if format == ImageFormat::Jpeg && !is_jpeg_compatible(&self.pixels) {
            DynamicImage::ImageRgb8(self.pixels.to_rgb8()).write_to(&mut buffer, format)
        } else {
            self.pixels.write_to(&mut buffer, format)
        };
        result.map_err(|e| StorageError::Encode {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        Ok(buffer.into_inner())
    }

    /// The format `encode` will use for `key`.
    pub fn output_format(&self, key: &str) -> ImageFormat {
        ImageFormat::from_path(Path::new(key))
            .ok()
            .filter(|f| f.writing_enabled())
            .or(self.format.filter(|f| f.writing_enabled()))
            .unwrap_or(ImageFormat::Png)
    }

    /// Replace the pixels, keeping the source metadata.
    pub fn map_pixels(self, f: impl FnOnce(DynamicImage) -> DynamicImage) -> Self {
        Self {
            pixels: f(self.pixels),
            ..self
        }
    }

    pub fn pixels(&self) -> &DynamicImage {
        &self.pixels
    }

    pub fn into_pixels(self) -> DynamicImage {
        self.pixels
    }

    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    pub fn orientation(&self) -> Option<u32> {
        self.orientation
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}

/// Read the EXIF orientation tag, if the container carries one.
fn read_orientation(bytes: &[u8]) -> Option<u32> {
    let exif = Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()?;
    exif.get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|f| match &f.value {
            Value::Short(v) => v.first().map(|&x| x as u32),
            Value::Long(v) => v.first().copied(),
            _ => None,
        })
}

fn is_jpeg_compatible(pixels: &DynamicImage) -> bool {
    matches!(pixels, DynamicImage::ImageRgb8(_) | DynamicImage::ImageLuma8(_))
}
