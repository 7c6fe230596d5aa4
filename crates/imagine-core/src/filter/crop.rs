//! `crop` filter.

use serde::Deserialize;

use super::{ensure_non_empty, parse_params, positive_pair, Filter, FilterParams};
use crate::error::FilterError;
use crate::handle::Image;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CropParams {
    #[serde(default)]
    start: Vec<i64>,
    size: Vec<i64>,
}

/// Cuts a `size = [w, h]` window starting at `start = [x, y]` (default
/// top-left). The window is clamped to the image.
#[derive(Debug, Clone)]
pub struct CropFilter {
    start: (u32, u32),
    size: (u32, u32),
}

impl CropFilter {
    pub const NAME: &'static str = "crop";

    pub fn new(params: &FilterParams) -> Result<Self, FilterError> {
        let params: CropParams = parse_params(Self::NAME, params)?;
        let size = positive_pair(Self::NAME, "size", &params.size)?;
        let start = match params.start.as_slice() {
            [] => (0, 0),
            [x, y] => match (u32::try_from(*x), u32::try_from(*y)) {
                (Ok(x), Ok(y)) => (x, y),
                _ => {
                    return Err(FilterError::config(
                        Self::NAME,
                        format!("`start` values must be non-negative, got [{x}, {y}]"),
                    ))
                }
            },
            other => {
                return Err(FilterError::config(
                    Self::NAME,
                    format!("`start` must contain exactly 2 values, got {}", other.len()),
                ))
            }
        };
        Ok(Self { start, size })
    }
}

impl Filter for CropFilter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, image: Image) -> Result<Image, FilterError> {
        ensure_non_empty(Self::NAME, &image)?;
        let (width, height) = image.dimensions();
        let (x, y) = self.start;
        if x >= width || y >= height {
            return Err(FilterError::apply(
                Self::NAME,
                format!("start ({x}, {y}) lies outside the {width}x{height} image"),
            ));
        }
        let w = self.size.0.min(width - x);
        let h = self.size.1.min(height - y);
        Ok(image.map_pixels(|p| p.crop_imm(x, y, w, h)))
    }
}
