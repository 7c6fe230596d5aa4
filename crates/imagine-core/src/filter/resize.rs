//! Aspect-preserving resize filters: `downscale`, `upscale` and
//! `relative_resize`.

use serde::Deserialize;

use super::calculations::{fit_within, grow_to, heighten, scale_dimensions, widen};
use super::{
    ensure_non_empty, ensure_output_size, parse_params, positive_pair, Filter, FilterParams,
    MAX_DIMENSION, MAX_SCALE, RESAMPLE,
};
use crate::error::FilterError;
use crate::handle::Image;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DownscaleParams {
    max: Vec<i64>,
}

/// Shrinks images larger than `max = [width, height]` so they fit, keeping
/// the aspect ratio. Smaller images pass through untouched.
#[derive(Debug, Clone)]
pub struct DownscaleFilter {
    max: (u32, u32),
}

impl DownscaleFilter {
    pub const NAME: &'static str = "downscale";

    pub fn new(params: &FilterParams) -> Result<Self, FilterError> {
        let params: DownscaleParams = parse_params(Self::NAME, params)?;
        let max = positive_pair(Self::NAME, "max", &params.max)?;
        Ok(Self { max })
    }

    /// Bounding box as `(width, height)`.
    pub fn max(&self) -> (u32, u32) {
        self.max
    }
}

impl Filter for DownscaleFilter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, image: Image) -> Result<Image, FilterError> {
        ensure_non_empty(Self::NAME, &image)?;
        match fit_within(image.dimensions(), self.max) {
            None => Ok(image),
            Some((w, h)) => Ok(image.map_pixels(|p| p.resize_exact(w, h, RESAMPLE))),
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct UpscaleParams {
    min: Vec<i64>,
}

/// Enlarges images smaller than `min = [width, height]` until both sides
/// reach the minimum, keeping the aspect ratio.
#[derive(Debug, Clone)]
pub struct UpscaleFilter {
    min: (u32, u32),
}

impl UpscaleFilter {
    pub const NAME: &'static str = "upscale";

    pub fn new(params: &FilterParams) -> Result<Self, FilterError> {
        let params: UpscaleParams = parse_params(Self::NAME, params)?;
        let min = positive_pair(Self::NAME, "min", &params.min)?;
        Ok(Self { min })
    }
}

impl Filter for UpscaleFilter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, image: Image) -> Result<Image, FilterError> {
        ensure_non_empty(Self::NAME, &image)?;
        match grow_to(image.dimensions(), self.min) {
            None => Ok(image),
            Some((w, h)) => {
                ensure_output_size(Self::NAME, (w, h))?;
                Ok(image.map_pixels(|p| p.resize_exact(w, h, RESAMPLE)))
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RelativeResizeParams {
    heighten: Option<i64>,
    widen: Option<i64>,
    increase: Option<i64>,
    scale: Option<f64>,
}

/// How `relative_resize` derives the new size from the current one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RelativeResize {
    /// Set the height, width follows
    Heighten(u32),
    /// Set the width, height follows
    Widen(u32),
    /// Add this many pixels to both sides
    Increase(u32),
    /// Multiply both sides
    Scale(f64),
}

/// Resizes relative to the current dimensions.
#[derive(Debug, Clone)]
pub struct RelativeResizeFilter {
    mode: RelativeResize,
}

impl RelativeResizeFilter {
    pub const NAME: &'static str = "relative_resize";

    pub fn new(params: &FilterParams) -> Result<Self, FilterError> {
        let p: RelativeResizeParams = parse_params(Self::NAME, params)?;
        let given = [
            p.heighten.is_some(),
            p.widen.is_some(),
            p.increase.is_some(),
            p.scale.is_some(),
        ]
        .iter()
        .filter(|&&set| set)
        .count();
        if given != 1 {
            return Err(FilterError::config(
                Self::NAME,
                "exactly one of `heighten`, `widen`, `increase` or `scale` is required",
            ));
        }

        let mode = if let Some(v) = p.heighten {
            RelativeResize::Heighten(Self::positive(v, "heighten")?)
        } else if let Some(v) = p.widen {
            RelativeResize::Widen(Self::positive(v, "widen")?)
        } else if let Some(v) = p.increase {
            RelativeResize::Increase(Self::positive(v, "increase")?)
        } else {
            let ratio = p.scale.unwrap_or_default();
            if !ratio.is_finite() || ratio <= 0.0 || ratio > MAX_SCALE {
                return Err(FilterError::config(
                    Self::NAME,
                    format!("`scale` must be in (0, {MAX_SCALE}], got {ratio}"),
                ));
            }
            RelativeResize::Scale(ratio)
        };

        Ok(Self { mode })
    }

    fn positive(value: i64, field: &str) -> Result<u32, FilterError> {
        u32::try_from(value)
            .ok()
            .filter(|&v| v > 0 && v <= MAX_DIMENSION)
            .ok_or_else(|| {
                FilterError::config(
                    Self::NAME,
                    format!(
                        "`{field}` must be an integer in 1..={MAX_DIMENSION}, got {value}"
                    ),
                )
            })
    }

    pub fn mode(&self) -> RelativeResize {
        self.mode
    }
}

impl Filter for RelativeResizeFilter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, image: Image) -> Result<Image, FilterError> {
        ensure_non_empty(Self::NAME, &image)?;
        let dims = image.dimensions();
        let (w, h) = match self.mode {
            RelativeResize::Heighten(target) => heighten(dims, target),
            RelativeResize::Widen(target) => widen(dims, target),
            RelativeResize::Increase(extra) => {
                (dims.0.saturating_add(extra), dims.1.saturating_add(extra))
            }
            RelativeResize::Scale(ratio) => scale_dimensions(dims, ratio),
        };
        if (w, h) == dims {
            return Ok(image);
        }
        ensure_output_size(Self::NAME, (w, h))?;
        Ok(image.map_pixels(|p| p.resize_exact(w, h, RESAMPLE)))
    }
}
