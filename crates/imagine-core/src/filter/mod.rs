//! Image filters: named, parameterized, pure image transforms.
//!
//! Every filter is built once from a parameter table and validates it up
//! front, so a bad configuration is reported at startup instead of on the
//! first request. After construction a filter is immutable and can be
//! applied concurrently from any number of requests.
//!
//! | Type | Parameters |
//! |---|---|
//! | `autorotate` | none |
//! | `crop` | `start = [x, y]`, `size = [w, h]` |
//! | `downscale` | `max = [w, h]` |
//! | `relative_resize` | one of `heighten`, `widen`, `increase`, `scale` |
//! | `rotate` | `angle` (multiple of 90) |
//! | `thumbnail` | `size = [w, h]`, `mode = "inset" \| "outbound"` |
//! | `upscale` | `min = [w, h]` |

mod autorotate;
mod calculations;
mod crop;
mod registry;
mod resize;
mod rotate;
mod thumbnail;

pub use autorotate::AutorotateFilter;
pub use crop::CropFilter;
pub use registry::{FilterConstructor, FilterRegistry};
pub use resize::{DownscaleFilter, RelativeResize, RelativeResizeFilter, UpscaleFilter};
pub use rotate::RotateFilter;
pub use thumbnail::{ThumbnailFilter, ThumbnailMode};

use image::imageops::FilterType;
use serde::de::DeserializeOwned;

use crate::error::FilterError;
use crate::handle::Image;

/// Raw filter parameters as written in the configuration file.
pub type FilterParams = toml::Table;

/// Resampling filter used by every resizing operation.
pub(crate) const RESAMPLE: FilterType = FilterType::Lanczos3;

/// Largest width or height a filter may be configured with or produce.
pub const MAX_DIMENSION: u32 = 16_384;

/// Largest factor accepted by `relative_resize.scale`.
pub const MAX_SCALE: f64 = 16.0;

/// A configured image transform.
pub trait Filter: Send + Sync + std::fmt::Debug {
    /// Registered type name, used in logs and error messages.
    fn name(&self) -> &str;

    /// Transform one image into another.
    fn apply(&self, image: Image) -> Result<Image, FilterError>;
}

/// Deserialize a parameter table into a filter's typed parameters.
pub(crate) fn parse_params<T: DeserializeOwned>(
    filter: &str,
    params: &FilterParams,
) -> Result<T, FilterError> {
    toml::Value::Table(params.clone())
        .try_into()
        .map_err(|e: toml::de::Error| FilterError::config(filter, e.message().trim()))
}

/// Validate a `[width, height]` pair of positive integers.
pub(crate) fn positive_pair(
    filter: &str,
    field: &str,
    values: &[i64],
) -> Result<(u32, u32), FilterError> {
    if values.len() != 2 {
        return Err(FilterError::config(
            filter,
            format!(
                "`{field}` must contain exactly 2 values, got {}",
                values.len()
            ),
        ));
    }
    let to_u32 = |v: i64| u32::try_from(v).ok().filter(|&v| v > 0);
    match (to_u32(values[0]), to_u32(values[1])) {
        (Some(w), Some(h)) if w <= MAX_DIMENSION && h <= MAX_DIMENSION => Ok((w, h)),
        (Some(_), Some(_)) => Err(FilterError::config(
            filter,
            format!("`{field}` values must not exceed {MAX_DIMENSION}, got {values:?}"),
        )),
        _ => Err(FilterError::config(
            filter,
            format!("`{field}` values must be positive integers, got {values:?}"),
        )),
    }
}

/// Reject a resize whose result would exceed [`MAX_DIMENSION`].
pub(crate) fn ensure_output_size(
    filter: &str,
    (width, height): (u32, u32),
) -> Result<(), FilterError> {
    if width > MAX_DIMENSION || height > MAX_DIMENSION {
        return Err(FilterError::apply(
            filter,
            format!("output {width}x{height} exceeds the {MAX_DIMENSION}px limit"),
        ));
    }
    Ok(())
}

/// Reject images a filter cannot meaningfully process.
pub(crate) fn ensure_non_empty(filter: &str, image: &Image) -> Result<(), FilterError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(FilterError::invalid_input(
            filter,
            format!("image has no pixels ({width}x{height})"),
        ));
    }
    Ok(())
}
