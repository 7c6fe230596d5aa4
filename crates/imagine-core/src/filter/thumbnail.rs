//! `thumbnail` filter: fit inside a box, or fill it and crop.

use serde::Deserialize;

use super::calculations::{center_offset, cover, fit_within};
use super::{
    ensure_non_empty, ensure_output_size, parse_params, positive_pair, Filter, FilterParams,
    RESAMPLE,
};
use crate::error::FilterError;
use crate::handle::Image;

/// How a thumbnail relates to its box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailMode {
    /// Fit entirely inside the box; never upscale
    #[default]
    Inset,
    /// Cover the box, then center-crop to exactly its size
    Outbound,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ThumbnailParams {
    size: Vec<i64>,
    #[serde(default)]
    mode: ThumbnailMode,
}

#[derive(Debug, Clone)]
pub struct ThumbnailFilter {
    size: (u32, u32),
    mode: ThumbnailMode,
}

impl ThumbnailFilter {
    pub const NAME: &'static str = "thumbnail";

    pub fn new(params: &FilterParams) -> Result<Self, FilterError> {
        let params: ThumbnailParams = parse_params(Self::NAME, params)?;
        let size = positive_pair(Self::NAME, "size", &params.size)?;
        Ok(Self {
            size,
            mode: params.mode,
        })
    }

    pub fn mode(&self) -> ThumbnailMode {
        self.mode
    }
}

impl Filter for ThumbnailFilter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, image: Image) -> Result<Image, FilterError> {
        ensure_non_empty(Self::NAME, &image)?;
        let dims = image.dimensions();
        match self.mode {
            ThumbnailMode::Inset => match fit_within(dims, self.size) {
                None => Ok(image),
                Some((w, h)) => Ok(image.map_pixels(|p| p.resize_exact(w, h, RESAMPLE))),
            },
            ThumbnailMode::Outbound => {
                let scaled = cover(dims, self.size);
                ensure_output_size(Self::NAME, scaled)?;
                let (x, y) = center_offset(scaled, self.size);
                let (w, h) = self.size;
                Ok(image.map_pixels(|p| {
                    let p = if scaled == dims {
                        p
                    } else {
                        p.resize_exact(scaled.0, scaled.1, RESAMPLE)
                    };
                    p.crop_imm(x, y, w, h)
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{params, rgb};

    #[test]
    fn test_thumbnail_defaults_to_inset() {
        let filter = ThumbnailFilter::new(&params("size = [100, 100]")).unwrap();
        assert_eq!(filter.mode(), ThumbnailMode::Inset);
    }

    #[test]
    fn test_thumbnail_inset_fits_inside_box() {
        let filter = ThumbnailFilter::new(&params("size = [100, 100]")).unwrap();
        assert_eq!(filter.apply(rgb(400, 200)).unwrap().dimensions(), (100, 50));
    }

    #[test]
    fn test_thumbnail_inset_does_not_upscale() {
        let filter = ThumbnailFilter::new(&params("size = [100, 100]")).unwrap();
        assert_eq!(filter.apply(rgb(40, 20)).unwrap().dimensions(), (40, 20));
    }

    #[test]
    fn test_thumbnail_outbound_fills_box_exactly() {
        let filter =
            ThumbnailFilter::new(&params("size = [100, 100]\nmode = 'outbound'")).unwrap();
        assert_eq!(filter.apply(rgb(400, 200)).unwrap().dimensions(), (100, 100));
        assert_eq!(filter.apply(rgb(30, 60)).unwrap().dimensions(), (100, 100));
    }

    #[test]
    fn test_thumbnail_rejects_unknown_mode() {
        let err = ThumbnailFilter::new(&params("size = [10, 10]\nmode = 'stretch'")).unwrap_err();
        assert!(matches!(err, FilterError::Config { .. }));
    }

    #[test]
    fn test_thumbnail_rejects_bad_size() {
        assert!(ThumbnailFilter::new(&params("size = [10]")).is_err());
        assert!(ThumbnailFilter::new(&params("mode = 'inset'")).is_err());
        assert!(ThumbnailFilter::new(&params("size = [20000, 10]")).is_err());
    }

    #[test]
    fn test_thumbnail_outbound_refuses_oversized_intermediate() {
        let filter =
            ThumbnailFilter::new(&params("size = [16384, 16384]\nmode = 'outbound'")).unwrap();
        let err = filter.apply(rgb(1, 50)).unwrap_err();
        assert!(matches!(err, FilterError::Apply { .. }), "{err}");
    }
}
