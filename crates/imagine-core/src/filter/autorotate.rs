//! `autorotate` filter: bake the EXIF orientation into the pixels.

use image::DynamicImage;

use super::{parse_params, Filter, FilterParams};
use crate::error::FilterError;
use crate::handle::Image;

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct AutorotateParams {}

/// Rotates and flips the image so it displays upright without relying on
/// the viewer honoring EXIF orientation.
#[derive(Debug, Clone, Default)]
pub struct AutorotateFilter;

impl AutorotateFilter {
    pub const NAME: &'static str = "autorotate";

    pub fn new(params: &FilterParams) -> Result<Self, FilterError> {
        let _: AutorotateParams = parse_params(Self::NAME, params)?;
        Ok(Self)
    }
}

/// Apply an EXIF orientation value (1-8) to pixels.
fn orient(pixels: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => pixels.fliph(),
        3 => pixels.rotate180(),
        4 => pixels.flipv(),
        5 => pixels.rotate90().fliph(),
        6 => pixels.rotate90(),
        7 => pixels.rotate270().fliph(),
        8 => pixels.rotate270(),
        _ => pixels,
    }
}

impl Filter for AutorotateFilter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, image: Image) -> Result<Image, FilterError> {
        let orientation = match image.orientation() {
            None | Some(1) => return Ok(image),
            Some(o @ 2..=8) => o,
            Some(other) => {
                tracing::debug!("Ignoring invalid EXIF orientation {other}");
                return Ok(image);
            }
        };
        Ok(image
            .map_pixels(|p| orient(p, orientation))
            .with_orientation(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{params, rgb};
    use image::{GenericImageView, Rgb, RgbImage};

    /// 2x1 image: red on the left, blue on the right.
    fn marked() -> Image {
        let mut buf = RgbImage::new(2, 1);
        buf.put_pixel(0, 0, Rgb([255, 0, 0]));
        buf.put_pixel(1, 0, Rgb([0, 0, 255]));
        Image::new(DynamicImage::ImageRgb8(buf))
    }

    #[test]
    fn test_autorotate_rejects_parameters() {
        assert!(AutorotateFilter::new(&params("angle = 90")).is_err());
        assert!(AutorotateFilter::new(&params("")).is_ok());
    }

    #[test]
    fn test_autorotate_without_orientation_is_identity() {
        let filter = AutorotateFilter;
        assert_eq!(filter.apply(rgb(30, 10)).unwrap().dimensions(), (30, 10));
    }

    #[test]
    fn test_autorotate_quarter_turns_swap_dimensions() {
        let filter = AutorotateFilter;
        for orientation in [5, 6, 7, 8] {
            let out = filter
                .apply(rgb(30, 10).with_orientation(orientation))
                .unwrap();
            assert_eq!(out.dimensions(), (10, 30), "orientation {orientation}");
            assert_eq!(out.orientation(), Some(1));
        }
    }

    #[test]
    fn test_autorotate_mirror_flips_horizontally() {
        let out = AutorotateFilter
            .apply(marked().with_orientation(2))
            .unwrap();
        assert_eq!(out.pixels().get_pixel(0, 0).0[..3], [0, 0, 255]);
    }

    #[test]
    fn test_autorotate_orientation_6_rotates_clockwise() {
        // Left pixel ends on top after a clockwise quarter turn
        let out = AutorotateFilter
            .apply(marked().with_orientation(6))
            .unwrap();
        assert_eq!(out.dimensions(), (1, 2));
        assert_eq!(out.pixels().get_pixel(0, 0).0[..3], [255, 0, 0]);
    }

    #[test]
    fn test_autorotate_ignores_invalid_orientation() {
        let out = AutorotateFilter.apply(rgb(30, 10).with_orientation(42)).unwrap();
        assert_eq!(out.dimensions(), (30, 10));
    }
}
