//! `rotate` filter: lossless quarter turns.

use serde::Deserialize;

use super::{parse_params, Filter, FilterParams};
use crate::error::FilterError;
use crate::handle::Image;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RotateParams {
    angle: i64,
}

/// Rotates clockwise by `angle` degrees. Only multiples of 90 are
/// accepted; negative angles rotate counter-clockwise.
#[derive(Debug, Clone)]
pub struct RotateFilter {
    degrees: u32,
}

impl RotateFilter {
    pub const NAME: &'static str = "rotate";

    pub fn new(params: &FilterParams) -> Result<Self, FilterError> {
        let params: RotateParams = parse_params(Self::NAME, params)?;
        let degrees = params.angle.rem_euclid(360);
        if degrees % 90 != 0 {
            return Err(FilterError::config(
                Self::NAME,
                format!("`angle` must be a multiple of 90, got {}", params.angle),
            ));
        }
        Ok(Self {
            degrees: degrees as u32,
        })
    }

    /// Clockwise rotation normalized to 0, 90, 180 or 270.
    pub fn degrees(&self) -> u32 {
        self.degrees
    }
}

impl Filter for RotateFilter {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, image: Image) -> Result<Image, FilterError> {
        Ok(match self.degrees {
            90 => image.map_pixels(|p| p.rotate90()),
            180 => image.map_pixels(|p| p.rotate180()),
            270 => image.map_pixels(|p| p.rotate270()),
            _ => image,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{params, rgb};

    #[test]
    fn test_rotate_normalizes_angle() {
        assert_eq!(RotateFilter::new(&params("angle = -90")).unwrap().degrees(), 270);
        assert_eq!(RotateFilter::new(&params("angle = 450")).unwrap().degrees(), 90);
        assert_eq!(RotateFilter::new(&params("angle = 0")).unwrap().degrees(), 0);
    }

    #[test]
    fn test_rotate_rejects_arbitrary_angles() {
        assert!(RotateFilter::new(&params("angle = 45")).is_err());
        assert!(RotateFilter::new(&params("angle = '90'")).is_err());
        assert!(RotateFilter::new(&params("")).is_err());
    }

    #[test]
    fn test_rotate_quarter_turn_swaps_dimensions() {
        let filter = RotateFilter::new(&params("angle = 90")).unwrap();
        assert_eq!(filter.apply(rgb(30, 10)).unwrap().dimensions(), (10, 30));
        let filter = RotateFilter::new(&params("angle = 180")).unwrap();
        assert_eq!(filter.apply(rgb(30, 10)).unwrap().dimensions(), (30, 10));
    }
}
