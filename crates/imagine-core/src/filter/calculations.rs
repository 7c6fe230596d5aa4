//! Pure dimension math for the resizing filters.
//!
//! Kept free of pixel work so the sizing rules can be tested exhaustively
//! without decoding or resampling anything.

/// Scale both sides by `factor`, rounding to the nearest pixel (min 1).
pub(crate) fn scale_dimensions((width, height): (u32, u32), factor: f64) -> (u32, u32) {
    (scale_side(width, factor), scale_side(height, factor))
}

fn scale_side(side: u32, factor: f64) -> u32 {
    let scaled = (side as f64 * factor).round();
    if scaled < 1.0 {
        1
    } else if scaled > u32::MAX as f64 {
        u32::MAX
    } else {
        scaled as u32
    }
}

/// Dimensions that fit inside `bounds` while preserving aspect ratio.
///
/// Returns `None` when the image already fits (no upscaling).
pub(crate) fn fit_within(dims: (u32, u32), bounds: (u32, u32)) -> Option<(u32, u32)> {
    let (width, height) = dims;
    let (max_width, max_height) = bounds;
    let factor = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    );
    if factor >= 1.0 {
        return None;
    }
    let (w, h) = scale_dimensions(dims, factor);
    Some((w.min(max_width), h.min(max_height)))
}

/// Dimensions that reach at least `bounds` on both sides while preserving
/// aspect ratio.
///
/// Returns `None` when the image is already large enough (no downscaling).
pub(crate) fn grow_to(dims: (u32, u32), bounds: (u32, u32)) -> Option<(u32, u32)> {
    let factor = cover_factor(dims, bounds);
    if factor <= 1.0 {
        return None;
    }
    let (w, h) = scale_dimensions(dims, factor);
    Some((w.max(bounds.0), h.max(bounds.1)))
}

/// Dimensions that cover `bounds` on both sides, up or down.
pub(crate) fn cover(dims: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (w, h) = scale_dimensions(dims, cover_factor(dims, bounds));
    (w.max(bounds.0), h.max(bounds.1))
}

fn cover_factor((width, height): (u32, u32), (min_width, min_height): (u32, u32)) -> f64 {
    f64::max(
        min_width as f64 / width as f64,
        min_height as f64 / height as f64,
    )
}

/// Offset that centers a `inner`-sized window inside `outer`.
pub(crate) fn center_offset(outer: (u32, u32), inner: (u32, u32)) -> (u32, u32) {
    (
        outer.0.saturating_sub(inner.0) / 2,
        outer.1.saturating_sub(inner.1) / 2,
    )
}

/// Set the height, keeping aspect ratio.
pub(crate) fn heighten((width, height): (u32, u32), target: u32) -> (u32, u32) {
    (scale_side(width, target as f64 / height as f64), target)
}

/// Set the width, keeping aspect ratio.
pub(crate) fn widen((width, height): (u32, u32), target: u32) -> (u32, u32) {
    (target, scale_side(height, target as f64 / width as f64))
}
