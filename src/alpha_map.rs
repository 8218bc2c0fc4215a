//! Per-pixel watermark opacity derived from a template.
//!
//! The logo is painted as white over the photo, so the brightest channel of the
//! template approximates how much white was blended in at each offset:
//! `alpha = max(R, G, B) / 255`.

use std::sync::OnceLock;

use image::RgbaImage;

use crate::error::Result;
use crate::locator::WatermarkVariant;
use crate::templates;

static ALPHA_SMALL: OnceLock<AlphaMap> = OnceLock::new();
static ALPHA_LARGE: OnceLock<AlphaMap> = OnceLock::new();

/// Opacity grid in `[0, 1]`, same dimensions as its source template.
#[derive(Debug, Clone, PartialEq)]
pub struct AlphaMap {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl AlphaMap {
    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Opacity at offset `(x, y)` from the top-left corner.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the map.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> f32 {
        assert!(x < self.width && y < self.height, "alpha map index out of range");
        self.values[(y * self.width + x) as usize]
    }

    /// Row-major opacity values.
    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }
}

/// Build an alpha map from an RGBA template.
///
/// Pure function of the template; the template's own alpha channel is ignored.
#[must_use]
pub fn build_alpha_map(template: &RgbaImage) -> AlphaMap {
    let values = template
        .pixels()
        .map(|px| {
            let max_val = px[0].max(px[1]).max(px[2]);
            f32::from(max_val) / 255.0
        })
        .collect();

    AlphaMap {
        width: template.width(),
        height: template.height(),
        values,
    }
}

/// Memoized alpha map for a variant.
///
/// Built on first request and published once; every later call returns the
/// same reference.
///
/// # Errors
///
/// Propagates template decode errors from [`templates::template`].
pub fn alpha_map(variant: WatermarkVariant) -> Result<&'static AlphaMap> {
    let slot = match variant {
        WatermarkVariant::Small => &ALPHA_SMALL,
        WatermarkVariant::Large => &ALPHA_LARGE,
    };

    if let Some(map) = slot.get() {
        return Ok(map);
    }

    let map = build_alpha_map(templates::template(variant)?);
    Ok(slot.get_or_init(|| map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn alpha_is_max_channel_over_255() {
        let mut t = RgbaImage::new(2, 2);
        t.put_pixel(0, 0, Rgba([0, 0, 0, 255]));
        t.put_pixel(1, 0, Rgba([255, 10, 20, 0]));
        t.put_pixel(0, 1, Rgba([10, 51, 20, 255]));
        t.put_pixel(1, 1, Rgba([128, 128, 128, 255]));

        let map = build_alpha_map(&t);
        assert_eq!((map.width(), map.height()), (2, 2));
        assert!(map.get(0, 0).abs() < f32::EPSILON);
        assert!((map.get(1, 0) - 1.0).abs() < f32::EPSILON);
        assert!((map.get(0, 1) - 0.2).abs() < 1e-6);
        assert!((map.get(1, 1) - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn build_is_deterministic() {
        let t = templates::template(WatermarkVariant::Small).unwrap();
        let a = build_alpha_map(t);
        let b = build_alpha_map(t);
        assert_eq!(a, b);
    }

    #[test]
    fn embedded_maps_have_template_dimensions_and_unit_range() {
        for variant in [WatermarkVariant::Small, WatermarkVariant::Large] {
            let map = alpha_map(variant).unwrap();
            let size = variant.logo_size();
            assert_eq!((map.width(), map.height()), (size, size));
            assert_eq!(map.values().len(), (size * size) as usize);
            assert!(map.values().iter().all(|a| (0.0..=1.0).contains(a)));
        }
    }

    #[test]
    fn embedded_maps_have_core_and_background() {
        for variant in [WatermarkVariant::Small, WatermarkVariant::Large] {
            let map = alpha_map(variant).unwrap();
            assert!(map.values().iter().any(|&a| a >= 0.15));
            assert!(map.values().iter().any(|&a| a <= 0.02));
        }
    }

    #[test]
    fn alpha_map_is_cached() {
        let a = alpha_map(WatermarkVariant::Large).unwrap();
        let b = alpha_map(WatermarkVariant::Large).unwrap();
        assert!(std::ptr::eq(a, b));
        assert!(!std::ptr::eq(a, alpha_map(WatermarkVariant::Small).unwrap()));
    }
}
