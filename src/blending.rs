//! Alpha blending math for watermark removal.
//!
//! The service applies its logo via forward alpha blending:
//! `watermarked = alpha * logo + (1 - alpha) * original`
//!
//! This module provides the reverse operation to recover original pixels.

use image::RgbaImage;

use crate::alpha_map::AlphaMap;
use crate::locator::CandidateBox;

/// Alpha threshold: pixels at or below this are left untouched.
pub const ALPHA_THRESHOLD: f32 = 0.002;

/// Maximum alpha: clamp to avoid division by near-zero in reverse blending.
pub const MAX_ALPHA: f32 = 0.99;

/// The logo is solid white.
pub const LOGO_VALUE: f32 = 255.0;

/// Remove the watermark inside `region` using reverse alpha blending.
///
/// Applies `original = (watermarked - alpha * 255) / (1 - alpha)` to the RGB
/// channels of every pixel in the box, aligned 1:1 with `alpha` by offset.
/// The alpha channel is never modified. The box is clipped to both the image
/// and the alpha map.
pub fn remove_watermark(image: &mut RgbaImage, region: CandidateBox, alpha: &AlphaMap) {
    let x2 = region
        .x
        .saturating_add(region.width.min(alpha.width()))
        .min(image.width());
    let y2 = region
        .y
        .saturating_add(region.height.min(alpha.height()))
        .min(image.height());

    if region.x >= x2 || region.y >= y2 {
        return;
    }

    for dy in 0..(y2 - region.y) {
        for dx in 0..(x2 - region.x) {
            let a = alpha.get(dx, dy).min(MAX_ALPHA);
            if a <= ALPHA_THRESHOLD {
                continue;
            }
            let inv_alpha = 1.0 - a;

            let px = image.get_pixel_mut(region.x + dx, region.y + dy);
            for ch in 0..3 {
                let watermarked = f32::from(px[ch]);
                let original = (watermarked - a * LOGO_VALUE) / inv_alpha;
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                {
                    px[ch] = original.round().clamp(0.0, 255.0) as u8;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alpha_map::{alpha_map, build_alpha_map};
    use crate::locator::WatermarkVariant;
    use image::Rgba;

    fn filled(w: u32, h: u32, px: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(px))
    }

    fn composite(image: &mut RgbaImage, region: CandidateBox, alpha: &AlphaMap) {
        for dy in 0..region.height {
            for dx in 0..region.width {
                let a = alpha.get(dx, dy);
                let px = image.get_pixel_mut(region.x + dx, region.y + dy);
                for ch in 0..3 {
                    let blended = a * LOGO_VALUE + (1.0 - a) * f32::from(px[ch]);
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    {
                        px[ch] = blended.round().clamp(0.0, 255.0) as u8;
                    }
                }
            }
        }
    }

    #[test]
    fn reverse_blend_recovers_original_within_tolerance() {
        let alpha = alpha_map(WatermarkVariant::Small).unwrap();
        let region = CandidateBox {
            x: 40,
            y: 30,
            width: 48,
            height: 48,
        };
        let original = filled(120, 100, [128, 64, 200, 255]);
        let mut img = original.clone();
        composite(&mut img, region, alpha);
        assert_ne!(img, original);

        remove_watermark(&mut img, region, alpha);

        for (x, y, restored) in img.enumerate_pixels() {
            let orig = original.get_pixel(x, y);
            for ch in 0..3 {
                let diff = (i32::from(restored[ch]) - i32::from(orig[ch])).abs();
                assert!(
                    diff <= 2,
                    "Pixel ({x},{y}) ch {ch} diff {diff} (restored={}, orig={})",
                    restored[ch],
                    orig[ch]
                );
            }
        }
    }

    #[test]
    fn negligible_alpha_leaves_region_unchanged() {
        let template = RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255]));
        let weak = build_alpha_map(&template);
        assert!(weak.values().iter().all(|&a| a <= ALPHA_THRESHOLD));
        let original = filled(16, 16, [17, 99, 230, 255]);
        let mut img = original.clone();
        let region = CandidateBox {
            x: 4,
            y: 4,
            width: 8,
            height: 8,
        };

        remove_watermark(&mut img, region, &weak);
        assert_eq!(img, original);
    }

    #[test]
    fn alpha_channel_is_preserved() {
        let template = RgbaImage::from_pixel(4, 4, Rgba([128, 128, 128, 255]));
        let alpha = build_alpha_map(&template);
        let mut img = filled(4, 4, [220, 220, 220, 77]);
        let region = CandidateBox {
            x: 0,
            y: 0,
            width: 4,
            height: 4,
        };

        remove_watermark(&mut img, region, &alpha);
        for px in img.pixels() {
            assert_eq!(px[3], 77);
            assert!(px[0] < 220);
        }
    }

    #[test]
    fn full_opacity_is_capped_and_clamped() {
        let template = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        let alpha = build_alpha_map(&template);
        let mut img = filled(2, 2, [255, 250, 0, 255]);
        let region = CandidateBox {
            x: 0,
            y: 0,
            width: 2,
            height: 2,
        };

        remove_watermark(&mut img, region, &alpha);
        // (255 - 0.99*255) / 0.01 = 255, (250 - 252.45) / 0.01 < 0, (0 - 252.45) / 0.01 < 0
        for px in img.pixels() {
            assert_eq!(px.0, [255, 0, 0, 255]);
        }
    }

    #[test]
    fn region_is_clipped_to_image() {
        let alpha = alpha_map(WatermarkVariant::Small).unwrap();
        let mut img = filled(30, 30, [200, 200, 200, 255]);
        let region = CandidateBox {
            x: 10,
            y: 10,
            width: 48,
            height: 48,
        };
        remove_watermark(&mut img, region, alpha);

        let outside = CandidateBox {
            x: 40,
            y: 40,
            width: 48,
            height: 48,
        };
        let before = img.clone();
        remove_watermark(&mut img, outside, alpha);
        assert_eq!(img, before);
    }

    #[test]
    fn box_near_u32_max_is_ignored() {
        let alpha = alpha_map(WatermarkVariant::Small).unwrap();
        let mut img = filled(30, 30, [200, 200, 200, 255]);
        let before = img.clone();
        let far = CandidateBox {
            x: u32::MAX - 10,
            y: u32::MAX - 10,
            width: 48,
            height: 48,
        };
        remove_watermark(&mut img, far, alpha);
        assert_eq!(img, before);
    }
}
