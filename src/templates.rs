//! Embedded watermark templates.
//!
//! Each template is the logo rendered in white over black at its native size,
//! so the brightest channel of every pixel is the logo's opacity there.
//! Templates are decoded on first use and kept for the life of the process.

use std::sync::OnceLock;

use image::{ImageFormat, RgbaImage};

use crate::error::{Error, Result};
use crate::locator::WatermarkVariant;

/// 48x48 template used by the small layout.
const TEMPLATE_48_PNG: &[u8] = include_bytes!("../assets/watermark_48.png");

/// 96x96 template used by the large layout.
const TEMPLATE_96_PNG: &[u8] = include_bytes!("../assets/watermark_96.png");

static TEMPLATE_SMALL: OnceLock<RgbaImage> = OnceLock::new();
static TEMPLATE_LARGE: OnceLock<RgbaImage> = OnceLock::new();

/// Decoded template for a variant.
///
/// The first call per variant decodes the embedded PNG; later calls return the
/// same buffer.
///
/// # Errors
///
/// Returns [`Error::TemplateDecode`] if the embedded PNG is corrupt, or
/// [`Error::TemplateDimensions`] if it is not `logo_size` square.
pub fn template(variant: WatermarkVariant) -> Result<&'static RgbaImage> {
    let (slot, bytes) = match variant {
        WatermarkVariant::Small => (&TEMPLATE_SMALL, TEMPLATE_48_PNG),
        WatermarkVariant::Large => (&TEMPLATE_LARGE, TEMPLATE_96_PNG),
    };

    if let Some(decoded) = slot.get() {
        return Ok(decoded);
    }

    let decoded = decode_template(bytes, variant.logo_size())?;
    Ok(slot.get_or_init(|| decoded))
}

fn decode_template(bytes: &[u8], expected: u32) -> Result<RgbaImage> {
    let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(Error::TemplateDecode)?
        .to_rgba8();

    if img.width() != expected || img.height() != expected {
        return Err(Error::TemplateDimensions {
            width: img.width(),
            height: img.height(),
            expected,
        });
    }

    Ok(img)
}
