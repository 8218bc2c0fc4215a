//! Where the watermark should be, given only the image dimensions.
//!
//! The service stamps its logo at a fixed offset from the bottom-right corner.
//! Two layouts exist and the choice depends purely on the image size:
//!
//! | Variant | Applies when              | Logo  | Margins |
//! |---------|---------------------------|-------|---------|
//! | Large   | width > 1024 AND height > 1024 | 96 px | 64 px |
//! | Small   | otherwise                 | 48 px | 32 px   |

/// Both dimensions must exceed this for the large layout.
const LARGE_LAYOUT_MIN_EXCLUSIVE: u32 = 1024;

/// Watermark layout variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatermarkVariant {
    /// 48x48 logo, 32px margins (images where either dimension <= 1024).
    Small,
    /// 96x96 logo, 64px margins (images where both dimensions > 1024).
    Large,
}

impl WatermarkVariant {
    /// Select the variant for an image of the given dimensions.
    ///
    /// 1024x1024 is still small; 1025x1025 is the first large size.
    #[must_use]
    pub fn for_dimensions(width: u32, height: u32) -> Self {
        if width > LARGE_LAYOUT_MIN_EXCLUSIVE && height > LARGE_LAYOUT_MIN_EXCLUSIVE {
            Self::Large
        } else {
            Self::Small
        }
    }

    /// Side length of the square logo in pixels.
    #[must_use]
    pub fn logo_size(self) -> u32 {
        match self {
            Self::Small => 48,
            Self::Large => 96,
        }
    }

    /// Distance from the right and bottom edges in pixels.
    #[must_use]
    pub fn margin(self) -> u32 {
        match self {
            Self::Small => 32,
            Self::Large => 64,
        }
    }

    /// Layout parameters for this variant.
    #[must_use]
    pub fn config(self) -> WatermarkConfig {
        WatermarkConfig {
            variant: self,
            logo_size: self.logo_size(),
            margin_right: self.margin(),
            margin_bottom: self.margin(),
        }
    }
}

/// Layout parameters of one watermark variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatermarkConfig {
    /// Variant these parameters belong to.
    pub variant: WatermarkVariant,
    /// Side length of the square logo in pixels.
    pub logo_size: u32,
    /// Gap between the logo and the right edge.
    pub margin_right: u32,
    /// Gap between the logo and the bottom edge.
    pub margin_bottom: u32,
}

/// Rectangle where the watermark is expected, in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateBox {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl CandidateBox {
    /// Whether `(px, py)` falls inside the box.
    #[must_use]
    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x
            && px < self.x.saturating_add(self.width)
            && py >= self.y
            && py < self.y.saturating_add(self.height)
    }
}

/// Locate the candidate box using the size rule.
///
/// Returns `None` when the box would not fit inside the image.
#[must_use]
pub fn locate(width: u32, height: u32) -> Option<(WatermarkConfig, CandidateBox)> {
    locate_variant(WatermarkVariant::for_dimensions(width, height), width, height)
}

/// Locate the candidate box for an explicitly chosen variant.
///
/// The image must be strictly larger than `logo_size + margin` on both axes,
/// so the box never touches the top or left edge.
#[must_use]
pub fn locate_variant(
    variant: WatermarkVariant,
    width: u32,
    height: u32,
) -> Option<(WatermarkConfig, CandidateBox)> {
    let config = variant.config();
    let x = width
        .checked_sub(config.margin_right + config.logo_size)
        .filter(|&x| x > 0)?;
    let y = height
        .checked_sub(config.margin_bottom + config.logo_size)
        .filter(|&y| y > 0)?;

    Some((
        config,
        CandidateBox {
            x,
            y,
            width: config.logo_size,
            height: config.logo_size,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_small_when_either_dim_lte_1024() {
        assert_eq!(WatermarkVariant::for_dimensions(800, 600), WatermarkVariant::Small);
        assert_eq!(WatermarkVariant::for_dimensions(1024, 1024), WatermarkVariant::Small);
        assert_eq!(WatermarkVariant::for_dimensions(2048, 512), WatermarkVariant::Small);
        assert_eq!(WatermarkVariant::for_dimensions(512, 2048), WatermarkVariant::Small);
        assert_eq!(WatermarkVariant::for_dimensions(1025, 1024), WatermarkVariant::Small);
    }

    #[test]
    fn variant_large_when_both_dims_gt_1024() {
        assert_eq!(WatermarkVariant::for_dimensions(1025, 1025), WatermarkVariant::Large);
        assert_eq!(WatermarkVariant::for_dimensions(2048, 2048), WatermarkVariant::Large);
    }

    #[test]
    fn config_values_per_variant() {
        let small = WatermarkVariant::Small.config();
        assert_eq!((small.logo_size, small.margin_right, small.margin_bottom), (48, 32, 32));

        let large = WatermarkVariant::Large.config();
        assert_eq!((large.logo_size, large.margin_right, large.margin_bottom), (96, 64, 64));
    }

    #[test]
    fn locate_anchors_box_bottom_right() {
        let (config, region) = locate(2048, 2048).unwrap();
        assert_eq!(config.variant, WatermarkVariant::Large);
        assert_eq!(
            region,
            CandidateBox {
                x: 2048 - 64 - 96,
                y: 2048 - 64 - 96,
                width: 96,
                height: 96
            }
        );

        let (config, region) = locate(800, 600).unwrap();
        assert_eq!(config.variant, WatermarkVariant::Small);
        assert_eq!((region.x, region.y), (800 - 32 - 48, 600 - 32 - 48));
        assert_eq!((region.width, region.height), (48, 48));
    }

    #[test]
    fn locate_rejects_images_too_small_for_the_box() {
        for dim in [0, 1, 10, 48, 79, 80] {
            assert!(locate(dim, 500).is_none(), "width {dim} should have no candidate");
            assert!(locate(500, dim).is_none(), "height {dim} should have no candidate");
        }
        let (_, region) = locate(81, 81).unwrap();
        assert_eq!((region.x, region.y), (1, 1));
    }

    #[test]
    fn forced_variant_uses_its_own_geometry() {
        let (config, region) = locate_variant(WatermarkVariant::Large, 800, 600).unwrap();
        assert_eq!(config.logo_size, 96);
        assert_eq!((region.x, region.y), (800 - 160, 600 - 160));

        assert!(locate_variant(WatermarkVariant::Large, 160, 1000).is_none());
    }

    #[test]
    fn candidate_box_contains() {
        let region = CandidateBox {
            x: 10,
            y: 20,
            width: 5,
            height: 5,
        };
        assert!(region.contains(10, 20));
        assert!(region.contains(14, 24));
        assert!(!region.contains(15, 24));
        assert!(!region.contains(9, 20));
    }

    #[test]
    fn contains_saturates_at_the_far_edge() {
        let region = CandidateBox {
            x: u32::MAX - 2,
            y: u32::MAX - 2,
            width: 10,
            height: 10,
        };
        assert!(region.contains(u32::MAX - 1, u32::MAX - 1));
        assert!(!region.contains(u32::MAX - 3, u32::MAX - 1));
    }
}
