//! Statistical confirmation that a watermark is really present.
//!
//! The candidate box is split by the alpha map into a **core** (pixels the
//! logo covers strongly) and a **background** (pixels it barely touches). If
//! the logo was composited there, the core must be brighter than the background
//! by roughly the amount alpha blending with white predicts:
//!
//! ```text
//! expected_boost = avg_core_alpha * (255 - background_brightness)
//! actual_boost   = core_brightness - background_brightness
//! ```
//!
//! A ratio far below 1 means nothing lifted the core; far above 1 means the
//! picture itself, not the logo, explains the pattern. A region that is almost
//! uniformly white is rejected outright so blank corners are never "restored".
//!
//! Detection happens in two steps: [`summarize`] reduces the region to an
//! immutable [`RegionStats`], then [`classify`] applies the ordered rules.

use image::RgbaImage;

use crate::alpha_map::AlphaMap;
use crate::locator::CandidateBox;

/// Alpha at or above this marks a core pixel.
pub const HIGH_ALPHA_MIN: f32 = 0.15;
/// Alpha at or below this marks a background pixel.
pub const LOW_ALPHA_MAX: f32 = 0.02;
/// A pixel counts as white when every channel is at least this bright.
pub const WHITE_CHANNEL_MIN: u8 = 250;
/// Share of white pixels above which a region may be blank.
pub const WHITE_RATIO_MIN: f64 = 0.98;
/// Mean brightness above which a region may be blank.
pub const WHITE_MEAN_MIN: f64 = 245.0;
/// Brightness spread below which a region may be blank.
pub const WHITE_STDDEV_MAX: f64 = 5.0;
/// Expected boosts below this are too weak to compare against.
pub const MIN_EXPECTED_BOOST: f64 = 5.0;
/// Lowest accepted observed/expected boost ratio.
pub const BOOST_RATIO_MIN: f64 = 0.4;
/// Highest accepted observed/expected boost ratio.
pub const BOOST_RATIO_MAX: f64 = 1.5;
/// Slack subtracted from the predicted core brightness in the fallback test.
pub const ABSOLUTE_LIFT_SLACK: f64 = 20.0;

/// Brightness accumulated over one alpha band.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BandStats {
    /// Number of pixels in the band.
    pub count: u32,
    /// Sum of per-pixel brightness (mean of R, G, B).
    pub brightness_sum: f64,
}

impl BandStats {
    fn add(&mut self, brightness: f64) {
        self.count += 1;
        self.brightness_sum += brightness;
    }

    /// Average brightness, or `None` for an empty band.
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.brightness_sum / f64::from(self.count))
    }
}

/// Summary of a candidate region, computed once and then only read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionStats {
    /// Pixels sampled (every pixel of the clipped box).
    pub samples: u32,
    /// Pixels whose channels are all at least [`WHITE_CHANNEL_MIN`].
    pub white_count: u32,
    /// Mean brightness over all samples.
    pub brightness_mean: f64,
    /// Population standard deviation of brightness over all samples.
    pub brightness_stddev: f64,
    /// Core pixels (alpha >= [`HIGH_ALPHA_MIN`]).
    pub high: BandStats,
    /// Sum of alpha over core pixels.
    pub high_alpha_sum: f64,
    /// Background pixels (alpha <= [`LOW_ALPHA_MAX`]).
    pub low: BandStats,
}

impl RegionStats {
    /// Fraction of samples that are white; zero for an empty region.
    #[must_use]
    pub fn white_ratio(&self) -> f64 {
        if self.samples == 0 {
            0.0
        } else {
            f64::from(self.white_count) / f64::from(self.samples)
        }
    }
}

/// Why a watermark was accepted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evidence {
    /// Observed lift matched the alpha-blending prediction.
    BoostRatio(f64),
    /// Alpha was too weak for the ratio test but the core is as bright as
    /// blending predicts.
    AbsoluteLift {
        /// Average core brightness.
        high_avg: f64,
        /// Brightness the core had to reach.
        floor: f64,
    },
}

/// Why a watermark was rejected.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rejection {
    /// The region contained no pixels.
    EmptyRegion,
    /// The region is almost uniformly white.
    UniformWhite,
    /// The region lacks either core or background pixels.
    NoContrast,
    /// Observed/expected boost ratio outside the accepted window.
    BoostOutOfRange(f64),
    /// Fallback test: the core is not as bright as blending predicts.
    InsufficientLift {
        /// Average core brightness.
        high_avg: f64,
        /// Brightness the core had to reach.
        floor: f64,
    },
}

/// Outcome of the presence test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Verdict {
    /// A watermark is present.
    Present(Evidence),
    /// No watermark is present.
    Absent(Rejection),
}

impl Verdict {
    /// Whether the verdict is [`Verdict::Present`].
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

/// Collect brightness statistics for `region`, aligned 1:1 with `alpha`.
///
/// The box is clipped to both the image and the alpha map.
#[must_use]
pub fn summarize(image: &RgbaImage, region: CandidateBox, alpha: &AlphaMap) -> RegionStats {
    let x2 = region
        .x
        .saturating_add(region.width.min(alpha.width()))
        .min(image.width());
    let y2 = region
        .y
        .saturating_add(region.height.min(alpha.height()))
        .min(image.height());

    let mut stats = RegionStats::default();
    if region.x >= x2 || region.y >= y2 {
        return stats;
    }

    let mut sum = 0.0_f64;
    let mut sum_sq = 0.0_f64;

    for dy in 0..(y2 - region.y) {
        for dx in 0..(x2 - region.x) {
            let px = image.get_pixel(region.x + dx, region.y + dy);
            let [r, g, b, _] = px.0;
            let brightness = (f64::from(r) + f64::from(g) + f64::from(b)) / 3.0;

            let a = alpha.get(dx, dy);
            if a >= HIGH_ALPHA_MIN {
                stats.high.add(brightness);
                stats.high_alpha_sum += f64::from(a);
            } else if a <= LOW_ALPHA_MAX {
                stats.low.add(brightness);
            }

            if r >= WHITE_CHANNEL_MIN && g >= WHITE_CHANNEL_MIN && b >= WHITE_CHANNEL_MIN {
                stats.white_count += 1;
            }

            stats.samples += 1;
            sum += brightness;
            sum_sq += brightness * brightness;
        }
    }

    let n = f64::from(stats.samples);
    stats.brightness_mean = sum / n;
    stats.brightness_stddev = (sum_sq / n - stats.brightness_mean.powi(2)).max(0.0).sqrt();
    stats
}

/// Apply the ordered decision rules; the first rule that matches decides.
#[must_use]
pub fn classify(stats: &RegionStats) -> Verdict {
    if stats.samples == 0 {
        return Verdict::Absent(Rejection::EmptyRegion);
    }

    if stats.white_ratio() >= WHITE_RATIO_MIN
        && stats.brightness_mean >= WHITE_MEAN_MIN
        && stats.brightness_stddev <= WHITE_STDDEV_MAX
    {
        return Verdict::Absent(Rejection::UniformWhite);
    }

    let (Some(high_avg), Some(low_avg)) = (stats.high.mean(), stats.low.mean()) else {
        return Verdict::Absent(Rejection::NoContrast);
    };

    let avg_alpha = stats.high_alpha_sum / f64::from(stats.high.count);
    let expected_boost = avg_alpha * (255.0 - low_avg);
    let actual_boost = high_avg - low_avg;

    // Flat regions at brightness 245..=249 land here and pass: with no lift,
    // high_avg == low_avg, which is above the floor whenever the boost is weak.
    if expected_boost < MIN_EXPECTED_BOOST {
        let floor = avg_alpha * 255.0 + (1.0 - avg_alpha) * low_avg - ABSOLUTE_LIFT_SLACK;
        return if high_avg >= floor {
            Verdict::Present(Evidence::AbsoluteLift { high_avg, floor })
        } else {
            Verdict::Absent(Rejection::InsufficientLift { high_avg, floor })
        };
    }

    let ratio = actual_boost / expected_boost;
    if (BOOST_RATIO_MIN..=BOOST_RATIO_MAX).contains(&ratio) {
        Verdict::Present(Evidence::BoostRatio(ratio))
    } else {
        Verdict::Absent(Rejection::BoostOutOfRange(ratio))
    }
}

/// Whether the watermark is present in `region`.
#[must_use]
pub fn is_watermark_present(image: &RgbaImage, region: CandidateBox, alpha: &AlphaMap) -> bool {
    classify(&summarize(image, region, alpha)).is_present()
}
