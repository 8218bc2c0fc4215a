//! Core watermark removal engine.

use std::ffi::OsString;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, DynamicImage, ImageFormat, RgbaImage};
use tracing::{debug, info, warn};

use crate::alpha_map::{self, AlphaMap};
use crate::blending;
use crate::detection::{self, RegionStats, Verdict};
use crate::error::{Error, Result};
use crate::locator::{self, CandidateBox, WatermarkConfig, WatermarkVariant};

/// JPEG quality used when re-encoding.
const JPEG_QUALITY: u8 = 95;

/// Suffix appended to the file stem of derived output paths.
const OUTPUT_SUFFIX: &str = "_no_watermark";

/// Options controlling watermark processing behavior.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Skip the presence test and remove unconditionally at the candidate box.
    pub force: bool,
    /// Use this layout instead of choosing one from the image size.
    pub force_size: Option<WatermarkVariant>,
}

/// Result of running the presence test on one image.
#[derive(Debug, Clone)]
pub struct Detection {
    /// Layout that was checked.
    pub config: WatermarkConfig,
    /// Where the watermark was expected.
    pub region: CandidateBox,
    /// Statistics the verdict was based on.
    pub stats: RegionStats,
    /// Outcome of the presence test.
    pub verdict: Verdict,
}

/// Result of processing a single image file.
#[derive(Debug, Clone)]
pub struct ProcessReport {
    /// Path of the source image.
    pub input: PathBuf,
    /// Where the result lives: the written file, or `input` when nothing was removed.
    pub output: PathBuf,
    /// Box that was cleaned, if a watermark was removed.
    pub removed: Option<CandidateBox>,
}

impl ProcessReport {
    /// Whether a watermark was removed and a new file written.
    #[must_use]
    pub fn was_cleaned(&self) -> bool {
        self.removed.is_some()
    }
}

/// Outcome for one file of a directory run.
#[derive(Debug)]
pub struct BatchEntry {
    /// Source image.
    pub input: PathBuf,
    /// Report, or the error that stopped this file.
    pub outcome: Result<ProcessReport>,
}

/// The watermark engine holding the memoized alpha maps.
///
/// Create once with [`WatermarkEngine::new()`] and reuse for multiple images.
/// Both templates are decoded at construction so later calls cannot fail.
#[derive(Debug, Clone, Copy)]
pub struct WatermarkEngine {
    alpha_small: &'static AlphaMap,
    alpha_large: &'static AlphaMap,
}

impl WatermarkEngine {
    /// Create a new engine, decoding both embedded templates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TemplateDecode`] or [`Error::TemplateDimensions`] if an
    /// embedded template is corrupt.
    pub fn new() -> Result<Self> {
        Ok(Self {
            alpha_small: alpha_map::alpha_map(WatermarkVariant::Small)?,
            alpha_large: alpha_map::alpha_map(WatermarkVariant::Large)?,
        })
    }

    /// Alpha map for a layout variant.
    #[must_use]
    pub fn alpha_map(&self, variant: WatermarkVariant) -> &'static AlphaMap {
        match variant {
            WatermarkVariant::Small => self.alpha_small,
            WatermarkVariant::Large => self.alpha_large,
        }
    }

    /// Candidate box for an image, honoring `force_size`.
    #[must_use]
    #[allow(clippy::unused_self)] // method on `self` for API consistency
    pub fn locate(
        &self,
        width: u32,
        height: u32,
        force_size: Option<WatermarkVariant>,
    ) -> Option<(WatermarkConfig, CandidateBox)> {
        match force_size {
            Some(variant) => locator::locate_variant(variant, width, height),
            None => locator::locate(width, height),
        }
    }

    /// Run the presence test.
    ///
    /// Returns `None` when the image has no room for a watermark.
    #[must_use]
    pub fn detect(&self, image: &RgbaImage, opts: &ProcessOptions) -> Option<Detection> {
        let (config, region) = self.locate(image.width(), image.height(), opts.force_size)?;
        let stats = detection::summarize(image, region, self.alpha_map(config.variant));
        let verdict = detection::classify(&stats);

        debug!(
            x = region.x,
            y = region.y,
            size = config.logo_size,
            samples = stats.samples,
            high = stats.high.count,
            low = stats.low.count,
            ?verdict,
            "presence test"
        );

        Some(Detection {
            config,
            region,
            stats,
            verdict,
        })
    }

    /// Reverse the blend inside `region` using the variant's alpha map.
    pub fn remove(&self, image: &mut RgbaImage, region: CandidateBox, variant: WatermarkVariant) {
        blending::remove_watermark(image, region, self.alpha_map(variant));
    }

    /// Locate, confirm and remove the watermark in place.
    ///
    /// Returns the cleaned box, or `None` if the image was left untouched.
    pub fn process_image(
        &self,
        image: &mut RgbaImage,
        opts: &ProcessOptions,
    ) -> Option<CandidateBox> {
        let (config, region) = if opts.force {
            self.locate(image.width(), image.height(), opts.force_size)?
        } else {
            let found = self.detect(image, opts)?;
            if !found.verdict.is_present() {
                return None;
            }
            (found.config, found.region)
        };

        self.remove(image, region, config.variant);
        Some(region)
    }

    /// Process a single image file: load, detect, remove, save.
    ///
    /// When `output` is `None` the result goes to [`default_output_path`].
    /// If no watermark is found nothing is written and the report points back
    /// at `input`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InputNotFound`] for a missing input, [`Error::Image`]
    /// if it cannot be decoded or encoded, [`Error::UnsupportedFormat`] for an
    /// unknown output extension, and [`Error::Io`] if writing fails.
    pub fn process_file(
        &self,
        input: &Path,
        output: Option<&Path>,
        opts: &ProcessOptions,
    ) -> Result<ProcessReport> {
        if !input.is_file() {
            return Err(Error::InputNotFound(input.to_path_buf()));
        }

        let source = image::open(input)?;
        let color = source.color();
        let mut rgba = source.to_rgba8();
        debug!(
            path = %input.display(),
            width = rgba.width(),
            height = rgba.height(),
            ?color,
            "loaded image"
        );

        let Some(region) = self.process_image(&mut rgba, opts) else {
            info!(path = %input.display(), "no watermark detected");
            return Ok(ProcessReport {
                input: input.to_path_buf(),
                output: input.to_path_buf(),
                removed: None,
            });
        };

        let output = output.map_or_else(|| default_output_path(input), Path::to_path_buf);
        save_image(&rgba, &output, color)?;
        info!(
            path = %output.display(),
            x = region.x,
            y = region.y,
            size = region.width,
            "watermark removed"
        );

        Ok(ProcessReport {
            input: input.to_path_buf(),
            output,
            removed: Some(region),
        })
    }

    /// Process all supported images in a directory.
    ///
    /// Cleaned images are written under `output_dir` with their original file
    /// names. Uses parallel iteration when the `cli` feature is enabled (via
    /// rayon). Entries are returned in path order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the input directory cannot be read or the
    /// output directory cannot be created. Per-file failures are reported in
    /// each [`BatchEntry`].
    pub fn process_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        opts: &ProcessOptions,
    ) -> Result<Vec<BatchEntry>> {
        let mut inputs: Vec<PathBuf> = fs::read_dir(input_dir)?
            .filter_map(std::result::Result::ok)
            .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
            .map(|e| e.path())
            .filter(|p| is_supported_image(p))
            .collect();
        inputs.sort();

        fs::create_dir_all(output_dir)?;

        let run = |input: &PathBuf| {
            let output = input
                .file_name()
                .map(|name| output_dir.join(name))
                .unwrap_or_else(|| default_output_path(input));
            let outcome = self.process_file(input, Some(&output), opts);
            if let Err(e) = &outcome {
                warn!(path = %input.display(), error = %e, "failed to process image");
            }
            BatchEntry {
                input: input.clone(),
                outcome,
            }
        };

        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            Ok(inputs.par_iter().map(run).collect())
        }

        #[cfg(not(feature = "cli"))]
        {
            Ok(inputs.iter().map(run).collect())
        }
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Save an RGBA buffer, restoring the source's color mode where the format allows.
///
/// JPEG is written at quality 95 and never carries alpha. Grayscale sources
/// stay grayscale for PNG and JPEG; other sources keep alpha only if they had
/// it. PNG also keeps a 16-bit source at 16 bits per channel, although the
/// pixels went through 8-bit processing. The image is encoded in memory and
/// moved into place with a rename, so a failed save never leaves a truncated
/// file at `path`.
///
/// # Errors
///
/// Returns an error if the format is unsupported, encoding fails, or the file
/// cannot be written.
pub fn save_image(img: &RgbaImage, path: &Path, source_color: ColorType) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    let mut encoded = Vec::new();
    match format {
        ImageFormat::Jpeg => {
            let out = restore_color(img, source_color, format);
            out.write_with_encoder(JpegEncoder::new_with_quality(&mut encoded, JPEG_QUALITY))?;
        }
        ImageFormat::Png | ImageFormat::WebP | ImageFormat::Bmp => {
            let out = restore_color(img, source_color, format);
            out.write_to(&mut Cursor::new(&mut encoded), format)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }
    }

    write_atomic(path, &encoded)
}

fn restore_color(img: &RgbaImage, source_color: ColorType, format: ImageFormat) -> DynamicImage {
    let rgba = DynamicImage::ImageRgba8(img.clone());
    let keep_alpha = source_color.has_alpha() && format != ImageFormat::Jpeg;
    let gray =
        matches!(format, ImageFormat::Png | ImageFormat::Jpeg) && !source_color.has_color();
    // Anything wider than 8 bits per channel is written back as 16-bit PNG.
    let wide =
        format == ImageFormat::Png && source_color.bytes_per_pixel() > source_color.channel_count();

    match (gray, keep_alpha, wide) {
        (true, true, true) => DynamicImage::ImageLumaA16(rgba.to_luma_alpha16()),
        (true, true, false) => DynamicImage::ImageLumaA8(rgba.to_luma_alpha8()),
        (true, false, true) => DynamicImage::ImageLuma16(rgba.to_luma16()),
        (true, false, false) => DynamicImage::ImageLuma8(rgba.to_luma8()),
        (false, true, true) => DynamicImage::ImageRgba16(rgba.to_rgba16()),
        (false, true, false) => rgba,
        (false, false, true) => DynamicImage::ImageRgb16(rgba.to_rgb16()),
        (false, false, false) => DynamicImage::ImageRgb8(rgba.to_rgb8()),
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut temp_name = path.file_name().map(OsString::from).unwrap_or_default();
    temp_name.push(".partial");
    let temp_path = path.with_file_name(temp_name);

    if let Err(e) = fs::write(&temp_path, bytes).and_then(|()| fs::rename(&temp_path, path)) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    Ok(())
}

/// Generate a default output path from an input path.
///
/// Example: `"photo.jpg"` becomes `"photo_no_watermark.jpg"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let name = match input.extension() {
        Some(ext) => format!("{stem}{OUTPUT_SUFFIX}.{}", ext.to_string_lossy()),
        None => format!("{stem}{OUTPUT_SUFFIX}"),
    };
    input.with_file_name(name)
}
