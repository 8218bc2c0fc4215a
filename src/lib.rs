//! Detect and strip the semi-transparent sparkle logo that an image-generation
//! service stamps in the bottom-right corner of its output.
//!
//! The logo is white, alpha-blended at a fixed offset whose size depends only
//! on the image dimensions. This crate computes where it should be, checks
//! statistically that it really is there, then inverts the blend to recover
//! the pixels underneath, using 48x48 and 96x96 templates embedded in the
//! binary.
//!
//! # Quick Start
//!
//! ```no_run
//! use gemini_unmark::{ProcessOptions, WatermarkEngine};
//!
//! let engine = WatermarkEngine::new().expect("failed to init engine");
//! let mut img = image::open("photo.png").unwrap().to_rgba8();
//! if let Some(region) = engine.process_image(&mut img, &ProcessOptions::default()) {
//!     println!("removed watermark at ({}, {})", region.x, region.y);
//!     img.save("cleaned.png").unwrap();
//! }
//! ```
//!
//! # Detection
//!
//! The presence test compares how much brighter the logo's core is than its
//! surroundings with what alpha blending predicts. Blank white corners and
//! flat regions are rejected so originals are never altered by mistake.
//!
//! ```no_run
//! use gemini_unmark::{ProcessOptions, WatermarkEngine};
//!
//! let engine = WatermarkEngine::new().expect("failed to init engine");
//! let img = image::open("photo.png").unwrap().to_rgba8();
//! match engine.detect(&img, &ProcessOptions::default()) {
//!     Some(found) => println!("{:?}", found.verdict),
//!     None => println!("image too small for a watermark"),
//! }
//! ```

#![deny(missing_docs)]

pub mod alpha_map;
pub mod blending;
pub mod detection;
mod engine;
pub mod error;
pub mod locator;
pub mod templates;

pub use alpha_map::{alpha_map, build_alpha_map, AlphaMap};
pub use detection::{is_watermark_present, Verdict};
pub use engine::{
    default_output_path, is_supported_image, save_image, BatchEntry, Detection, ProcessOptions,
    ProcessReport, WatermarkEngine,
};
pub use error::{Error, Result};
pub use locator::{locate, CandidateBox, WatermarkConfig, WatermarkVariant};
