use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use gemini_unmark::{ProcessOptions, ProcessReport, WatermarkEngine, WatermarkVariant};

#[derive(Parser)]
#[command(
    name = "gemini-unmark",
    about = "Detect and remove the corner sparkle watermark via reverse alpha blending",
    version,
    after_help = "Simple usage: gemini-unmark <image>  (writes <image>_no_watermark.<ext>)\n\n\
                  The resulting path is printed on stdout. When no watermark is found\n\
                  nothing is written and the input path is printed unchanged."
)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Input image file or directory
    input: PathBuf,

    /// Output file or directory (default: {name}_no_watermark.{ext})
    output: Option<PathBuf>,

    /// Skip watermark detection, process unconditionally
    #[arg(short, long)]
    force: bool,

    /// Force 48x48 watermark size (for images <= 1024px)
    #[arg(long, conflicts_with = "force_large")]
    force_small: bool,

    /// Force 96x96 watermark size (for images > 1024px)
    #[arg(long)]
    force_large: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn init_tracing(cli: &Cli) {
    let default_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let force_size = if cli.force_small {
        Some(WatermarkVariant::Small)
    } else if cli.force_large {
        Some(WatermarkVariant::Large)
    } else {
        None
    };

    let opts = ProcessOptions {
        force: cli.force,
        force_size,
    };

    init_tracing(&cli);

    let engine = match WatermarkEngine::new() {
        Ok(e) => e,
        Err(e) => {
            error!("failed to initialize engine: {e}");
            process::exit(1);
        }
    };

    if !cli.input.exists() {
        error!("input path does not exist: {}", cli.input.display());
        process::exit(1);
    }

    if opts.force {
        warn!("force mode: removing at the expected position without detection");
    }

    if cli.input.is_dir() {
        run_directory(&engine, &cli.input, cli.output.as_deref(), &opts);
    } else {
        match engine.process_file(&cli.input, cli.output.as_deref(), &opts) {
            Ok(report) => print_report(&report),
            Err(e) => {
                error!("{}: {e}", cli.input.display());
                process::exit(1);
            }
        }
    }
}

fn run_directory(
    engine: &WatermarkEngine,
    input_dir: &Path,
    output_dir: Option<&Path>,
    opts: &ProcessOptions,
) {
    let Some(output_dir) = output_dir else {
        error!("output directory is required for batch processing");
        eprintln!("Usage: gemini-unmark <input_dir> <output_dir>");
        process::exit(1);
    };

    let entries = match engine.process_directory(input_dir, output_dir, opts) {
        Ok(entries) => entries,
        Err(e) => {
            error!("{}: {e}", input_dir.display());
            process::exit(1);
        }
    };

    let mut cleaned = 0u32;
    let mut skipped = 0u32;
    let mut failed = 0u32;

    for entry in &entries {
        match &entry.outcome {
            Ok(report) => {
                print_report(report);
                if report.was_cleaned() {
                    cleaned += 1;
                } else {
                    skipped += 1;
                }
            }
            Err(e) => {
                error!("{}: {e}", entry.input.display());
                failed += 1;
            }
        }
    }

    info!(
        cleaned,
        skipped,
        failed,
        total = entries.len(),
        "batch finished"
    );

    if failed > 0 {
        process::exit(1);
    }
}

fn print_report(report: &ProcessReport) {
    if let Some(region) = report.removed {
        info!(
            "watermark at x={}, y={}, size={}",
            region.x, region.y, region.width
        );
    }
    println!("{}", report.output.display());
}
