//! Trackprep: prepare image datasets for YOLO object-detection training.
//!
//! Two independent flows share one directory convention:
//!
//! - **conversion**: COCO JSON annotations become per-image YOLO label files
//!   plus a `data.yaml` manifest, with category ids re-indexed densely;
//! - **materialization**: an image tree is letterboxed onto square canvases
//!   or expanded with rotated and mirrored copies.
//!
//! # Modules
//!
//! - [`ir`]: typed records, boxes, category map, COCO and YOLO I/O
//! - [`convert`]: split-by-split COCO to YOLO conversion
//! - [`imaging`]: decode/encode, letterbox and augmentation transforms
//! - [`materialize`]: parallel tree traversal driving a transform
//! - [`validation`]: annotation document checks
//! - [`config`]: run configuration and the YAML config file
//! - [`error`]: the error type and its classification

pub mod config;
pub mod convert;
pub mod error;
pub mod fsutil;
pub mod imaging;
pub mod ir;
pub mod materialize;
pub mod validation;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use config::{ConfigFile, PipelineConfig, RgbColor};
pub use error::{ErrorClass, PrepError};

/// The trackprep CLI application.
#[derive(Parser)]
#[command(name = "trackprep")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Flags shared by every subcommand. They override the config file.
#[derive(clap::Args)]
struct GlobalArgs {
    /// YAML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Worker threads for image batches (0 = one per CPU).
    #[arg(long, global = true, env = "TRACKPREP_JOBS")]
    jobs: Option<usize>,

    /// Log progress every N processed files (0 = never).
    #[arg(long, global = true)]
    progress_every: Option<usize>,

    /// Recognized image extensions, comma separated.
    #[arg(long, global = true, value_delimiter = ',')]
    extensions: Option<Vec<String>>,
}

impl GlobalArgs {
    fn apply(&self, pipeline: &mut PipelineConfig) {
        if let Some(jobs) = self.jobs {
            pipeline.concurrency = jobs;
        }
        if let Some(every) = self.progress_every {
            pipeline.progress_every = every;
        }
        if let Some(extensions) = &self.extensions {
            pipeline.extensions = extensions.clone();
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Convert COCO annotation documents into a YOLO dataset.
    Convert(ConvertArgs),
    /// Pad every image of a tree onto a square canvas.
    Letterbox(LetterboxArgs),
    /// Write rotated and mirrored variants of every image of a tree.
    Augment(AugmentArgs),
    /// Validate a COCO annotation document.
    Validate(ValidateArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Directory holding `<split>.json` annotation documents.
    #[arg(long)]
    annotations: Option<PathBuf>,

    /// Root directory the documents' `file_name` entries are relative to.
    #[arg(long)]
    images: Option<PathBuf>,

    /// Output dataset root.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Splits to convert, comma separated.
    #[arg(long, value_delimiter = ',')]
    splits: Option<Vec<String>>,

    /// Split that writes `data.yaml`.
    #[arg(long)]
    primary: Option<String>,

    /// Report format.
    #[arg(long, value_enum, default_value = "text")]
    report: ReportFormat,
}

#[derive(clap::Args)]
struct LetterboxArgs {
    /// Input image tree.
    input: Option<PathBuf>,

    /// Output tree (must differ from the input).
    output: Option<PathBuf>,

    /// Canvas colour as `r,g,b` or `#rrggbb`.
    #[arg(long)]
    background: Option<RgbColor>,

    /// Report format.
    #[arg(long, value_enum, default_value = "text")]
    report: ReportFormat,
}

#[derive(clap::Args)]
struct AugmentArgs {
    /// Input image tree.
    input: Option<PathBuf>,

    /// Write variants into this tree instead of beside their sources.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Report format.
    #[arg(long, value_enum, default_value = "text")]
    report: ReportFormat,
}

#[derive(clap::Args)]
struct ValidateArgs {
    /// COCO JSON document to validate.
    input: PathBuf,

    /// Also check image files under this root against declared sizes.
    #[arg(long)]
    images: Option<PathBuf>,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Output format for the report.
    #[arg(long, value_enum, default_value = "text")]
    output: ReportFormat,
}

/// Run the trackprep CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), PrepError> {
    let cli = Cli::parse();

    let mut config = match &cli.global.config {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };
    cli.global.apply(&mut config.pipeline);

    match cli.command {
        Some(Commands::Convert(args)) => run_convert(args, config),
        Some(Commands::Letterbox(args)) => run_letterbox(args, config.pipeline),
        Some(Commands::Augment(args)) => run_augment(args, config.pipeline),
        Some(Commands::Validate(args)) => run_validate(args),
        None => {
            println!("trackprep {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Prepare image datasets for YOLO training.");
            println!();
            println!("Run 'trackprep --help' for usage information.");
            Ok(())
        }
    }
}

fn run_convert(args: ConvertArgs, config: ConfigFile) -> Result<(), PrepError> {
    let mut convert = config.convert;
    if let Some(dir) = args.annotations {
        convert.annotations_dir = dir;
    }
    if let Some(dir) = args.images {
        convert.images_dir = dir;
    }
    if let Some(dir) = args.output {
        convert.output_root = dir;
    }
    if let Some(splits) = args.splits {
        convert.splits = splits;
    }
    if let Some(primary) = args.primary {
        convert.primary_split = primary;
    }

    let report = convert::convert_dataset(&convert)?;
    match args.report {
        ReportFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&report).map_err(PrepError::ReportWrite)?
        ),
        ReportFormat::Text => print!("{}", report),
    }

    let failed = report.failed_splits();
    if failed.is_empty() {
        Ok(())
    } else {
        Err(PrepError::ConversionFailed { failed })
    }
}

fn run_letterbox(args: LetterboxArgs, mut pipeline: PipelineConfig) -> Result<(), PrepError> {
    if args.input.is_some() {
        pipeline.input_root = args.input;
    }
    if args.output.is_some() {
        pipeline.output_root = args.output;
    }
    if let Some(background) = args.background {
        pipeline.background = background;
    }

    let input = pipeline.require_input_root()?;
    let output = pipeline.require_output_root()?;

    let transform = imaging::Letterbox::new(pipeline.background);
    let report = materialize::materialize(input, output, &pipeline, &transform)?;
    print_batch_report(&report, args.report)
}

fn run_augment(args: AugmentArgs, mut pipeline: PipelineConfig) -> Result<(), PrepError> {
    if args.input.is_some() {
        pipeline.input_root = args.input;
    }
    if args.output.is_some() {
        pipeline.output_root = args.output;
    }

    let input = pipeline.require_input_root()?;
    let output = pipeline.output_root.as_deref().unwrap_or(input);

    let transform = imaging::Augment::new(pipeline.suffixes.clone());
    let report = materialize::materialize(input, output, &pipeline, &transform)?;
    print_batch_report(&report, args.report)
}

fn print_batch_report(
    report: &materialize::BatchReport,
    format: ReportFormat,
) -> Result<(), PrepError> {
    match format {
        ReportFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(report).map_err(PrepError::ReportWrite)?
        ),
        ReportFormat::Text => print!("{}", report),
    }
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), PrepError> {
    let document = ir::io_coco_json::read_coco_json(&args.input)?;

    let opts = validation::ValidateOptions {
        strict: args.strict,
        images_dir: args.images,
    };
    let report = validation::validate_document(&document, &opts);

    match args.output {
        ReportFormat::Json => println!("{}", report.to_json().map_err(PrepError::ReportWrite)?),
        ReportFormat::Text => print!("{}", report),
    }

    let has_errors = report.error_count() > 0;
    let has_warnings = report.warning_count() > 0;

    if has_errors || (opts.strict && has_warnings) {
        Err(PrepError::ValidationFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}
