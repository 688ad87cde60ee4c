//! puncta CLI: command-line interface for punctate-structure segmentation.

use clap::{Args, Parser, Subcommand, ValueEnum};
use ndarray::Axis;
use std::path::{Path, PathBuf};

use puncta::{
    read_volume, write_segmentation, OutputMode, RunSummary, Segmentation, SegmentationOutput,
    Segmenter, TiffDiagnosticsSink, WorkflowConfig,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "puncta")]
#[command(about = "Segment punctate sub-cellular structures (SLC25A17) in 3D fluorescence stacks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment a single multi-page TIFF volume.
    Segment(CliSegmentArgs),

    /// Segment every TIFF volume in a directory.
    Batch(CliBatchArgs),

    /// Print the workflow parameters as JSON.
    Params {
        /// Workflow configuration JSON to load instead of the preset.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
struct CliSegmentArgs {
    /// Path to the input volume (multi-page TIFF, one page per slice).
    #[arg(long)]
    input: PathBuf,

    /// Output directory.
    #[arg(long)]
    out_dir: PathBuf,

    /// Output base name (defaults to the input file stem).
    #[arg(long)]
    base_name: Option<String>,

    /// XY resampling ratio applied after normalization; 0 or less disables it.
    #[arg(long)]
    rescale_ratio: Option<f32>,

    /// Workflow configuration JSON (missing fields take preset values).
    #[arg(long)]
    config: Option<PathBuf>,

    /// What to produce.
    #[arg(long, value_enum, default_value_t = ModeArg::Default)]
    mode: ModeArg,

    /// Path to write a run summary (JSON).
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// Path to write a max-intensity projection of the final mask (PNG).
    #[arg(long)]
    preview: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct CliBatchArgs {
    /// Directory holding `.tif`/`.tiff` volumes.
    #[arg(long)]
    input_dir: PathBuf,

    /// Output directory.
    #[arg(long)]
    out_dir: PathBuf,

    /// XY resampling ratio applied after normalization; 0 or less disables it.
    #[arg(long)]
    rescale_ratio: Option<f32>,

    /// Workflow configuration JSON (missing fields take preset values).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    /// Save the final mask as `<base><suffix>.tiff`.
    Default,
    /// Keep the mask in memory and report statistics only.
    Array,
    /// Also write the inner contour as `<base>_contour.tiff`.
    ArrayWithContour,
    /// Write every named intermediate as `<base>_<name>.tiff`.
    Customize,
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Segment(args) => run_segment(&args),
        Commands::Batch(args) => run_batch(&args),
        Commands::Params { config } => run_params(config.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> CliResult<WorkflowConfig> {
    match path {
        Some(p) => {
            tracing::info!("Loading configuration: {}", p.display());
            Ok(WorkflowConfig::from_json_file(p)?)
        }
        None => Ok(WorkflowConfig::default()),
    }
}

fn file_stem(path: &Path) -> CliResult<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .ok_or_else(|| -> CliError {
            format!("cannot derive a base name from {}", path.display()).into()
        })
}

// ── params ─────────────────────────────────────────────────────────────

fn run_params(config: Option<&Path>) -> CliResult<()> {
    let config = load_config(config)?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

// ── segment ────────────────────────────────────────────────────────────

fn run_segment(args: &CliSegmentArgs) -> CliResult<()> {
    let segmenter = Segmenter::new(load_config(args.config.as_deref())?);
    let base_name = match &args.base_name {
        Some(name) => name.clone(),
        None => file_stem(&args.input)?,
    };

    tracing::info!("Loading volume: {}", args.input.display());
    let volume = read_volume(&args.input)?;
    let (d, h, w) = volume.dim();
    tracing::info!("Volume size: {}x{}x{}", d, h, w);

    let stages = segmenter.segment_stages(&volume, args.rescale_ratio)?;
    let stats = stages.stats.clone();
    tracing::info!(
        "Segmented {} instances ({} foreground voxels)",
        stats.instances,
        stats.foreground_voxels,
    );

    if let Some(preview_path) = &args.preview {
        write_preview(preview_path, &stages.segmentation)?;
        tracing::info!("Preview written to {}", preview_path.display());
    }

    let mut sink = TiffDiagnosticsSink::new();
    let mode = match args.mode {
        ModeArg::Default => OutputMode::Save {
            output_dir: &args.out_dir,
            base_name: &base_name,
        },
        ModeArg::Array => OutputMode::Array,
        ModeArg::ArrayWithContour => OutputMode::ArrayWithContour,
        ModeArg::Customize => OutputMode::Customize {
            output_dir: &args.out_dir,
            base_name: &base_name,
            sink: &mut sink,
        },
    };

    match segmenter.emit(stages, mode)? {
        SegmentationOutput::Saved { path } => {
            tracing::info!("Segmentation written to {}", path.display());
        }
        SegmentationOutput::Array(seg) => {
            tracing::info!("Segmentation kept in memory: {:?}", seg.dim());
        }
        SegmentationOutput::ArrayWithContour { contour, .. } => {
            std::fs::create_dir_all(&args.out_dir)?;
            let path = args.out_dir.join(format!("{base_name}_contour.tiff"));
            write_segmentation(&path, &contour)?;
            tracing::info!("Contour written to {}", path.display());
        }
        SegmentationOutput::Customized => {
            tracing::info!(
                "{} intermediates written to {}",
                sink.written().len(),
                args.out_dir.display()
            );
        }
    }

    if let Some(summary_path) = &args.summary_json {
        let summary = RunSummary::new(
            Some(args.input.display().to_string()),
            (d, h, w),
            args.rescale_ratio,
            segmenter.config(),
            &stats,
        );
        std::fs::write(summary_path, serde_json::to_string_pretty(&summary)?)?;
        tracing::info!("Summary written to {}", summary_path.display());
    }

    Ok(())
}

/// Max projection along depth, saved as an 8-bit PNG.
fn write_preview(path: &Path, segmentation: &Segmentation) -> CliResult<()> {
    let projection = segmentation.fold_axis(Axis(0), 0u8, |&acc, &v| acc.max(v));
    let (h, w) = projection.dim();
    let img = image::GrayImage::from_fn(w as u32, h as u32, |x, y| {
        image::Luma([projection[[y as usize, x as usize]]])
    });
    img.save(path)?;
    Ok(())
}

// ── batch ──────────────────────────────────────────────────────────────

fn is_tiff(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("tif") || e.eq_ignore_ascii_case("tiff"))
}

fn run_batch(args: &CliBatchArgs) -> CliResult<()> {
    let segmenter = Segmenter::new(load_config(args.config.as_deref())?);

    let mut inputs: Vec<PathBuf> = std::fs::read_dir(&args.input_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_tiff(p))
        .collect();
    inputs.sort();
    tracing::info!(
        "Found {} volumes in {}",
        inputs.len(),
        args.input_dir.display()
    );

    let mut failed = 0usize;
    for input in &inputs {
        let result = file_stem(input).and_then(|base_name| {
            let volume = read_volume(input)?;
            let out = segmenter.segment(
                &volume,
                args.rescale_ratio,
                OutputMode::Save {
                    output_dir: &args.out_dir,
                    base_name: &base_name,
                },
            )?;
            Ok(out)
        });
        match result {
            Ok(SegmentationOutput::Saved { path }) => {
                tracing::info!("{} -> {}", input.display(), path.display());
            }
            Ok(_) => {}
            Err(e) => {
                failed += 1;
                tracing::warn!(input = %input.display(), error = %e, "segmentation failed");
            }
        }
    }

    if failed > 0 {
        return Err(format!("{failed} of {} volumes failed", inputs.len()).into());
    }
    Ok(())
}
