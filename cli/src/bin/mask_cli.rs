use clap::{Parser, Subcommand, ValueEnum};
use cli::{load_script, TraceConfig};
use color_eyre::eyre::{eyre, Result};
use mask::{erode, CommandOutput, MaskCommand, MaskEditor, RasterMask};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    /// Standalone SVG document
    Svg,
    /// Polygons with holes as a GeoJSON feature collection
    Geojson,
    /// Bare SVG path data
    Path,
}

#[derive(Subcommand)]
enum Commands {
    /// Trace a mask image into a vector outline
    Trace {
        /// Grayscale mask image
        #[arg(short, long)]
        input: PathBuf,
        /// Where to write the outline
        #[arg(short, long)]
        output: PathBuf,
        /// Trace configuration (.toml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value = "svg")]
        format: OutputFormat,
    },
    /// Shrink a mask with a circular element
    Erode {
        #[arg(short, long)]
        input: PathBuf,
        /// Element radius in pixels
        #[arg(short, long, default_value = "6")]
        radius: u32,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Apply a JSON script of mask commands
    Run {
        #[arg(short, long)]
        input: PathBuf,
        /// JSON array of commands (see the `schema` subcommand)
        #[arg(short, long)]
        script: PathBuf,
        /// Edited mask image
        #[arg(short, long)]
        output: PathBuf,
        /// Write trace results produced by the script here as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Print the JSON schema of the command script format
    Schema,
    /// Write a default trace configuration
    InitConfig {
        /// Destination (.toml or .json)
        #[arg(short, long, default_value = "trace.toml")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Trace { input, output, config, format } => {
            trace_mask(input, output, config.as_deref(), *format)?;
        }
        Commands::Erode { input, radius, output } => {
            let mask = RasterMask::open(input)?;
            let eroded = erode(&mask, *radius);
            eroded.save(output)?;
            info!(
                before = mask.count_above(mask::DEFAULT_THRESHOLD),
                after = eroded.count_above(mask::DEFAULT_THRESHOLD),
                "eroded mask written to {}",
                output.display()
            );
        }
        Commands::Run { input, script, output, report } => {
            run_script(input, script, output, report.as_deref())?;
        }
        Commands::Schema => {
            println!("{}", serde_json::to_string_pretty(&MaskCommand::schema())?);
        }
        Commands::InitConfig { output } => {
            TraceConfig::default().to_file(output)?;
            info!("default trace configuration written to {}", output.display());
        }
    }

    Ok(())
}

fn trace_mask(input: &Path, output: &Path, config: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = match config {
        Some(path) => TraceConfig::from_file(path)?,
        None => TraceConfig::default(),
    };
    let mask = RasterMask::open(input)?;
    let pipeline = config.pipeline();
    info!("{}", pipeline.info());

    let outline = pipeline.process(&mask)?;
    if outline.is_empty() {
        warn!("no region found in {}", input.display());
    }
    info!(shapes = outline.shapes.len(), "traced {}", input.display());

    let transform = config.transform_for(&mask)?;
    let content = match format {
        OutputFormat::Geojson => {
            let outline = match &transform {
                Some(t) => mask::ComputedOutline {
                    shapes: outline.shapes.iter().map(|s| t.shape_to_display(s)).collect(),
                    ..outline
                },
                None => outline,
            };
            outline.to_geojson_string()?
        }
        OutputFormat::Path | OutputFormat::Svg => {
            let mut path = pipeline.to_vector_path(&outline);
            if let Some(t) = &transform {
                path = t.path_to_display(&path);
            }
            match format {
                OutputFormat::Path => path.to_svg(),
                _ => {
                    let (width, height) = match &transform {
                        Some(t) => (t.display_width, t.display_height),
                        None => (f64::from(mask.width()), f64::from(mask.height())),
                    };
                    svg_document(&path.to_svg(), width, height)
                }
            }
        }
    };

    fs::write(output, content)?;
    info!("✅ Outline written to {}", output.display());
    Ok(())
}

fn svg_document(path_data: &str, width: f64, height: f64) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">\n  \
         <path d=\"{path_data}\" fill=\"rgba(0,255,100,0.25)\" stroke=\"rgb(0,255,100)\" fill-rule=\"evenodd\"/>\n</svg>\n"
    )
}

fn run_script(input: &Path, script: &Path, output: &Path, report: Option<&Path>) -> Result<()> {
    let commands = load_script(script)?;
    info!("running {} commands on {}", commands.len(), input.display());

    let mut editor = MaskEditor::new();
    editor.load_mask(input)?;

    let mut traces = Vec::new();
    for command in commands {
        info!(command = %command, "{}", command.description());
        match editor.execute(command)? {
            CommandOutput::Mask { coverage, .. } => info!(coverage, "mask updated"),
            traced => traces.push(traced),
        }
    }

    let mask = editor.into_mask().ok_or_else(|| eyre!("no mask loaded"))?;
    mask.save(output)?;
    info!("edited mask written to {}", output.display());

    match report {
        Some(path) => {
            fs::write(path, serde_json::to_string_pretty(&traces)?)?;
            info!(traces = traces.len(), "trace report written to {}", path.display());
        }
        None if !traces.is_empty() => {
            warn!(traces = traces.len(), "script produced traces but no --report path was given");
        }
        None => {}
    }
    Ok(())
}
