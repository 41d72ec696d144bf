use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use descriptor_pool_core::{
    AppConfig, Destination, Exporter, FrameAnalyzer, OutputFormat, Pool, PoolError, Real,
};
use tracing_subscriber::EnvFilter;

fn main() -> descriptor_pool_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => run_analyze(&args),
    }
}

fn run_analyze(args: &AnalyzeArgs) -> descriptor_pool_core::Result<()> {
    let config = args.resolve_config()?;
    tracing::info!(input = ?args.input, output = %args.output, "running analysis");

    let left = read_samples(&args.input)?;
    let mut analyzer = FrameAnalyzer::new(config.analysis)?;
    let mut pool = Pool::new();

    let summary = match &args.right {
        Some(path) => {
            let right = read_samples(path)?;
            analyzer.analyze_stereo(&left, &right, &mut pool)?
        }
        None => analyzer.analyze(&left, &mut pool)?,
    };
    tracing::info!(
        frames = summary.frame_count,
        duration = summary.duration_seconds,
        "analysis complete"
    );

    let destination = output_destination(&args.output)?;
    Exporter::from_config(&config.export).export_to_destination(&pool, &destination)
}

/// `-` selects standard output; anything else is a file path.
fn output_destination(output: &str) -> descriptor_pool_core::Result<Destination> {
    match output {
        "-" => Ok(Destination::Stdout),
        path => Destination::parse(path),
    }
}

/// Reads whitespace separated samples from a text file.
fn read_samples(path: &Path) -> descriptor_pool_core::Result<Vec<Real>> {
    let text = std::fs::read_to_string(path)?;
    parse_samples(&text).map_err(|token| {
        PoolError::msg(format!(
            "{}: `{token}` is not a number",
            path.display()
        ))
    })
}

fn parse_samples(text: &str) -> Result<Vec<Real>, String> {
    text.split_whitespace()
        .map(|token| token.parse::<Real>().map_err(|_| token.to_string()))
        .collect()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Audio descriptor pool exporter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyse a sample file and export the descriptor pool.
    Analyze(AnalyzeArgs),
}

#[derive(clap::Args, Debug)]
struct AnalyzeArgs {
    /// Text file holding whitespace separated samples (left channel when
    /// `--right` is given).
    input: PathBuf,
    /// Output document path, or `-` for standard output.
    output: String,
    /// Right channel samples; enables stereo analysis.
    #[arg(long)]
    right: Option<PathBuf>,
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(long)]
    sample_rate: Option<u32>,
    #[arg(long)]
    frame_size: Option<usize>,
    #[arg(long)]
    hop_size: Option<usize>,
    /// Key prefix for every descriptor.
    #[arg(long)]
    namespace: Option<String>,
    /// Version string written to the metadata block.
    #[arg(long = "descriptor-version")]
    descriptor_version: Option<String>,
    /// Output flavour: `yaml` or `json`.
    #[arg(long)]
    format: Option<OutputFormat>,
}

impl AnalyzeArgs {
    /// Loads the configuration file, if any, and applies flag overrides.
    fn resolve_config(&self) -> descriptor_pool_core::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };

        if let Some(sample_rate) = self.sample_rate {
            config.analysis.sample_rate = sample_rate;
        }
        if let Some(frame_size) = self.frame_size {
            config.analysis.frame_size = frame_size;
        }
        if let Some(hop_size) = self.hop_size {
            config.analysis.hop_size = hop_size;
        }
        if let Some(namespace) = &self.namespace {
            config.analysis.namespace = namespace.clone();
        }
        if let Some(version) = &self.descriptor_version {
            config.export.version = version.clone();
        }
        if let Some(format) = self.format {
            config.export.format = format;
        }
        Ok(config)
    }
}
