use c64image::color::{Compatibility, Metric};
use c64image::config::{self, Config};
use c64image::imaging::supported_input_extensions;
use c64image::process::{self, ProcessOptions};
use c64image::{output, scan};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "c64image")]
#[command(about = "Convert photos into Commodore 64 style 16-color images")]
#[command(long_about = "\
Convert photos into Commodore 64 style 16-color images

Every source image is scaled to 320 pixels wide (height keeps the aspect
ratio), sampled at 160 blocks per row, and each block is replaced by the
closest of the 16 C64 colors. Blocks are written as two identical pixels,
like the C64's multicolor bitmap mode.

One output is written per distance metric:

  rgb      squared RGB difference           c64_<stem>_RGB.png
  cie76    Euclidean distance in L*a*b*     c64_<stem>_CIE76.png
  cie94    CIE94, graphic arts weights      c64_<stem>_CIE94.png
  cie2000  CIEDE2000                        c64_<stem>_CIE2000.png

Unchanged images are skipped on later runs (see .c64image-cache.json in the
output directory).

Run 'c64image gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Source image or directory of images
    #[arg(long, default_value = ".", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "c64", global = true)]
    output: PathBuf,

    /// Config file (default: config.toml in the source directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert every source image under each selected metric
    Convert(ConvertArgs),
    /// Decode every source image and show its conversion geometry
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Metric to convert with; repeat for several (overrides config)
    #[arg(long = "metric", value_name = "METRIC")]
    metrics: Vec<Metric>,

    /// Reproduce the palette choices of earlier releases
    #[arg(long)]
    legacy: bool,

    /// Disable the conversion cache and convert every image
    #[arg(long)]
    no_cache: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "c64image=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match cli.command {
        Command::Convert(args) => {
            let config = load_config(&cli.source, cli.config.as_deref())?;
            let images = scan::scan(&cli.source, &scan_options(&config))?;
            output::print_scan_output(&images, &cli.source);

            let mut options = ProcessOptions::from_config(&config);
            if !args.metrics.is_empty() {
                options.metrics = dedup(args.metrics);
            }
            if args.legacy {
                options.compatibility = Compatibility::Legacy;
            }
            options.use_cache = !args.no_cache;

            init_thread_pool(&config.processing);
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_process_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = process::process(&images, &cli.output, &options, Some(tx))?;
            if printer.join().is_err() {
                warn!("output thread panicked");
            }

            for line in output::format_process_summary(&result, &cli.output) {
                println!("{}", line);
            }
            Ok(if result.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Check => {
            let config = load_config(&cli.source, cli.config.as_deref())?;
            let images = scan::scan(&cli.source, &scan_options(&config))?;
            println!("==> Checking {}", cli.source.display());
            init_thread_pool(&config.processing);
            let report = process::check(&images);
            output::print_check_output(&report);
            Ok(if report.iter().all(|r| r.outcome.is_ok()) {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Load `--config` if given, else `config.toml` next to the source.
fn load_config(source: &Path, explicit: Option<&Path>) -> Result<Config, config::ConfigError> {
    let config = match explicit {
        Some(path) => config::load_config_file(path)?,
        None => {
            let dir = if source.is_file() {
                source.parent().unwrap_or(Path::new("."))
            } else {
                source
            };
            config::load_config(dir)?
        }
    };

    for ext in config.input.normalized_extensions() {
        if !supported_input_extensions().contains(&ext.as_str()) {
            warn!(extension = %ext, "no decoder compiled in for configured extension");
        }
    }
    Ok(config)
}

fn scan_options(config: &Config) -> scan::ScanOptions {
    scan::ScanOptions {
        extensions: config.input.normalized_extensions(),
        recursive: config.input.recursive,
        output_prefix: config.output.prefix.clone(),
    }
}

/// Drop repeated `--metric` values, keeping first occurrences in order.
fn dedup(metrics: Vec<Metric>) -> Vec<Metric> {
    let mut unique = Vec::with_capacity(metrics.len());
    for metric in metrics {
        if !unique.contains(&metric) {
            unique.push(metric);
        }
    }
    unique
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
