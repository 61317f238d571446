use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use listing_refinery::config::constants::FETCH_TIMEOUT_SECS;
use listing_refinery::config::{ConfigError, ExtractionConfig, SegmentMode};
use listing_refinery::engine::ScrapeDispatcher;
use listing_refinery::network::ScrapeError;
use listing_refinery::ops::telemetry;
use listing_refinery::refinery::{ErrorResponse, ScrapeResponse};

#[derive(Parser)]
#[command(
    name = "listing-refinery",
    about = "Extract business listings from an HTML directory page as JSON"
)]
struct Cli {
    /// Directory page to fetch (also recorded as category_url)
    #[arg(short, long, env = "LISTING_URL")]
    url: Option<String>,

    /// Read the page from a saved HTML file instead of fetching it
    #[arg(long, value_name = "PATH")]
    html_file: Option<PathBuf>,

    /// Segmentation strategy: gap, card or auto
    #[arg(short, long, env = "LISTING_MODE")]
    mode: Option<SegmentMode>,

    /// JSON file overriding extraction thresholds and keyword data
    #[arg(short, long, env = "LISTING_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Fetch timeout in seconds
    #[arg(long, default_value_t = FETCH_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Pretty-print the JSON envelope
    #[arg(long)]
    pretty: bool,

    /// Write the response headers (content type, cache directive) to stderr
    #[arg(long)]
    headers: bool,

    /// Dump Prometheus counters to stderr on exit
    #[arg(long)]
    metrics: bool,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Human-readable logs instead of JSON
    #[arg(long)]
    pretty_logs: bool,
}

fn load_config(cli: &Cli) -> Result<ExtractionConfig, ConfigError> {
    let config = match &cli.config {
        Some(path) => ExtractionConfig::from_json_file(path)?,
        None => ExtractionConfig::default(),
    };
    Ok(match cli.mode {
        Some(mode) => config.with_mode(mode),
        None => config,
    })
}

async fn run(cli: &Cli, config: ExtractionConfig) -> Result<ScrapeResponse, ScrapeError> {
    let dispatcher = ScrapeDispatcher::with_config(config, Duration::from_secs(cli.timeout_secs))?;

    match &cli.html_file {
        Some(path) => dispatcher.scrape_saved(path, cli.url.as_deref()),
        None => dispatcher.scrape(cli.url.as_deref()).await,
    }
}

fn render(response: &ScrapeResponse, pretty: bool) -> String {
    if pretty {
        response.to_json_pretty()
    } else {
        response.to_json()
    }
}

fn print_headers(headers: &[(&str, &str)]) {
    for (name, value) in headers {
        eprintln!("{name}: {value}");
    }
}

fn fail(cli: &Cli, error: impl std::fmt::Display, code: u8) -> ExitCode {
    let response = ErrorResponse::new(error);
    if cli.headers {
        print_headers(&response.headers());
    }
    println!("{}", response.to_json());
    ExitCode::from(code)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.pretty_logs {
        telemetry::init_tracing_pretty(&cli.log_level);
    } else {
        telemetry::init_tracing_with_level(&cli.log_level);
    }

    let exit = match load_config(&cli) {
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            fail(&cli, e, 2)
        }
        Ok(config) => match run(&cli, config).await {
            Ok(response) => {
                if cli.headers {
                    print_headers(&response.headers());
                }
                println!("{}", render(&response, cli.pretty));
                ExitCode::SUCCESS
            }
            Err(e) if e.is_caller_error() => fail(&cli, e, 2),
            Err(e) => {
                tracing::error!(error = %e, "Scrape failed");
                fail(&cli, e, 1)
            }
        },
    };

    if cli.metrics {
        eprintln!("{}", telemetry::get_metrics_string());
    }
    exit
}
