use clap::{Parser, ValueEnum};
use scrobble_ingest::{
    collect_enriched_scrobbles, Config, LastFmApiClientImpl, RecentTracksQuery, ScrobbleError,
    ScrobbleTable,
};
use std::path::PathBuf;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// One JSON object per scrobble
    Json,
    /// Human-readable lines
    Table,
}

/// Collect and enrich your Last.fm listening history
#[derive(Parser)]
#[command(
    name = "scrobble-ingest",
    about = "Collect and enrich your Last.fm listening history",
    long_about = None
)]
struct Cli {
    /// Credentials file with LASTFM_USER and LASTFM_KEY
    ///
    /// Defaults to ./.env, then to the per-user config directory, then to the
    /// process environment.
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Tracks requested per page
    #[arg(long, default_value = "200", value_parser = clap::value_parser!(u32).range(1..=200))]
    limit: u32,

    /// Only collect plays at or after this Unix timestamp
    #[arg(long)]
    from: Option<i64>,

    /// Only collect plays at or before this Unix timestamp
    #[arg(long)]
    to: Option<i64>,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Show detailed debug information
    #[arg(long)]
    verbose: bool,
}

fn load_config(env_file: Option<PathBuf>) -> Result<Config, ScrobbleError> {
    if let Some(path) = env_file {
        return Config::from_dotenv(path);
    }

    let candidates = std::iter::once(PathBuf::from(".env")).chain(Config::default_path());
    for path in candidates {
        if path.exists() {
            log::debug!("Using credentials from {}", path.display());
            return Config::from_dotenv(path);
        }
    }

    log::debug!("No credentials file found, using the process environment");
    Ok(Config::from_env())
}

fn print_table(table: &ScrobbleTable, format: OutputFormat) -> Result<(), ScrobbleError> {
    match format {
        OutputFormat::Json => print!("{}", table.to_json_lines()?),
        OutputFormat::Table => {
            for row in table {
                println!(
                    "{}  {} - {} [{}]",
                    row.fechahora, row.artist, row.title, row.album
                );
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stderr)
        .init();

    let config = match load_config(args.env_file) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Error: {e}");
            std::process::exit(1);
        }
    };

    let http_client = http_client::native::NativeClient::new();
    let client = match LastFmApiClientImpl::from_config(Box::new(http_client), &config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("❌ Error: {e}");
            eprintln!();
            eprintln!("Please provide the following credentials (in .env or the environment):");
            eprintln!("  LASTFM_USER=your_lastfm_username");
            eprintln!("  LASTFM_KEY=your_api_key");
            std::process::exit(1);
        }
    };

    log::info!("Collecting recent tracks for '{}'", client.username());

    let query = RecentTracksQuery::default()
        .with_limit(args.limit)
        .with_range(args.from, args.to);

    match collect_enriched_scrobbles(&client, &query).await {
        Ok(table) => {
            print_table(&table, args.format)?;
            eprintln!("Process finished. Found {} scrobbles.", table.len());
        }
        Err(ScrobbleError::NoNewData) => {
            eprintln!("No new scrobbles to add");
        }
        Err(e) => {
            eprintln!("❌ Collection failed: {e}");
            std::process::exit(1);
        }
    }

    Ok(())
}
