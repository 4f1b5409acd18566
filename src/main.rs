//! Sublime water-level service - command-line front end
//!
//! Bootstraps the service registry the same way the app does at launch,
//! then resolves use cases from it to answer one command:
//!
//!   cargo run -- levels                   # latest report per station
//!   cargo run -- history 3250 --span 7    # history for one station
//!   cargo run -- favorite 3250            # toggle a favorite station
//!   cargo run -- favorites                # list favorite stations
//!   cargo run -- registry                 # list registered services
//!
//! Environment:
//!   SUBLIME_CONFIG - path to the config file (default: sublime.toml)
//!   RUST_LOG       - log filter (default: info)

use clap::{Parser, Subcommand};
use std::env;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use sublime_service::bootstrap::{DependencyInjector, PARAM_SPAN_DAYS};
use sublime_service::config::{self, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use sublime_service::locator::{Parameters, ServiceRegistry};
use sublime_service::water_levels::directory::StationDirectory;
use sublime_service::water_levels::use_cases::{
    GetFavoriteStatusUseCase, GetHistoricalDataUseCase, GetWaterLevelsUseCase,
    ToggleFavoriteStationUseCase,
};

#[derive(Debug, Parser)]
#[command(name = "sublime_service", about = "River water levels from the hydrology feed")]
struct Cli {
    /// Config file (overrides SUBLIME_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Latest report for every station
    Levels,
    /// Historical observations for one station
    History {
        station_code: String,
        /// Span in days: 0 (latest), 1, 7 or 30
        #[arg(long)]
        span: Option<u64>,
    },
    /// Toggle a station's favorite status
    Favorite { station_code: String },
    /// List favorite stations
    Favorites,
    /// List registered services
    Registry,
}

fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("\n❌ {}\n", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = cli
        .config
        .or_else(|| env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = config::load_config_or_default(&config_path)?;

    // One registry for the whole process, handed to everything below.
    let registry = ServiceRegistry::new();
    DependencyInjector::new(config).bootstrap(&registry)?;

    match cli.command {
        Command::Levels => print_levels(&registry),
        Command::History { station_code, span } => print_history(&registry, &station_code, span),
        Command::Favorite { station_code } => toggle_favorite(&registry, &station_code),
        Command::Favorites => print_favorites(&registry),
        Command::Registry => {
            print_registry(&registry);
            Ok(())
        }
    }
}

fn print_levels(registry: &ServiceRegistry) -> Result<(), Box<dyn std::error::Error>> {
    let use_case: GetWaterLevelsUseCase = registry.resolve_type()?;
    let favorites: GetFavoriteStatusUseCase = registry.resolve_type()?;

    println!("🌊 Water levels");
    println!("===============\n");
    for report in use_case.execute()? {
        let star = if favorites.execute(&report.station_code)? { "★" } else { " " };
        println!(
            "{} {:>5}  {:<20} {:<12} {:>6.0} cm  {:>7.1} m³/s  {:>5.1} °C  {}",
            star,
            report.station_code,
            report.waterbody,
            report.station,
            report.depth,
            report.speed,
            report.temperature,
            report.flow
        );
    }
    Ok(())
}

fn print_history(
    registry: &ServiceRegistry,
    station_code: &str,
    span: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    let parameters = span.map(|days| Parameters::new().with(PARAM_SPAN_DAYS, days));
    let use_case: GetHistoricalDataUseCase = registry.resolve(None, parameters.as_ref())?;
    let directory: Arc<StationDirectory> = registry.resolve_type()?;

    println!(
        "📈 {} (span: {} day(s))\n",
        directory.label_for(station_code),
        use_case.default_span().days()
    );
    for point in use_case.execute(None, station_code)? {
        println!(
            "   {}  {:>5} cm  {:>7.1} m³/s  {:>5.1} °C",
            point.record_date, point.depth, point.speed, point.temperature
        );
    }
    Ok(())
}

fn toggle_favorite(
    registry: &ServiceRegistry,
    station_code: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let use_case: ToggleFavoriteStationUseCase = registry.resolve_type()?;
    let directory: Arc<StationDirectory> = registry.resolve_type()?;

    let label = directory.label_for(station_code);
    if use_case.execute(station_code)? {
        println!("★ Added {} to favorites", label);
    } else {
        println!("☆ Removed {} from favorites", label);
    }
    Ok(())
}

fn print_favorites(registry: &ServiceRegistry) -> Result<(), Box<dyn std::error::Error>> {
    let use_case: GetFavoriteStatusUseCase = registry.resolve_type()?;
    let directory: Arc<StationDirectory> = registry.resolve_type()?;

    let favorites = use_case.favorites()?;
    if favorites.is_empty() {
        println!("No favorite stations yet. Add one with: favorite <station_code>");
        return Ok(());
    }
    for code in favorites {
        println!("★ {:>5}  {}", code, directory.label_for(&code));
    }
    Ok(())
}

fn print_registry(registry: &ServiceRegistry) {
    println!("📋 Registered services ({})\n", registry.len());
    for row in registry.describe() {
        println!("   [{:<7}] {}", row.strategy.to_string(), row.key);
        for capability in row.capabilities {
            println!("             provides {}", capability);
        }
    }
}
