use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use nearby::{
    Coordinate, FixedLocation, NearbyConfig, NearbyError, OverpassClient, PlaceCategory,
    ResultsSurface, SearchOutcome, SearchService, SearchSession, api,
    display::{JsonSurface, TerminalSurface},
    logging, web,
};

type Service = SearchService<OverpassClient, FixedLocation>;

#[derive(Parser)]
#[command(
    name = "nearby",
    version,
    about = "Find tourist attractions, hotels and restaurants near you using OpenStreetMap data"
)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single search and print the results
    Search {
        /// attraction, hotel or restaurant; anything else searches attractions
        #[arg(short, long)]
        category: Option<String>,
        #[command(flatten)]
        origin: OriginArgs,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search again for every category typed on stdin
    Interactive {
        #[command(flatten)]
        origin: OriginArgs,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Serve searches over HTTP under /api
    Serve {
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
        #[command(flatten)]
        origin: OriginArgs,
    },
}

#[derive(Args)]
struct OriginArgs {
    /// Search origin latitude (defaults to the configured location)
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    lat: Option<f64>,
    /// Search origin longitude
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lon: Option<f64>,
    /// Search radius in metres
    #[arg(short, long)]
    radius: Option<u32>,
}

impl OriginArgs {
    fn coordinate(&self) -> Option<Coordinate> {
        self.lat.zip(self.lon).map(|(lat, lon)| Coordinate::new(lat, lon))
    }
}

fn make_surface(json: bool) -> Box<dyn ResultsSurface> {
    if json {
        Box::new(JsonSurface::new(std::io::stdout()))
    } else {
        Box::new(TerminalSurface::new(std::io::stdout()))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<NearbyError>() {
                Some(nearby_error) => eprintln!("Error: {}", nearby_error.user_message()),
                None => eprintln!("Error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = NearbyConfig::load_from_path(cli.config.clone())?;
    logging::init(&config.logging, cli.verbose);

    match cli.command {
        Commands::Search {
            category,
            origin,
            json,
        } => {
            let category = category
                .as_deref()
                .map_or(config.search.default_category, PlaceCategory::from_label);
            search_once(&config, &origin, category, json).await
        }
        Commands::Interactive { origin, json } => interactive(&config, &origin, json).await,
        Commands::Serve { port, origin } => {
            let service = build_service(&config, &origin)?;
            let router = api::router(api::AppState {
                service: Arc::new(service),
                default_category: config.search.default_category,
            });
            web::run(port, router).await?;
            Ok(())
        }
    }
}

fn build_service(config: &NearbyConfig, origin: &OriginArgs) -> Result<Service> {
    let client = OverpassClient::new(&config.overpass)?;
    let coordinate = origin
        .coordinate()
        .unwrap_or_else(|| config.location.coordinate());
    if !coordinate.is_valid() {
        return Err(NearbyError::validation(format!(
            "coordinates ({}, {}) are out of range",
            coordinate.latitude, coordinate.longitude
        ))
        .into());
    }

    let radius = origin.radius.unwrap_or(config.search.radius_meters);
    if !(1..=50_000).contains(&radius) {
        return Err(NearbyError::validation("radius must be between 1 and 50000 meters").into());
    }

    Ok(SearchService::new(client, FixedLocation::new(coordinate)).with_radius(radius))
}

async fn search_once(
    config: &NearbyConfig,
    origin: &OriginArgs,
    category: PlaceCategory,
    json: bool,
) -> Result<()> {
    let service = Arc::new(build_service(config, origin)?);
    let mut session = SearchSession::open(service)
        .await
        .context("Failed to resolve search origin")?;

    let outcome = session.search(category).await;
    if let SearchOutcome::Failed(message) = outcome {
        bail!("{message}");
    }
    make_surface(json).present(session.view())?;
    Ok(())
}

enum Event {
    Settled(Option<SearchOutcome>),
    Line(Option<String>),
}

async fn interactive(config: &NearbyConfig, origin: &OriginArgs, json: bool) -> Result<()> {
    let service = Arc::new(build_service(config, origin)?);
    let mut session = SearchSession::open(service)
        .await
        .context("Failed to resolve search origin")?;
    let mut surface = make_surface(json);

    let labels: Vec<_> = PlaceCategory::ALL.iter().map(|c| c.slug()).collect();
    eprintln!(
        "Type a category ({}) and press enter to search, an empty line to repeat, 'quit' to exit.",
        labels.join(", ")
    );

    let mut current = config.search.default_category;
    session.trigger(current);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let searching = session.is_searching();
        let event = tokio::select! {
            outcome = session.settle(), if searching => Event::Settled(outcome),
            line = lines.next_line() => Event::Line(line?),
        };

        match event {
            Event::Settled(Some(outcome)) => show(&mut *surface, &session, &outcome)?,
            Event::Settled(None) => {}
            Event::Line(Some(line)) => {
                let input = line.trim();
                if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
                    finish(&mut *surface, &mut session).await?;
                    break;
                }
                if !input.is_empty() {
                    current = PlaceCategory::from_label(input);
                }
                info!("Searching {}", current.slug());
                session.trigger(current);
            }
            Event::Line(None) => {
                finish(&mut *surface, &mut session).await?;
                break;
            }
        }
    }
    Ok(())
}

/// Show the search still pending before leaving
async fn finish<S, L>(
    surface: &mut dyn ResultsSurface,
    session: &mut SearchSession<S, L>,
) -> Result<()>
where
    S: nearby::PlaceSource + 'static,
    L: nearby::LocationProvider + 'static,
{
    if let Some(outcome) = session.settle().await {
        show(surface, session, &outcome)?;
    }
    Ok(())
}

fn show<S, L>(
    surface: &mut dyn ResultsSurface,
    session: &SearchSession<S, L>,
    outcome: &SearchOutcome,
) -> Result<()>
where
    S: nearby::PlaceSource + 'static,
    L: nearby::LocationProvider + 'static,
{
    match outcome {
        SearchOutcome::Failed(message) => {
            warn!("Keeping previous results: {}", message);
            eprintln!("Search failed, showing previous results.");
        }
        SearchOutcome::Displayed(_) | SearchOutcome::Empty => {
            surface.present(session.view())?;
        }
    }
    Ok(())
}
