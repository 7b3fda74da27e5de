//! Command-line search for nearby points of interest.
//!
//! Resolves categories from free text, queries Overpass within a bounding box
//! and writes an HTML map of the features that have a neighbour close by.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use poimap::config::Config;
use poimap::models::{BoundingBox, CategoryRegistry, Coordinate};
use poimap::overpass::OverpassClient;
use poimap::render::{default_map_name, LeafletMap};
use poimap::resolver::{CategoryResolver, MatchMode};
use poimap::{run_search, SearchRequest, SearchSettings};

#[derive(Parser, Debug)]
#[command(name = "poimap")]
#[command(about = "Map points of interest that sit close to each other")]
struct Args {
    /// What to look for, e.g. "a park near a cafe"
    #[arg(required_unless_present = "list_categories")]
    text: Option<String>,

    /// Bounding box: "minLat,minLon,maxLat,maxLon"
    #[arg(long, required_unless_present = "list_categories")]
    bbox: Option<BoundingBox>,

    /// Maximum distance in feet between neighbouring features
    #[arg(long)]
    threshold_feet: Option<f64>,

    /// Output HTML file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Name the output after the resolved categories
    #[arg(long)]
    name_from_query: bool,

    /// Synonym matching mode
    #[arg(long, value_enum)]
    match_mode: Option<MatchMode>,

    /// Overpass interpreter URL
    #[arg(long)]
    endpoint: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the category registry and exit
    #[arg(long)]
    list_categories: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Loading {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(endpoint) = &args.endpoint {
        config.overpass.endpoint = endpoint.clone();
    }
    if let Some(mode) = args.match_mode {
        config.proximity.match_mode = mode;
    }

    let registry = config.registry()?;

    if args.list_categories {
        print_categories(&registry);
        return Ok(());
    }

    let (Some(text), Some(bbox)) = (args.text, args.bbox) else {
        anyhow::bail!("both a search text and --bbox are required");
    };

    let output = match args.output {
        Some(path) => path,
        None if args.name_from_query => {
            let resolver = CategoryResolver::new(&registry, config.proximity.match_mode)?;
            PathBuf::from(default_map_name(&resolver.resolve(&text)))
        }
        None => config.map.output.clone(),
    };

    let request = SearchRequest {
        text,
        bbox,
        proximity_threshold_feet: args
            .threshold_feet
            .unwrap_or(config.proximity.threshold_feet),
        output_path: output,
    };
    let settings = SearchSettings {
        match_mode: config.proximity.match_mode,
        zoom: config.map.zoom,
        index_above: config.proximity.index_above,
        server_timeout_secs: config.overpass.timeout_secs,
    };

    let client = OverpassClient::new(
        config.endpoint_url()?,
        &config.overpass.user_agent,
        config.http_timeout(),
    )
    .context("Failed to create HTTP client")?;

    info!("Poimap search in {}", request.bbox);
    debug!("{:?}", request);

    let fit_bounds = config.map.fit_bounds;
    let new_map = move |center: Coordinate, zoom: u8| {
        LeafletMap::new(center, zoom).with_fit_bounds(fit_bounds)
    };

    // Every search outcome is reported on the console; none changes the exit status
    match run_search(&client, &registry, &settings, &request, new_map).await {
        Ok(outcome) => println!("{}", outcome.user_message()),
        Err(e) => {
            debug!("Search failed: {:?}", e);
            println!("{}", e.user_message());
        }
    }

    Ok(())
}

fn print_categories(registry: &CategoryRegistry) {
    for category in registry.iter() {
        println!(
            "{:<16} {:<10} {}",
            category.label, category.color, category.query_fragment
        );
        println!("    {}", category.synonyms.join(", "));
    }
}
