mod chat;
mod render;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use fixify_core::config::{init_logging, AppConfig};
use fixify_core::location::{resolve_location, ConfiguredLocation};
use fixify_core::matcher::keywords_for;
use fixify_core::parser::parse_solution;
use fixify_core::schema::Coordinates;
use fixify_core::session::QUICK_PROBLEMS;
use fixify_core::speech::Narrator;
use fixify_core::{Catalog, Reply, Session};
use tokio::io::AsyncReadExt;
use tracing::info;

use crate::chat::{think, Chat};
use crate::render::render_solution;

#[derive(Parser)]
#[command(name = "fixify", about = "Friendly tech support in simple steps")]
struct Cli {
    /// Config file to use instead of ~/.fixify/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Talk through problems interactively (default when no subcommand given)
    Chat,
    /// Get step-by-step help for one problem
    Ask {
        /// Describe what's wrong
        #[arg(required = true)]
        problem: Vec<String>,
        /// Read the answer aloud
        #[arg(long)]
        speak: bool,
        /// Latitude for the repair-center search
        #[arg(long, requires = "lng", allow_negative_numbers = true)]
        lat: Option<f64>,
        /// Longitude for the repair-center search
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lng: Option<f64>,
        /// Print the reply as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the quick-help problems, or ask one by number
    Quick {
        /// Number shown in the list (1-6)
        index: Option<usize>,
    },
    /// Decode a solution text into JSON (reads stdin when no file is given)
    Parse {
        file: Option<PathBuf>,
    },
    /// List the troubleshooting scripts and the keywords that select them
    Scripts,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging("warn");

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    let catalog_path = config.catalog_path()?;
    let catalog = Arc::new(Catalog::resolve(catalog_path.as_deref())?);
    info!(custom_catalog = catalog_path.is_some(), "catalog loaded");

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => Chat::new(config, catalog)?.run().await,
        Command::Ask {
            problem,
            speak,
            lat,
            lng,
            json,
        } => {
            let coordinates = match (lat, lng) {
                (Some(latitude), Some(longitude)) => Some(Coordinates {
                    latitude,
                    longitude,
                }),
                _ => None,
            };
            run_ask(&config, catalog, &problem.join(" "), coordinates, speak, json).await
        }
        Command::Quick { index: None } => {
            print!("{}", chat::quick_menu());
            Ok(())
        }
        Command::Quick { index: Some(n) } => {
            let problem = n
                .checked_sub(1)
                .and_then(|i| QUICK_PROBLEMS.get(i))
                .ok_or_else(|| {
                    anyhow::anyhow!("quick problem must be between 1 and {}", QUICK_PROBLEMS.len())
                })?;
            run_ask(&config, catalog, problem.problem, None, false, false).await
        }
        Command::Parse { file } => run_parse(file).await,
        Command::Scripts => {
            print_scripts(&catalog);
            Ok(())
        }
    }
}

async fn run_ask(
    config: &AppConfig,
    catalog: Arc<Catalog>,
    problem: &str,
    coordinates: Option<Coordinates>,
    speak: bool,
    json: bool,
) -> anyhow::Result<()> {
    let mut session = Session::new(catalog);
    // Flags count as consent; otherwise only coordinates the config shares.
    let provider = match coordinates {
        Some(c) => ConfiguredLocation::new(Some(c)),
        None => ConfiguredLocation::from_config(&config.location),
    };
    session.set_location(resolve_location(&provider));

    let reply: Reply = session.submit(problem)?.clone();

    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
    } else {
        think(config.ui.thinking_delay_ms).await;
        let parsed = parse_solution(&reply.solution)?;
        println!("{}", render_solution(&parsed, config.ui.show_resources));
        if reply.offers_repair_centers {
            if let Some(url) = session.repair_search_url(config.location.zoom) {
                println!("Repair centers: {url}");
            }
        }
    }

    if speak {
        let narrator = Narrator::from_config(&config.speech)?;
        narrator.speak(&reply.solution).await?;
        narrator.wait().await?;
    }
    Ok(())
}

async fn run_parse(file: Option<PathBuf>) -> anyhow::Result<()> {
    let text = match file {
        Some(path) => tokio::fs::read_to_string(&path).await?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
    };
    let parsed = parse_solution(&text)?;
    println!("{}", serde_json::to_string_pretty(&parsed)?);
    Ok(())
}

fn print_scripts(catalog: &Catalog) {
    for (category, script) in catalog.iter() {
        let name = category.map(|c| c.as_str()).unwrap_or("fallback");
        let keywords = match category {
            Some(c) => keywords_for(c).join(", "),
            None => "(anything else)".to_string(),
        };
        println!(
            "{name:<13} {} steps, {:<8} {keywords}",
            script.steps.len(),
            format!("{:?}", script.severity).to_lowercase()
        );
    }
}
