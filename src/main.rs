use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use convention_router::config::{load_config, validate_config, ApiConfig};
use convention_router::discovery::{collect, Collection};
use convention_router::observability::init_logging;

#[derive(Parser)]
#[command(name = "api-routes")]
#[command(about = "Inspect a convention-routed API tree", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// API root directory, overriding the configuration.
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List discovered routes in registration order
    Routes {
        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate the configuration
    Check,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => ApiConfig::default(),
    };
    if let Some(root) = cli.root {
        config.discovery.root = root;
    }

    init_logging(&config.observability);

    match cli.command {
        Commands::Routes { json } => {
            let collection = collect(&config.discovery.mapping_rules(), &config.discovery.root);
            if json {
                match serde_json::to_string_pretty(&collection) {
                    Ok(text) => println!("{}", text),
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        return ExitCode::FAILURE;
                    }
                }
            } else {
                print_routes(&collection);
            }
            if collection.walk_errors.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Commands::Check => match validate_config(&config) {
            Ok(()) => {
                println!("Configuration OK (API root: {})", config.discovery.root.display());
                ExitCode::SUCCESS
            }
            Err(errors) => {
                for err in errors {
                    eprintln!("Error: {}", err);
                }
                ExitCode::FAILURE
            }
        },
    }
}

fn print_routes(collection: &Collection) {
    let width = collection
        .entries
        .iter()
        .map(|e| e.route_pattern.len())
        .max()
        .unwrap_or(0);

    for entry in &collection.entries {
        println!("{:width$}  {}", entry.route_pattern, entry.module_key, width = width);
    }
    println!("{:width$}  (catch-all, 400 Method Not Implemented)", "*", width = width);

    for shadowed in &collection.shadowed {
        println!(
            "shadowed: {} {} (by {})",
            shadowed.entry.route_pattern, shadowed.entry.module_key, shadowed.shadowed_by
        );
    }
    for err in &collection.walk_errors {
        eprintln!("Error: {}", err);
    }
}
