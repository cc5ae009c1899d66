// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Thermoscan: thermal solar-panel damage scanner
//!
//! Asks a vision model whether each thermal image shows a damaged panel,
//! prints the verdict with the panel's GPS position and keeps the raw replies.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use thermoscan::batch;
use thermoscan::config::AppConfig;
use thermoscan::gps::coordinates_from_tags;
use thermoscan::metadata::{read_exif, ExifMetadata, NO_METADATA};
use thermoscan::vision::{create_backend, BackendKind, OllamaClient};
use thermoscan::Result;

/// Thermoscan CLI - thermal solar-panel damage scanner
#[derive(Parser, Debug)]
#[command(name = "thermoscan")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version = "1.0.0")]
#[command(about = "Detect damaged solar panels in thermal images with vision models", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze every image under the input directory
    Run {
        /// Input directory (overrides config)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory for reply files (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Backend kind: gemini/remote or ollama/local (overrides config)
        #[arg(short, long)]
        backend: Option<String>,

        /// Model name for the selected backend (overrides config)
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Print all EXIF metadata of an image
    Metadata {
        /// Image to inspect
        image: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the GPS coordinates of an image
    Coords {
        /// Image to inspect
        image: PathBuf,
    },

    /// Show vision backend status
    Status,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // API keys may live in a local .env file
    dotenv::dotenv().ok();

    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Some(Commands::Run { input, output, backend, model }) => {
            run_batch(config, input, output, backend, model).await
        }
        Some(Commands::Metadata { image, json }) => run_metadata(&image, json),
        Some(Commands::Coords { image }) => run_coords(&image),
        Some(Commands::Status) => run_status(config).await,
        Some(Commands::Config { action }) => run_config_command(config, action, &cli.config),
        None => run_batch(config, None, None, None, None).await,
    }
}

/// Apply command-line overrides on top of the loaded configuration
fn apply_overrides(
    mut config: AppConfig,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    backend: Option<String>,
    model: Option<String>,
) -> Result<AppConfig> {
    if let Some(input) = input {
        config.batch.input_dir = input;
    }
    if let Some(output) = output {
        config.batch.output_dir = output;
    }
    if let Some(backend) = backend {
        config.backend.kind = backend;
    }
    if let Some(model) = model {
        match config.backend.kind.parse::<BackendKind>()? {
            BackendKind::Remote => config.backend.remote.model = model,
            BackendKind::Local => config.backend.local.model = model,
        }
    }
    Ok(config)
}

/// Run the batch over the configured input directory
async fn run_batch(
    config: AppConfig,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    backend: Option<String>,
    model: Option<String>,
) -> Result<()> {
    let config = apply_overrides(config, input, output, backend, model)?;
    let backend = create_backend(&config.backend)?;

    let mut stdout = std::io::stdout();
    let summary = batch::run(&config.batch, &config.prompt, &backend, &mut stdout).await?;

    println!(
        "\nAnalyzed {} images ({} damaged, {} in good condition)",
        summary.processed, summary.damaged, summary.undamaged
    );
    Ok(())
}

/// Print every EXIF tag of one image
fn run_metadata(image: &Path, json: bool) -> Result<()> {
    match read_exif(image)? {
        ExifMetadata::Tags(tags) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&tags)?);
            } else {
                println!("---- EXIF metadata ----");
                for (name, value) in &tags {
                    println!("{}: {}", name, value);
                }
            }
        }
        ExifMetadata::NoMetadata => println!("{}", NO_METADATA),
    }
    Ok(())
}

/// Print the decoded GPS position of one image
fn run_coords(image: &Path) -> Result<()> {
    let tags = match read_exif(image)? {
        ExifMetadata::Tags(tags) => tags,
        ExifMetadata::NoMetadata => {
            println!("{}", NO_METADATA);
            return Ok(());
        }
    };

    match coordinates_from_tags(&tags)? {
        Some(coords) => {
            println!("GPS coordinates: {}", coords);
            println!("  Latitude : {}", coords.latitude);
            println!("  Longitude: {}", coords.longitude);
        }
        None => println!("No GPS information found in the image."),
    }
    Ok(())
}

/// Run status check
async fn run_status(config: AppConfig) -> Result<()> {
    println!("Thermoscan v1.0.0 Status");
    println!("========================");

    match config.backend.kind.parse::<BackendKind>() {
        Ok(kind) => println!("Selected backend: {}", kind),
        Err(e) => println!("Selected backend: Error - {}", e),
    }

    // Remote
    let key_set = std::env::var(&config.backend.remote.api_key_env)
        .map(|k| !k.trim().is_empty())
        .unwrap_or(false);
    println!("\nGemini:");
    println!("  Model: {}", config.backend.remote.model);
    println!(
        "  API key ({}): {}",
        config.backend.remote.api_key_env,
        if key_set { "set" } else { "missing" }
    );

    // Local
    let local = &config.backend.local;
    let client = OllamaClient::new(&local.url, &local.model, Duration::from_secs(local.timeout_secs))?;
    println!("\nOllama ({}):", client.base_url());
    match client.health_check().await {
        Ok(()) => {
            println!("  Running");
            match client.list_models().await {
                Ok(models) => {
                    for m in &models {
                        let marker = if m.starts_with(local.model.as_str()) { "→" } else { " " };
                        println!("  {} {}", marker, m);
                    }
                }
                Err(e) => println!("  Error listing models: {}", e),
            }
            match client.model_available().await {
                Ok(true) => println!("  Vision model '{}' installed", local.model),
                Ok(false) => {
                    warn!("Vision model '{}' not installed. Try: ollama pull {}", local.model, local.model);
                }
                Err(e) => println!("  Error checking model: {}", e),
            }
        }
        Err(e) => println!("  Error - {}", e),
    }

    println!("\nBatch:");
    println!("  Input:  {:?}", config.batch.input_dir);
    println!("  Output: {:?}", config.batch.output_dir);
    println!("  Delay:  {}s", config.batch.request_delay_secs);

    Ok(())
}

/// Run config commands
fn run_config_command(config: AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
        ConfigCommands::Generate { output } => {
            AppConfig::default().save(&output)?;
            info!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            let kind: BackendKind = config.backend.kind.parse()?;
            println!("Configuration at {:?} is valid", config_path);
            println!("  Backend: {}", kind);
            println!("  Input: {:?}", config.batch.input_dir);
            println!("  Output: {:?}", config.batch.output_dir);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["thermoscan"]).unwrap();
        assert!(!cli.verbose);
        assert!(cli.command.is_none());
        assert_eq!(cli.config, PathBuf::from("config.json"));
    }

    #[test]
    fn test_cli_run_command() {
        let cli = Cli::try_parse_from([
            "thermoscan", "run", "--input", "placas/test", "--backend", "ollama", "--model", "llava",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Run { input, backend, model, output }) => {
                assert_eq!(input, Some(PathBuf::from("placas/test")));
                assert_eq!(backend.as_deref(), Some("ollama"));
                assert_eq!(model.as_deref(), Some("llava"));
                assert!(output.is_none());
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_metadata_command() {
        let cli = Cli::try_parse_from(["thermoscan", "metadata", "DJI_0317_T.JPG", "--json"]).unwrap();
        match cli.command {
            Some(Commands::Metadata { image, json }) => {
                assert!(json);
                assert_eq!(image, PathBuf::from("DJI_0317_T.JPG"));
            }
            _ => panic!("Expected Metadata command"),
        }
    }

    #[test]
    fn test_overrides_target_selected_backend() {
        let config = apply_overrides(
            AppConfig::default(),
            None,
            Some(PathBuf::from("out")),
            Some("local".to_string()),
            Some("llava".to_string()),
        )
        .unwrap();
        assert_eq!(config.backend.local.model, "llava");
        assert_eq!(config.backend.remote.model, "gemini-2.0-flash-exp");
        assert_eq!(config.batch.output_dir, PathBuf::from("out"));

        let config = apply_overrides(AppConfig::default(), None, None, None, Some("gemini-1.5-pro".to_string()))
            .unwrap();
        assert_eq!(config.backend.remote.model, "gemini-1.5-pro");
    }

    #[test]
    fn test_overrides_reject_unknown_backend_with_model() {
        let result = apply_overrides(
            AppConfig::default(),
            None,
            None,
            Some("openai".to_string()),
            Some("gpt".to_string()),
        );
        assert!(result.is_err());
    }
}
