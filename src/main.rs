use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nodescout::config::Config;
use nodescout::selector::{Intent, ToolContext};
use nodescout::startup::{init_logging, StartupLogger};
use nodescout::ScoutService;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
#[command(version)]
struct Cli {
    /// Configuration file path (defaults to $NODESCOUT_CONFIG_PATH, then nodescout.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one discovery pass and print the summary
    Discover {
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rank the available capabilities for a request
    Select {
        /// Free-text query
        #[arg(short, long)]
        query: Option<String>,
        /// discovery, execution, validation, analysis or troubleshooting
        #[arg(short, long)]
        intent: Option<Intent>,
        /// Maximum number of items
        #[arg(short, long)]
        max: Option<usize>,
        /// Category that earns a bonus
        #[arg(long)]
        category: Option<String>,
        /// Score threshold override
        #[arg(long)]
        threshold: Option<f64>,
        /// Print the full selection as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate the configuration and exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
        config.logging.validate()?;
    }

    init_logging(&config.logging)?;
    StartupLogger::display_startup_info(&config, cli.config.as_deref(), nodescout::VERSION);

    match cli.command {
        Command::CheckConfig => {
            info!("✅ Configuration is valid");
            println!("{}", serde_yaml::to_string(&config)?);
        }
        Command::Discover { json } => {
            let service = ScoutService::from_config(&config).await?;
            let result = service.run_discovery().await.map_err(|e| {
                error!("Discovery failed: {}", e);
                e
            })?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                let stats = &result.stats;
                println!(
                    "Discovered {} capabilities ({} candidates, {} rejected, {} errors, confidence {:.2})",
                    stats.discovered, stats.unique_candidates, stats.rejected, stats.errors, stats.confidence
                );
                for warning in &stats.warnings {
                    println!("  warning: {}", warning);
                }
                for descriptor in &result.descriptors {
                    println!("  {:<45} {:<14} {}", descriptor.id, descriptor.category, descriptor.origin);
                }
            }
            service.stop().await;
        }
        Command::Select {
            query,
            intent,
            max,
            category,
            threshold,
            json,
        } => {
            let service = ScoutService::from_config(&config).await?;
            service.start().await?;

            let context = ToolContext {
                query,
                intent,
                category,
                max_tools: max,
                score_threshold: threshold,
                ..ToolContext::default()
            };
            let selection = service.select(&context).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&selection)?);
            } else {
                println!("{}", selection.reasoning);
                for score in &selection.scores {
                    println!(
                        "  {:<45} {:.3}  {}",
                        score.capability_id,
                        score.score,
                        score.reasons.join("; ")
                    );
                }
            }
            service.stop().await;
        }
    }

    Ok(())
}
