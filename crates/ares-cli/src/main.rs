use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use ares_application::ChatManager;
use ares_core::generation::GenerationPreset;
use ares_infrastructure::{AresConfig, ConfigService};
use ares_interaction::{EngineSelector, EngineStatus};

mod repl;

#[derive(Parser)]
#[command(name = "ares")]
#[command(about = "ARES - talk to a simulated dental patient and work out the diagnosis", long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to $ARES_CONFIG, then the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive interview with a simulated patient
    Chat {
        /// Pathology key; a random one is picked when omitted
        #[arg(short, long)]
        pathology: Option<String>,
        /// Named generation preset applied before the individual overrides
        #[arg(long)]
        preset: Option<GenerationPreset>,
        #[arg(long)]
        max_new_tokens: Option<u32>,
        #[arg(long)]
        temperature: Option<f32>,
    },
    /// List the available pathologies
    Pathologies,
    /// Show which generation engine would serve requests
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = ConfigService::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command.unwrap_or(Commands::Chat {
        pathology: None,
        preset: None,
        max_new_tokens: None,
        temperature: None,
    }) {
        Commands::Chat {
            pathology,
            preset,
            max_new_tokens,
            temperature,
        } => {
            if let Some(preset) = preset {
                config.generation = preset.params();
            }
            if let Some(max_new_tokens) = max_new_tokens {
                config.generation = config.generation.with_max_new_tokens(max_new_tokens);
            }
            if let Some(temperature) = temperature {
                config.generation = config.generation.with_temperature(temperature);
            }
            let manager = build_manager(config).await?;
            repl::run(Arc::new(manager), pathology.as_deref()).await?;
        }
        Commands::Pathologies => {
            let catalog = config.catalog()?;
            println!("{}", "Available pathologies:".bright_magenta().bold());
            for profile in catalog.list() {
                println!("  {} {}", profile.key.bright_cyan(), profile.label);
                println!("    {}", profile.chief_complaint.bright_black());
            }
        }
        Commands::Status => {
            let active = EngineSelector::initialize(&config.engine).await?;
            print_engine_status(&active.status, active.engine.name());
        }
    }

    Ok(())
}

async fn build_manager(config: AresConfig) -> Result<ChatManager> {
    let catalog = Arc::new(config.catalog()?);
    tracing::debug!(pathologies = catalog.len(), "Loaded pathology catalog");
    let active = EngineSelector::initialize(&config.engine).await?;
    let manager = ChatManager::new(catalog, active, config.chat, config.safety, config.generation)?;
    Ok(manager)
}

pub(crate) fn print_engine_status(status: &EngineStatus, engine_name: &str) {
    println!("{} {}", "Engine:".bright_black(), engine_name.bright_cyan());
    println!("{} {}", "Requested:".bright_black(), status.requested);
    if status.degraded {
        let reason = status.reason.as_deref().unwrap_or("unknown reason");
        println!("{}", format!("Degraded: fell back to {} ({reason})", status.active).yellow());
    }
}

/// The binary's own target is `ares`, the `[[bin]]` name.
const DEFAULT_LOG_FILTER: &str =
    "warn,ares=info,ares_application=info,ares_interaction=info,ares_infrastructure=info";

/// Logs go to stderr so they never interleave with the conversation on
/// stdout. `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_names_this_binary() {
        let own_target = module_path!().split("::").next().unwrap();
        assert_eq!(own_target, "ares");
        assert!(DEFAULT_LOG_FILTER.split(',').any(|d| d == format!("{own_target}=info")));
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
    }

    #[test]
    fn test_cli_parses_chat_options() {
        let cli = Cli::try_parse_from([
            "ares",
            "chat",
            "--pathology",
            "pericoronitis",
            "--preset",
            "balanced",
            "--temperature",
            "0.5",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Chat {
                pathology,
                preset,
                temperature,
                max_new_tokens,
            }) => {
                assert_eq!(pathology.as_deref(), Some("pericoronitis"));
                assert_eq!(preset, Some(GenerationPreset::Balanced));
                assert_eq!(temperature, Some(0.5));
                assert_eq!(max_new_tokens, None);
            }
            _ => panic!("expected the chat subcommand"),
        }
    }
}
