mod search;

use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::search::SearchArgs;

/// Invalid arguments or configuration.
const EXIT_INVALID_INPUT: u8 = 1;
/// No listing could be obtained from any source.
const EXIT_ACQUISITION_FAILED: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "pricescout", version)]
#[command(about = "Search and rank product listings from Mercado Livre and Amazon Brazil")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search every requested source and print the ranked listings as JSON
    Search(SearchArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            print_error(&e.render().to_string());
            return ExitCode::from(EXIT_INVALID_INPUT);
        }
    };

    let config = match pricescout_core::load_app_config_from_env() {
        Ok(config) => config,
        Err(e) => {
            print_error(&e.to_string());
            return ExitCode::from(EXIT_INVALID_INPUT);
        }
    };

    if let Err(e) = init_tracing(&config.log_level) {
        print_error(&format!("invalid log level: {e}"));
        return ExitCode::from(EXIT_INVALID_INPUT);
    }

    let outcome = match cli.command {
        Commands::Search(args) => search::run_search(args, &config).await,
    };

    match outcome {
        Ok(document) => {
            println!("{document}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            print_error(&format!("{e:#}"));
            ExitCode::from(search::exit_code_for(&e))
        }
    }
}

/// Logs go to stderr so stdout carries only the JSON document.
fn init_tracing(default_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn print_error(message: &str) {
    eprintln!("{}", error_document(message));
}

fn error_document(message: &str) -> serde_json::Value {
    serde_json::json!({ "error": message.trim_end() })
}
