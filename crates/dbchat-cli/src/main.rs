//! dbchat CLI - chat with the retail sales database

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;

use dbchat_core::seed::{SeedOptions, seed_database};
use dbchat_core::{Config, SchemaProvider};

use crate::llm::AzureClient;
use crate::mcp::McpBackend;
use crate::orchestrator::Orchestrator;

mod llm;
mod mcp;
mod orchestrator;

#[derive(Debug, Parser)]
#[command(
    name = "dbchat",
    author,
    version,
    about = "Chat with the retail sales database",
    propagate_version = true
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the database file path
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Increase verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start an interactive chat session
    Chat,

    /// Generate the sample sales database
    Seed {
        /// Number of customers to generate
        #[arg(long, default_value = "200")]
        customers: usize,

        /// Number of orders to generate
        #[arg(long, default_value = "1000")]
        orders: usize,

        /// Overwrite an existing database
        #[arg(long)]
        force: bool,
    },

    /// Print table schemas as presented to the model
    Schema {
        /// Table name (all tables if omitted)
        table: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    // Load config
    let config_path = cli.config.unwrap_or_else(Config::default_config_path);
    let mut config = Config::ensure_at(&config_path)?;
    if let Some(database) = cli.database {
        config.database = database;
    }

    match cli.command {
        Command::Chat => cmd_chat(&config).await,
        Command::Seed {
            customers,
            orders,
            force,
        } => cmd_seed(&config, customers, orders, force).await,
        Command::Schema { table } => cmd_schema(&config, table).await,
    }
}

async fn cmd_chat(config: &Config) -> Result<()> {
    let client = AzureClient::new(config.model.clone())?;

    // A failed tool backend degrades the session to model-only answers
    // rather than aborting it.
    let backend = match McpBackend::connect(&server_binary(config), &config.database).await {
        Ok(backend) => Some(backend),
        Err(err) => {
            eprintln!(
                "{} {err}",
                style("Warning: running without database tools:").yellow()
            );
            None
        }
    };

    let mut orchestrator = Orchestrator::new(client, backend, config.max_tool_rounds)
        .with_activity_output();
    if let Some(prompt) = system_prompt(config) {
        orchestrator.set_system_message(prompt);
    }

    println!(
        "{}",
        style("Chatting with the sales database. Type 'exit' to quit.").dim()
    );

    let stdin = io::stdin();
    loop {
        print!("\n{} ", style("You:").bold().green());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            break;
        }

        match orchestrator.process_message(input).await {
            Ok(answer) => {
                println!("\n{} {answer}", style("Assistant:").bold());
            }
            Err(err) => {
                eprintln!("{} {err}", style("Error:").red());
            }
        }
    }

    if let Some(backend) = orchestrator.into_backend() {
        backend.shutdown().await?;
    }
    println!("{}", style("Goodbye.").dim());
    Ok(())
}

async fn cmd_seed(config: &Config, customers: usize, orders: usize, force: bool) -> Result<()> {
    let opts = SeedOptions {
        customers,
        orders,
        force,
    };
    let summary = seed_database(&config.database, &opts).await?;

    println!(
        "Seeded {} with {} stores, {} products, {} customers, {} orders ({} line items)",
        config.database.display(),
        summary.stores,
        summary.products,
        summary.customers,
        summary.orders,
        summary.order_items
    );
    Ok(())
}

async fn cmd_schema(config: &Config, table: Option<String>) -> Result<()> {
    let provider = SchemaProvider::open(&config.database).await?;

    let tables: Vec<String> = match table {
        Some(name) => vec![name],
        None => provider
            .cached_tables()
            .into_iter()
            .map(String::from)
            .collect(),
    };

    for name in tables {
        print!("{}", provider.table_metadata_string(&name, config.display_cap).await);
        println!();
    }

    provider.close().await;
    Ok(())
}

/// Resolve the MCP server binary: explicit config entry, then a sibling of
/// the current executable, then whatever PATH lookup finds.
fn server_binary(config: &Config) -> PathBuf {
    if let Some(path) = &config.mcp_server {
        return path.clone();
    }
    if let Ok(exe) = std::env::current_exe()
        && let Some(dir) = exe.parent()
    {
        let sibling = dir.join("dbchat-mcp");
        if sibling.exists() {
            return sibling;
        }
    }
    PathBuf::from("dbchat-mcp")
}

/// System prompt from the configured file. The conversation runs without a
/// system message when no file is configured or it cannot be read.
fn system_prompt(config: &Config) -> Option<String> {
    let path = config.system_prompt.as_ref()?;
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                %err,
                "failed to read system prompt file, continuing without one"
            );
            None
        }
    }
}
