//! Copyright (c) 2025-2026, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了CLI命令行接口。

use crate::client::OptionsClient;
use crate::config::Config;
use crate::interceptor::Activation;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "oxtransient")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(short, long, global = true, help = "Path to a TOML configuration file")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(name = "parse", about = "Classify an option key against the transient naming convention")]
    Parse(ParseArgs),

    #[command(name = "status", about = "Show configuration and primer activation")]
    Status(StatusArgs),

    #[command(name = "get", about = "Read a transient")]
    Get(GetArgs),

    #[command(name = "set", about = "Write a transient")]
    Set(SetArgs),

    #[command(name = "verify", about = "Write, evict and re-read a transient, reporting store round trips")]
    Verify(VerifyArgs),
}

#[derive(Parser, Debug)]
pub struct ParseArgs {
    #[arg(help = "Option key, e.g. _transient_timeout_feed")]
    pub key: String,
}

#[derive(Parser, Debug)]
pub struct StatusArgs {
    #[arg(short, long, help = "Show detailed information")]
    pub verbose: bool,
}

#[derive(Parser, Debug)]
pub struct GetArgs {
    #[arg(help = "Transient name")]
    pub name: String,

    #[arg(long, help = "Use the site-wide namespace")]
    pub site: bool,
}

#[derive(Parser, Debug)]
pub struct SetArgs {
    #[arg(help = "Transient name")]
    pub name: String,

    #[arg(help = "JSON value (plain text is stored as a string)")]
    pub value: String,

    #[arg(long, default_value_t = 0, help = "Expiration in seconds, 0 for none")]
    pub ttl: u64,

    #[arg(long, help = "Use the site-wide namespace")]
    pub site: bool,
}

#[derive(Parser, Debug)]
pub struct VerifyArgs {
    #[arg(default_value = "oxtransient_verify", help = "Transient name")]
    pub name: String,

    #[arg(long, default_value_t = 100, help = "Expiration in seconds")]
    pub ttl: u64,

    #[arg(long, help = "Print metrics in Prometheus text format afterwards")]
    pub metrics: bool,
}

mod parse;
mod status;
mod transient;

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(Config::default()),
    }
}

async fn connect(config: &Config) -> Result<(OptionsClient, Activation)> {
    OptionsClient::from_config(config)
        .await
        .context("Failed to initialize options client")
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    crate::telemetry::init_tracing(&config.global.service_name, "warn");

    match &cli.command {
        Commands::Parse(args) => parse::execute(args, &config),
        Commands::Status(args) => status::execute(args, &config).await,
        Commands::Get(args) => transient::get(args, &config).await,
        Commands::Set(args) => transient::set(args, &config).await,
        Commands::Verify(args) => transient::verify(args, &config).await,
    }
}
