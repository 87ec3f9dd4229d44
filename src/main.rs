//! quantum-port CLI
//!
//! Creates or deletes an OpenStack network port. Runs either as a binary
//! automation module (the host passes the path of an arguments file) or
//! directly from the command line.
//!
//! # Usage
//!
//! ```bash
//! quantum-port /tmp/args.json
//! quantum-port --name mgmt_port --network-name management --fixed-ip 192.168.1.10
//! quantum-port --name mgmt_port --network-name management --state absent --check
//! quantum-port config set auth_url http://keystone:35357/v2.0/
//! ```

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use quantum_port::output::{Failure, OutputFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "quantum-port")]
#[command(version)]
#[command(about = "Create or delete an OpenStack network port", long_about = None)]
struct Cli {
    /// Arguments file from the automation host (JSON object or key=value pairs)
    args_file: Option<PathBuf>,

    #[command(flatten)]
    port: commands::port::PortArgs,

    /// Output format
    #[arg(long, short, value_enum, default_value = "json", global = true)]
    format: OutputFormat,

    /// Profile name from config file
    #[arg(long, short, global = true)]
    profile: Option<String>,

    /// Log more (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(long, short, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage the login profile
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Set configuration value
    Set { key: String, value: String },
    /// Get configuration value
    Get { key: String },
    /// List all configuration
    List,
    /// Initialize configuration
    Init,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Config { action }) => {
            if let Err(e) = commands::config::handle(action, cli.profile.as_deref()) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        None => {
            let result = commands::port::handle(
                cli.args_file.as_deref(),
                cli.port,
                cli.profile.as_deref(),
            )
            .await;

            match result {
                Ok(outcome) => cli.format.print(&outcome),
                Err(e) => {
                    tracing::error!(error = %e, "port module failed");
                    cli.format.print(&Failure::new(&e));
                    std::process::exit(1);
                }
            }
        }
    }
}
