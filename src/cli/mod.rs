//! CLI interface for merchant-auth

pub mod commands;
mod output;

pub use output::*;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "merchant-auth")]
#[command(version)]
#[command(about = "Authentication and session service for merchant accounts", long_about = None)]
pub struct Cli {
    /// Path to the configuration file (defaults to searching for merchant-auth.toml)
    #[arg(short, long, global = true, env = "MERCHANT_AUTH_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default merchant-auth.toml configuration file
    Init,

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print a bcrypt hash of a password, for seeding users
    HashPassword {
        /// The password to hash
        password: String,

        /// bcrypt work factor
        #[arg(long, default_value_t = bcrypt::DEFAULT_COST)]
        cost: u32,
    },
}
