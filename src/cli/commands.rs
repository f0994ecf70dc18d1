//! CLI command implementations

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use crate::auth::hash_password;
use crate::cli::{error, info, print_config_summary, success, warn};
use crate::config::{self, Config};

/// Write a default merchant-auth.toml configuration file
pub async fn init() -> Result<()> {
    let config_path = Path::new(config::loader::CONFIG_FILENAME);

    if config_path.exists() {
        warn(&format!("{} already exists", config::loader::CONFIG_FILENAME));
        return Ok(());
    }

    let content = config::loader::default_config_content();
    fs::write(config_path, content)?;

    success(&format!("Created {}", config::loader::CONFIG_FILENAME));
    info("Set JWT_SECRET and run 'merchant-auth serve' to start the service");

    Ok(())
}

/// Start the HTTP API server
pub async fn serve(config_path: Option<PathBuf>, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let host = config.server.host.clone();
    let port = config.server.port;
    info(&format!("Starting server at http://{}:{}", host, port));
    print_config_summary(&config);

    if let Err(e) = crate::api::run_server(config, &host, port).await {
        error(&format!("Server stopped: {}", e));
        return Err(e.into());
    }
    Ok(())
}

/// Print a bcrypt hash for the given password
pub async fn hash(password: &str, cost: u32) -> Result<()> {
    let hash = hash_password(password, cost).await?;
    println!("{}", hash);
    Ok(())
}

/// Load the configuration, falling back to defaults when no file is found by search
///
/// The fallback still needs `JWT_SECRET`; without it validation fails.
fn load_config(path: Option<PathBuf>) -> Result<Config> {
    if let Some(path) = path {
        return Ok(config::load_config_from_path(&path)?);
    }

    match config::load_config() {
        Ok(config) => Ok(config),
        Err(crate::error::Error::ConfigNotFound) => {
            warn("No configuration file found, using defaults with JWT_SECRET from the environment");
            let mut config = Config::default();
            config.auth.jwt_secret = std::env::var("JWT_SECRET").unwrap_or_default();
            config.validate()?;
            Ok(config)
        }
        Err(e) => Err(e.into()),
    }
}
