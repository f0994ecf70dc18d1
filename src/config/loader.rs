//! Configuration loading and environment variable interpolation

use crate::error::{Error, Result};
use regex::Regex;
use std::env;
use std::fs;
use std::path::Path;

use super::Config;

pub const CONFIG_FILENAME: &str = "merchant-auth.toml";

/// Load configuration from merchant-auth.toml
pub fn load_config() -> Result<Config> {
    let config_path = find_config_file()?;
    load_config_from_path(&config_path)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|_| Error::ConfigNotFound)?;
    parse_config(&content)
}

/// Parse configuration text after interpolating environment variables
pub fn parse_config(content: &str) -> Result<Config> {
    let content = interpolate_env_vars(content);
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Find the configuration file, searching upward from current directory
fn find_config_file() -> Result<std::path::PathBuf> {
    let mut current = env::current_dir().map_err(|e| Error::Config(e.to_string()))?;

    loop {
        let config_path = current.join(CONFIG_FILENAME);
        if config_path.exists() {
            return Ok(config_path);
        }

        if !current.pop() {
            return Err(Error::ConfigNotFound);
        }
    }
}

/// Interpolate environment variables in the format ${VAR_NAME} or ${VAR_NAME:-default}
fn interpolate_env_vars(content: &str) -> String {
    // Compile-time constant pattern; a failure here is a bug, not a runtime condition
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}")
        .expect("Invalid regex pattern - this is a bug in the codebase");

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        let default = caps.get(2).map(|m| m.as_str()).unwrap_or("");

        env::var(var_name).unwrap_or_else(|_| default.to_string())
    })
    .to_string()
}

/// Generate a default configuration file content
pub fn default_config_content() -> &'static str {
    r#"# merchant-auth configuration

[server]
host = "0.0.0.0"
port = 8080

[auth]
# Required; startup fails while this is empty
jwt_secret = "${JWT_SECRET}"
access_ttl_secs = 3600
refresh_ttl_secs = 86400
bcrypt_cost = 12
# "permissive" keeps refresh tokens valid until expiry, "single_use" rejects reuse
refresh_rotation = "permissive"
default_role = "merchant"

[session]
enabled = true
backend = "memory"
ttl_secs = 86400
key_prefix = "session:"
backend_timeout_ms = 2000
sweep_interval_secs = 300

# Uncomment to keep users in PostgreSQL instead of memory
# [database]
# url = "host=localhost user=postgres password=${POSTGRES_PASSWORD:-postgres} dbname=auth"
# timeout_ms = 5000
"#
}
