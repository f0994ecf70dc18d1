//! CLI output formatting utilities

use colored::Colorize;

use crate::config::{Config, RefreshRotation};

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn warn(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Print an aligned `label: value` line
pub fn detail(label: &str, value: &str) {
    println!("  {:<18} {}", format!("{}:", label).dimmed(), value);
}

/// Summarise the settings a server is about to start with
pub fn print_config_summary(config: &Config) {
    detail("listen", &format!("{}:{}", config.server.host, config.server.port));
    detail(
        "credential store",
        if config.database.is_some() { "postgres" } else { "memory" },
    );
    detail(
        "sessions",
        &if config.session.enabled {
            format!("{:?}, ttl {}s", config.session.backend, config.session.ttl_secs)
                .to_lowercase()
        } else {
            "disabled".red().to_string()
        },
    );
    detail(
        "refresh tokens",
        match config.auth.refresh_rotation {
            RefreshRotation::Permissive => "permissive",
            RefreshRotation::SingleUse => "single use",
        },
    );
    detail("access ttl", &format!("{}s", config.auth.access_ttl_secs));
}
