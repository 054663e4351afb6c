//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};

use clap::Parser;

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "timer-bell")]
#[command(about = "A local countdown-timer service with notifications, alarms and presets")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Key-value store file for presets and settings
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// How long a finished timer stays listed, in milliseconds
    #[arg(long, default_value = "800")]
    pub grace_ms: u64,

    /// Audio player command; the sound file or URL is appended
    #[arg(long, default_value = "paplay")]
    pub player: String,

    /// Grant desktop notification permission at startup
    #[arg(short, long)]
    pub notifications: bool,

    /// Freesound API token used for sound search
    #[arg(long, env = "FREESOUND_TOKEN", hide_env_values = true)]
    pub freesound_token: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["timer-bell"]).unwrap();
        assert_eq!(config.address(), "127.0.0.1:20554");
        assert_eq!(config.grace(), Duration::from_millis(800));
        assert_eq!(config.player, "paplay");
        assert!(!config.notifications);
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn overrides() {
        let config = Config::try_parse_from([
            "timer-bell",
            "-p",
            "9000",
            "--player",
            "mpv --no-video",
            "--notifications",
            "-v",
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.player, "mpv --no-video");
        assert!(config.notifications);
        assert_eq!(config.log_level(), "debug");
    }
}
