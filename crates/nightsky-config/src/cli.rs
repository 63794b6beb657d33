//! Command-line argument parsing for the night sky viewer.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Night sky viewer command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "nightsky", about = "Journal entries as a living night sky")]
pub struct CliArgs {
    /// Window width.
    #[arg(long)]
    pub width: Option<u32>,

    /// Window height.
    #[arg(long)]
    pub height: Option<u32>,

    /// Start in fullscreen.
    #[arg(long)]
    pub fullscreen: Option<bool>,

    /// Number of background stars.
    #[arg(long)]
    pub star_count: Option<u32>,

    /// Fixed seed for the background star field.
    #[arg(long)]
    pub seed: Option<u64>,

    /// RON file holding the journal star catalog.
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(w) = args.width {
            self.window.width = w;
        }
        if let Some(h) = args.height {
            self.window.height = h;
        }
        if let Some(fs) = args.fullscreen {
            self.window.fullscreen = fs;
        }
        if let Some(count) = args.star_count {
            self.sky.background_star_count = count;
        }
        if let Some(seed) = args.seed {
            self.sky.seed = Some(seed);
        }
        if let Some(ref path) = args.catalog {
            self.journal.catalog_path = Some(path.clone());
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            width: Some(1920),
            star_count: Some(300),
            seed: Some(42),
            catalog: Some(PathBuf::from("journal.ron")),
            ..CliArgs::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.window.width, 1920);
        assert_eq!(config.sky.background_star_count, 300);
        assert_eq!(config.sky.seed, Some(42));
        assert_eq!(
            config.journal.catalog_path.as_deref(),
            Some(std::path::Path::new("journal.ron"))
        );
        // Non-overridden fields retain defaults
        assert_eq!(config.window.height, 720);
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from(["nightsky", "--star-count", "64", "--seed", "9"]);
        assert_eq!(args.star_count, Some(64));
        assert_eq!(args.seed, Some(9));
        assert!(args.catalog.is_none());
    }
}
