//! Configuration for the night sky viewer.
//!
//! Settings persist to disk as RON, tolerate missing and unknown fields, and
//! can be overridden from the command line via clap.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    CameraConfig, Config, DebugConfig, JournalConfig, ShootingStarConfig, SkyConfig,
    WindowConfig, config_dir,
};
pub use error::ConfigError;
