//! Config hot reload.
//!
//! `config.ron` is re-read on a fixed interval. Changes are compared against
//! the file as last read, so CLI overrides never count as a change and are
//! re-applied on top of every reloaded config.

use std::path::PathBuf;

use nightsky_config::{CliArgs, Config};
use tracing::{info, warn};

/// Seconds between two reads of `config.ron`.
pub const RELOAD_INTERVAL: f32 = 2.0;

/// Polls the config directory for edits.
pub struct ConfigWatcher {
    config_dir: PathBuf,
    on_disk: Config,
    args: CliArgs,
    elapsed: f32,
}

impl ConfigWatcher {
    /// `on_disk` is the config as loaded, before CLI overrides.
    pub fn new(config_dir: PathBuf, on_disk: Config, args: CliArgs) -> Self {
        Self {
            config_dir,
            on_disk,
            args,
            elapsed: 0.0,
        }
    }

    /// Advance by `delta` seconds. Once per interval the file is re-read;
    /// returns the new effective config when it changed.
    pub fn poll(&mut self, delta: f32) -> Option<Config> {
        self.elapsed += delta.max(0.0);
        if self.elapsed < RELOAD_INTERVAL {
            return None;
        }
        self.elapsed = 0.0;

        match self.on_disk.reload(&self.config_dir) {
            Ok(Some(config)) => {
                info!("Config changed on disk: {}", self.config_dir.display());
                self.on_disk = config.clone();
                let mut effective = config;
                effective.apply_cli_overrides(&self.args);
                Some(effective)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Keeping current config, reload failed: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watcher(dir: &std::path::Path, args: CliArgs) -> ConfigWatcher {
        let config = Config::default();
        config.save(dir).unwrap();
        ConfigWatcher::new(dir.to_path_buf(), config, args)
    }

    #[test]
    fn test_nothing_before_interval() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = watcher(dir.path(), CliArgs::default());
        let mut edited = Config::default();
        edited.debug.show_fps = true;
        edited.save(dir.path()).unwrap();

        assert!(watcher.poll(RELOAD_INTERVAL * 0.5).is_none());
        assert!(watcher.poll(RELOAD_INTERVAL * 0.6).is_some());
    }

    #[test]
    fn test_edit_is_reported_once_with_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let args = CliArgs {
            width: Some(640),
            ..CliArgs::default()
        };
        let mut watcher = watcher(dir.path(), args);
        assert!(
            watcher.poll(RELOAD_INTERVAL).is_none(),
            "CLI overrides alone are not a change"
        );

        let mut edited = Config::default();
        edited.camera.look_easing = 0.2;
        edited.save(dir.path()).unwrap();

        let reloaded = watcher.poll(RELOAD_INTERVAL).expect("edit should be seen");
        assert_eq!(reloaded.camera.look_easing, 0.2);
        assert_eq!(reloaded.window.width, 640);
        assert!(watcher.poll(RELOAD_INTERVAL).is_none());
    }

    #[test]
    fn test_broken_file_keeps_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = watcher(dir.path(), CliArgs::default());
        std::fs::write(dir.path().join("config.ron"), "(window: (width: oops").unwrap();
        assert!(watcher.poll(RELOAD_INTERVAL).is_none());
    }
}
