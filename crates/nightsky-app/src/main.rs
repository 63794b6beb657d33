//! The binary entry point for the night sky viewer.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use nightsky_app::config_watch::ConfigWatcher;
use nightsky_app::platform::PlatformDirs;
use nightsky_app::scene::Scene;
use nightsky_app::window;
use nightsky_config::{CliArgs, Config};
use nightsky_sky::{Selection, StarCatalog};
use tracing::{error, info, warn};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let dirs = match &args.config {
        Some(root) => Ok(PlatformDirs::resolve_with_root(root)),
        None => PlatformDirs::resolve(),
    };
    let dirs = match dirs.and_then(|dirs| dirs.create_dirs().map(|()| dirs)) {
        Ok(dirs) => dirs,
        Err(e) => {
            eprintln!("Failed to initialize platform directories: {e}");
            return ExitCode::FAILURE;
        }
    };

    let (on_disk, watchable) = match Config::load_or_create(&dirs.config_dir) {
        Ok(config) => (config, true),
        Err(e) => {
            eprintln!("Failed to load config, using defaults: {e}");
            (Config::default(), false)
        }
    };
    let mut config = on_disk.clone();
    config.apply_cli_overrides(&args);

    nightsky_log::init_logging(Some(&dirs.log_dir), cfg!(debug_assertions), Some(&config));
    info!("Night sky viewer starting");
    info!("  config: {}", dirs.config_dir.display());
    info!("  data:   {}", dirs.data_dir.display());

    let catalog_path = config
        .journal
        .catalog_path
        .clone()
        .unwrap_or_else(|| dirs.default_catalog_path());
    let (catalog, save_path) = match load_catalog(&catalog_path) {
        Some(catalog) => (catalog, Some(catalog_path)),
        None => (StarCatalog::new(), None),
    };

    let mut scene = Scene::new(&config, catalog, save_path);
    scene.set_selection_handler(Box::new(|selection| match selection {
        Selection::JournalStar(star) => info!(
            "Selected journal star {} at {:?} (scale {:.1})",
            star.id, star.position, star.scale
        ),
        Selection::ShootingStar => info!("Caught the shooting star"),
    }));

    let watcher =
        watchable.then(|| ConfigWatcher::new(dirs.config_dir.clone(), on_disk, args));

    match window::run(config, scene, watcher) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Event loop failed: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Load the journal catalog, starting empty when it does not exist yet.
///
/// Returns `None` for an unreadable catalog so new stars never overwrite it.
fn load_catalog(path: &Path) -> Option<StarCatalog> {
    if !path.exists() {
        info!("No journal catalog at {}, starting empty", path.display());
        return Some(StarCatalog::new());
    }
    match StarCatalog::load(path) {
        Ok(catalog) => Some(catalog),
        Err(e) => {
            warn!("Ignoring unreadable journal catalog, new stars stay in memory: {e}");
            None
        }
    }
}
