use std::env;
use std::path::PathBuf;

use placement::{load_config, resolve_config_path, PlacementConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::script::{demo_script, load_script, SessionScript};
use super::SandboxError;

pub(crate) struct AppWiring {
    pub(crate) config: PlacementConfig,
    pub(crate) script: SessionScript,
}

pub(crate) fn build_app() -> Result<AppWiring, SandboxError> {
    init_tracing();
    info!("=== Build Grid Sandbox ===");

    let config = match resolve_config_path()? {
        Some(path) => {
            info!(path = %path.display(), "config_loaded");
            load_config(&path)?
        }
        None => PlacementConfig::default(),
    };

    let script = match script_path_from_args() {
        Some(path) => {
            info!(path = %path.display(), "script_loaded");
            load_script(&path)?
        }
        None => {
            info!("script_demo");
            demo_script()?
        }
    };

    Ok(AppWiring { config, script })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn script_path_from_args() -> Option<PathBuf> {
    env::args_os().nth(1).map(PathBuf::from)
}
