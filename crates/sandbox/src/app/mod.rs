pub(crate) mod bootstrap;
pub(crate) mod loop_runner;
mod script;
mod session;
mod world;

use std::path::PathBuf;

use placement::{BuildError, ConfigError, WalletError};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum SandboxError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to read session script at {path}: {source}")]
    ReadScript {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse session script at {location}: {source}")]
    ParseScript {
        location: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("step {step}: {source}")]
    Build {
        step: usize,
        #[source]
        source: BuildError,
    },
    #[error("step {step}: {source}")]
    Wallet {
        step: usize,
        #[source]
        source: WalletError,
    },
    #[error("step {step}: unknown machine {machine}")]
    UnknownMachine { step: usize, machine: u64 },
    #[error("failed to encode session report: {0}")]
    EncodeReport(#[source] serde_json::Error),
}
