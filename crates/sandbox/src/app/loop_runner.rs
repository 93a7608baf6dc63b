use std::process::ExitCode;

use tracing::error;

use super::bootstrap::AppWiring;
use super::session::{Session, SessionReport};
use super::SandboxError;

pub(crate) fn run(app: AppWiring) -> ExitCode {
    match run_session(app) {
        Ok(encoded) => {
            println!("{encoded}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "session_failed");
            ExitCode::FAILURE
        }
    }
}

fn run_session(app: AppWiring) -> Result<String, SandboxError> {
    let report = Session::run(app.config, &app.script)?;
    encode_report(&report)
}

fn encode_report(report: &SessionReport) -> Result<String, SandboxError> {
    serde_json::to_string_pretty(report).map_err(SandboxError::EncodeReport)
}
