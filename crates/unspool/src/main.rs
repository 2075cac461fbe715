//! `unspool` - extract a tar archive into an existing directory.

mod cli;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::App;

fn main() -> ExitCode {
    let app = App::parse();
    init_tracing(&app);

    match run(&app) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", failure_message(&e));
            ExitCode::FAILURE
        }
    }
}

fn run(app: &App) -> anyhow::Result<()> {
    let request = app.request();
    unspool_archive::extract(&request).with_context(|| {
        format!(
            "failed to extract '{}' into '{}'",
            request.source_path.display(),
            request.destination_dir.display()
        )
    })
}

/// The full cause chain on one line.
fn failure_message(e: &anyhow::Error) -> String {
    format!("{e:#}")
}

fn init_tracing(app: &App) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(app.default_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
