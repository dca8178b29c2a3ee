//! Main application entry point (native).

use std::path::PathBuf;
use std::process::ExitCode;
use swatcher_app::AppError;

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Starting Product Swatcher");

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("swatcher: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), AppError> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .ok_or_else(|| AppError::Usage("swatcher <job.json>".to_string()))?;

    let report = pollster::block_on(swatcher_app::run_job_file(&path))?;
    for output in &report.outputs {
        println!("{}", output.display());
    }
    log::info!(
        "Finished with {} drawables at revision {}",
        report.drawables,
        report.revision
    );
    Ok(())
}
