use std::process::ExitCode;

mod commands;
mod config;
mod error;
mod local_state;
mod output;

#[tokio::main]
async fn main() -> ExitCode {
    let (settings, command) = match config::load() {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "orcafoto={level},client={level},engine={level}",
            level = settings.level
        ))
        .with_writer(std::io::stderr)
        .init();

    match commands::run(&settings, command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if !err.is_reported() {
                tracing::debug!("command failed: {err:?}");
                eprintln!("error: {err}");
            }
            ExitCode::FAILURE
        }
    }
}
