// src/main.rs

use std::process::ExitCode;

use spawnkit::{cli, logging, run};

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse();
    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("spawnkit: logging setup failed: {err}");
    }

    match run(args).await {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(err) => {
            eprintln!("spawnkit error: {err:?}");
            ExitCode::FAILURE
        }
    }
}
