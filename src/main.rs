// src/main.rs

use std::process::ExitCode;

use assetflow::{cli, exit_code_for, logging, run};

#[tokio::main]
async fn main() -> ExitCode {
    match run_main().await {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("assetflow error: {err:?}");
            ExitCode::from(exit_code_for(&err))
        }
    }
}

async fn run_main() -> anyhow::Result<u8> {
    let args = cli::parse();
    logging::init_logging(args.log_level)?;
    run(args).await
}
