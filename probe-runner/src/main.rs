use clap::Parser;
use probe_runner::{exit_code, init_tracing, print_report, run, Args};
use std::process::ExitCode;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(&args).await {
        Ok(report) => {
            if let Err(e) = print_report(&report, args.json, &mut std::io::stdout().lock()) {
                error!(error = %e, "failed to write report");
            }
            ExitCode::from(exit_code(&report))
        }
        Err(e) => {
            error!(error = %e, "probe run aborted");
            eprintln!("error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}
