use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::error;

use face_analysis::config::{Cli, Command};
use face_analysis::{server, telemetry, write_report, Result};

async fn run(cli: Cli) -> Result<()> {
    // models live for the whole process and are dropped on exit
    let analyzer = cli.models.build_analyzer()?;

    match cli.command {
        Command::Serve { bind } => server::serve(bind, Arc::new(analyzer)).await,
        Command::Analyze {
            image,
            out_dir,
            json,
        } => {
            let report = write_report(&analyzer, &image, &out_dir)?;
            println!("{}", report.render(json)?);
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    telemetry::init_subscriber(&cli.log_level);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "face analysis failed");
            ExitCode::FAILURE
        }
    }
}
