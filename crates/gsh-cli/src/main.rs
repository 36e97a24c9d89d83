mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // Parse CLI and dispatch; logging is set up once the config is loaded.
    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("gsh error: {:#}", err);
        std::process::exit(1);
    }
}
