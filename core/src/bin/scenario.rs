/// Scenario CLI
///
/// Chat with, check and replay scenario scripts from the terminal.
use scenario_core::cli;

fn main() {
    if let Err(e) = cli::run_cli() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
