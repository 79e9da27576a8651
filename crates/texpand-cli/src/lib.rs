pub mod cli;
pub mod commands;
pub mod logging;
pub mod utils;

use clap::Parser;
use cli::{Commands, Texpand};
use commands::handle_command;
use std::process;

/// Run the texpand CLI application
pub fn run_main() {
    let args = Texpand::parse();

    // The engine logs at info even without -v so the daemon log is useful
    let verbosity = match args.commands {
        Commands::DaemonWorker | Commands::Run => args.verbose.max(1),
        _ => args.verbose,
    };
    logging::init(verbosity);

    if let Err(e) = handle_command(args.commands) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
