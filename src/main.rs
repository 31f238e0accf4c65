//! Surfacer CLI entry point.

use clap::Parser;
use surfacer::cli::{self, Cli, Commands, EXIT_ERROR};

fn main() {
    surfacer::init();

    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Extract(args) => match cli::run_extract(&args) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {}", e);
                EXIT_ERROR
            }
        },
        Commands::Init(args) => match cli::run_init(&args) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {}", e);
                EXIT_ERROR
            }
        },
    };

    std::process::exit(exit_code);
}
