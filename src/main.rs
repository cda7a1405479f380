use clap::Parser;

use texnorm::{cli, logger};

fn main() -> std::process::ExitCode {
    // Initialize session log (overwrites previous session log)
    logger::init();

    let args = cli::CliArgs::parse();
    cli::run(args)
}
