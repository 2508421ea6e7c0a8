use std::process::ExitCode;

use clap::Parser;

use rasterpad::cli::{self, CliArgs};
use rasterpad::logger;

fn main() -> ExitCode {
    // Session log first so argument errors and panics are captured too.
    logger::init();

    let args = CliArgs::parse();
    cli::run(args)
}
