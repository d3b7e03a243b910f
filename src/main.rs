//! CLI binary for taskdeck.
//!
//! This binary is a thin wrapper that parses arguments and delegates to the library.

use std::process::ExitCode;

use clap::Parser;
use taskdeck::cli::{run, Cli};

fn main() -> ExitCode {
    taskdeck::logging::init();

    let cli = Cli::parse();
    let data_dir = cli.data_dir.unwrap_or_else(taskdeck::paths::data_dir);

    let output = run(cli.command, &data_dir);

    for line in output.stdout {
        println!("{line}");
    }
    for line in output.stderr {
        eprintln!("{line}");
    }

    output.exit_code
}
