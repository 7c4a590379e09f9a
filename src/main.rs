use clap::Parser;
use momentum_signals::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
