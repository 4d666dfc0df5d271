use clap::Parser;
use twcorr::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
