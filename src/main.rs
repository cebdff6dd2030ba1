use anyhow::Result;
use clap::Parser;

use mooselect::cli::{self, Cli};

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    cli::run(cli)
}
