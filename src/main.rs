use std::error::Error;

use clap::Parser;

use gyoji::cli::{self, Cli};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();
    cli::run(cli)
}
