mod args;
mod cli;
mod pipeline;

use args::Command;
use cli::Cli;
use pipeline::align;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = Cli::parse().args()?;

    match args.command {
        Command::Align => {
            align(&args)?;
        }
        Command::NotSet => {
            unreachable!()
        }
    }

    Ok(())
}
