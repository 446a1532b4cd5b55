mod cli;
mod commands;

use cli::{Cli, Commands};

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    match &cli.command {
        Commands::Run(args) => commands::run::run(&cli, args),
        Commands::Config(args) => commands::config::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
