mod cli;
mod commands;
mod config;
mod dispatch;

use clap::Parser;
use cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.quiet {
        log::LevelFilter::Error
    } else {
        match cli.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    };
    env_logger::Builder::new().filter_level(level).init();

    let exit_code = dispatch::run(cli)?;
    std::process::exit(exit_code);
}
