use clap::Parser;
use tracing_subscriber::EnvFilter;

mod catalog;
mod cli;
mod core;
mod demux;
mod matching;
mod parsing;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("tech_solver=debug,info")
    } else {
        EnvFilter::new("tech_solver=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        cli::Commands::Identify(args) => {
            cli::identify::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Split(args) => {
            cli::split::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Technologies(args) => {
            cli::technologies::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
