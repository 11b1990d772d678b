mod common;
mod error;
mod xpath;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an xpath expression on an xml document.
    Xpath(xpath::XPath),
}

fn main() -> anyhow::Result<()> {
    // RUST_LOG=xqc_compiler=debug shows the optimizer's rewrites
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    match cli.command {
        Commands::Xpath(xpath) => {
            xpath.run()?;
        }
    }
    Ok(())
}
