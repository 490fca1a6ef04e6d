//! fixbib - correct BibTeX journal articles against the Crossref registry.

use clap::Parser;
use fixbib_cli::commands;
use fixbib_cli::{Cli, Config, Formatter};
use fixbib_registry::CrossrefClient;
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize tracing (log to stderr, quiet unless RUST_LOG says otherwise)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    if let Err(e) = run().await {
        let color_enabled = std::env::var_os("NO_COLOR").is_none() && std::io::stderr().is_terminal();
        eprintln!("{}", Formatter::new(color_enabled).error(&format!("Error: {}", e)));
        std::process::exit(1);
    }
}

async fn run() -> fixbib_cli::Result<()> {
    let cli = Cli::parse();

    let config = Config::load()?.with_mailto(std::env::var("CROSSREF_MAILTO").ok());
    config.validate()?;

    let color_enabled = config.settings.color
        && std::env::var_os("NO_COLOR").is_none()
        && std::io::stdout().is_terminal();
    let formatter = Formatter::new(color_enabled);

    let reconcile = &config.reconcile;
    let registry = CrossrefClient::new(reconcile.registry_url.clone(), reconcile.mailto.clone())?
        .with_rows(reconcile.search_rows)
        .with_timeout(reconcile.request_timeout())?;

    let show_progress = std::io::stderr().is_terminal();
    let report = commands::execute_fix(&cli.path, registry, reconcile, &formatter, show_progress).await?;

    println!();
    println!("{}", report.render(&formatter));

    Ok(())
}
