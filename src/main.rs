use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use covpub::cli::Cli;
use covpub::git_data::{default_resolvers, resolve_provenance};
use covpub::metadata::resolve_metadata;
use covpub::ports::{LocalFileSystem, ProcessEnvironment, StdConsole};
use covpub::publisher::CoverallsPublisher;
use covpub::upload::CoverallsClient;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = cli.settings()?;

    let env = ProcessEnvironment;
    let console = StdConsole;

    let git_overrides = cli.git_overrides();
    let provenance = resolve_provenance(&default_resolvers(&git_overrides, &env, &console));
    let metadata = resolve_metadata(&env, &cli.metadata_overrides());

    let fs = LocalFileSystem;
    let client = CoverallsClient::new();
    CoverallsPublisher::new(&console, &fs, &client)
        .run(&settings, provenance, &metadata, &cli.server_url)
        .context("Failed to publish coverage")?;

    Ok(())
}
