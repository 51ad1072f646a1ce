//! Loads a content pack and checks that every value survives a round trip.
mod check;
mod config;

use anyhow::{Context, Result};
use loader_content::ContentFactory;
use tracing::info;

use crate::config::CheckConfig;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = CheckConfig::from_env().with_args(std::env::args().skip(1));

    let factory = ContentFactory::new(&config.data_dir);
    let pack = factory
        .load_pack()
        .with_context(|| format!("Failed to load {}", config.data_dir.display()))?;
    let report = check::verify(&pack, &config)?;

    info!(
        target: "loader::content",
        recipes = report.recipes,
        snapshot_bytes = report.snapshot_bytes,
        "content check passed"
    );
    Ok(())
}
