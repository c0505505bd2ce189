use std::path::PathBuf;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod catalog;
mod error;
mod events;
mod pipeline;
mod reader;
mod records;
mod resolver;
mod tables;
mod timestamp;
mod writer;

use pipeline::{EtlPipeline, PipelineConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "songplay_etl=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting songplay ETL v0.1.0");

    let input_root = std::env::var("ETL_INPUT_ROOT").unwrap_or_else(|_| "./data".to_string());
    let output_root = std::env::var("ETL_OUTPUT_ROOT").unwrap_or_else(|_| "./output".to_string());

    info!("Configuration loaded:");
    info!("  Input root: {}", input_root);
    info!("  Output root: {}", output_root);

    let pipeline = EtlPipeline::new(PipelineConfig {
        input_root: PathBuf::from(input_root),
        output_root,
    });

    let summary = pipeline.run().await.context("ETL run failed")?;

    info!(
        "Done: songs={} artists={} users={} time={} songplays={}",
        summary.songs, summary.artists, summary.users, summary.time, summary.songplays
    );
    Ok(())
}
