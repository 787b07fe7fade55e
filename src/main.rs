//! Pool setup runner
//!
//! Loads config.toml, creates one buffer pool per configured entry,
//! prewarms them one at a time through a request queue and prints the
//! resulting stats as JSON lines.

use instance_pool::infrastructure::logging::init_logging;
use instance_pool::{Config, Factory, PoolEntry, PoolRegistry, RequestQueue, SetupOutcome};
use std::sync::Arc;
use tracing_appender::non_blocking::WorkerGuard;

/// Load config and start logging
fn startup() -> instance_pool::Result<(Config, Vec<WorkerGuard>)> {
    let config = Config::load()?;
    let guards = init_logging(&config.logging)?;
    Ok((config, guards))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, _guards) = startup()?;

    tracing::info!(entries = config.pool.entries.len(), "Starting pool setup...");

    let registry = Arc::new(PoolRegistry::<Vec<u8>>::new());
    let buffer_size = config.pool.buffer_size;

    let queue = RequestQueue::new(config.pool.entries.clone());
    let summary = queue
        .drain(|entry: PoolEntry| {
            let registry = Arc::clone(&registry);
            async move {
                let setup = tokio::task::spawn_blocking(move || {
                    registry.setup(std::slice::from_ref(&entry), |_| {
                        Some(Box::new(move || vec![0u8; buffer_size]) as Factory<Vec<u8>>)
                    })
                });
                let report = match setup.await {
                    Ok(report) => report,
                    Err(e) => return Err(e.to_string()),
                };

                match report.entries.into_iter().next() {
                    Some((_, SetupOutcome::Prewarmed { .. })) => Ok(()),
                    Some((_, SetupOutcome::Skipped { reason })) => Err(reason),
                    None => Err("no setup outcome".to_string()),
                }
            }
        })
        .await;

    for stats in registry.stats() {
        println!("{}", serde_json::to_string(&stats)?);
    }

    tracing::info!(
        prewarmed = summary.succeeded.len(),
        failed = summary.failed.len(),
        "Pool setup finished"
    );

    if !summary.failed.is_empty() {
        anyhow::bail!("{} pool(s) failed to set up", summary.failed.len());
    }
    Ok(())
}
