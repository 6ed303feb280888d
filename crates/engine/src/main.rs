//! `rolesync-preview`: run a sync config against a platform snapshot held in
//! memory and print the run report as JSON.
//!
//! Usage: `rolesync-preview <config.json> <platform.json>`

use anyhow::{Context, bail};

use rolesync_engine::{InMemoryPlatform, PlatformSnapshot, RunDriver, SyncConfig};

fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let (Some(config_path), Some(snapshot_path)) = (args.next(), args.next()) else {
        bail!("usage: rolesync-preview <config.json> <platform.json>");
    };

    let config = SyncConfig::load(&config_path)?;
    rolesync_observability::init_with(&config.logging);

    let raw = std::fs::read_to_string(&snapshot_path)
        .with_context(|| format!("reading platform snapshot {snapshot_path}"))?;
    let snapshot: PlatformSnapshot = serde_json::from_str(&raw)
        .with_context(|| format!("parsing platform snapshot {snapshot_path}"))?;
    let platform = InMemoryPlatform::from_snapshot(snapshot);

    let driver = RunDriver::new(&platform, &platform, &platform, &platform, config.reconciler_config());
    let report = driver.run(&config).context("role sync run failed")?;

    tracing::info!(run_id = %report.run_id, mutations = platform.mutations().len(), "preview finished");
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
