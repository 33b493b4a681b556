//! Standalone activity monitor
//!
//! `activity_monitor` samples forever; `--once` runs a single cycle and
//! `--interval N` overrides the sampling interval in seconds.

use anyhow::{bail, Context, Result};
use std::time::Duration;
use tracing::info;

use recall_bridge::context::ContextSampler;
use recall_bridge::services::{ActivitySyncLoop, SyncOutcome};
use recall_bridge::utils::{init_tracing, LogTarget};
use recall_bridge::{BridgeConfig, MemoryGateway};

struct Args {
    once: bool,
    interval: Option<Duration>,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        once: false,
        interval: None,
    };
    let mut raw = std::env::args().skip(1);
    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--once" => args.once = true,
            "--interval" => {
                let value = raw.next().context("--interval needs a number of seconds")?;
                let secs: u64 = value
                    .parse()
                    .with_context(|| format!("invalid interval '{value}'"))?;
                if secs == 0 {
                    bail!("--interval must be at least 1");
                }
                args.interval = Some(Duration::from_secs(secs));
            }
            other => bail!("unknown argument '{other}' (expected --once or --interval N)"),
        }
    }
    Ok(args)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("recall_bridge=info", LogTarget::Stdout);

    let args = parse_args()?;
    let config = BridgeConfig::from_env().context("failed to load configuration")?;
    let gateway = MemoryGateway::connect(&config)?;
    let activity = ActivitySyncLoop::new(
        ContextSampler::new(&config.watch_root),
        gateway,
        args.interval.unwrap_or(config.activity_interval),
    );

    if args.once {
        match activity.run_once().await? {
            SyncOutcome::Emitted => info!("Activity recorded"),
            SyncOutcome::Unchanged => info!("No activity change"),
        }
        return Ok(());
    }

    activity.start().await;
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    activity.stop().await;
    Ok(())
}
