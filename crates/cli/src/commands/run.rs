// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `trib run <pipeline>` - Run a pipeline until Ctrl-C (or until drained)

use crate::Context;
use anyhow::Result;
use clap::Args;
use tokio::sync::watch;
use trib_engine::{pipelines, PipelineKind};

#[derive(Args)]
pub struct RunArgs {
    /// stations, customer-birthdays or customer-risk
    pub pipeline: PipelineKind,

    /// Stop once every input is exhausted
    #[arg(long)]
    pub drain: bool,
}

pub async fn handle(args: RunArgs, ctx: Context) -> Result<()> {
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping after the current record");
            let _ = stop_tx.send(true);
        }
    });

    let stats = pipelines::run(args.pipeline, ctx.broker, &ctx.config, args.drain, stop_rx).await?;

    eprintln!(
        "{}: processed {}, skipped {}, emitted {}, retries {}",
        args.pipeline, stats.processed, stats.skipped, stats.emitted, stats.retries
    );
    Ok(())
}
