// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `trib produce <topic>` - Publish stdin lines as record values

use crate::Context;
use anyhow::{bail, Result};
use clap::Args;
use std::io::BufRead;
use trib_adapters::BrokerAdapter;

#[derive(Args)]
pub struct ProduceArgs {
    /// Topic to publish to
    pub topic: String,

    /// Record key for every published record
    #[arg(long)]
    pub key: Option<String>,

    /// Partitions to create the topic with if it does not exist
    #[arg(long, default_value_t = 1)]
    pub partition_count: u32,

    /// Publish a single tombstone for --key instead of reading stdin
    #[arg(long)]
    pub tombstone: bool,
}

pub async fn handle(args: ProduceArgs, ctx: Context) -> Result<()> {
    let key = args.key.map(String::into_bytes);
    if args.tombstone && key.is_none() {
        bail!("--tombstone requires --key");
    }

    ctx.broker
        .ensure_topic(&args.topic, args.partition_count, 1)
        .await?;

    if args.tombstone {
        let delivery = ctx.broker.publish(&args.topic, key, None).await?;
        println!(
            "Tombstone published to {}/{} at offset {}",
            args.topic, delivery.partition, delivery.offset
        );
        return Ok(());
    }

    let mut produced = 0u64;
    for line in std::io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        ctx.broker
            .publish(&args.topic, key.clone(), Some(line.into_bytes()))
            .await?;
        produced += 1;
    }

    println!("Produced {} record(s) to {}", produced, args.topic);
    Ok(())
}
