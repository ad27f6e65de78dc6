// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `trib topic` - Topic provisioning

use crate::Context;
use anyhow::Result;
use clap::{Args, Subcommand};
use trib_adapters::BrokerAdapter;

#[derive(Args)]
pub struct TopicArgs {
    #[command(subcommand)]
    pub command: TopicCommand,
}

#[derive(Subcommand)]
pub enum TopicCommand {
    /// Create a topic unless it already exists
    Ensure {
        name: String,
        #[arg(long, default_value_t = 1)]
        partitions: u32,
        #[arg(long, default_value_t = 1)]
        replicas: u32,
    },
    /// List topics with their partition counts
    List,
}

pub async fn handle(args: TopicArgs, ctx: Context) -> Result<()> {
    match args.command {
        TopicCommand::Ensure {
            name,
            partitions,
            replicas,
        } => {
            if ctx.broker.ensure_topic(&name, partitions, replicas).await? {
                println!("Topic {} already exists", name);
            } else {
                println!("Created topic {} ({} partitions)", name, partitions);
            }
        }
        TopicCommand::List => {
            let files = ctx.broker.inner();
            let topics = files.topics()?;
            if topics.is_empty() {
                println!("No topics");
                return Ok(());
            }
            println!("{:<40} PARTITIONS", "TOPIC");
            for name in topics {
                let partitions = files
                    .topic_spec(&name)?
                    .map_or_else(|| "-".to_string(), |spec| spec.partitions.to_string());
                println!("{:<40} {}", name, partitions);
            }
        }
    }
    Ok(())
}
