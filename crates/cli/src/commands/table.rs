// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `trib table` - Read the stations table, rebuilt from its changelog

use crate::Context;
use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use trib_adapters::console::render_table;
use trib_core::schema::TransformedStation;
use trib_core::Tabular;
use trib_engine::pipelines::stations;
use trib_engine::Sink;

#[derive(Args)]
pub struct TableArgs {
    #[command(subcommand)]
    pub command: TableCommand,
}

#[derive(Subcommand)]
pub enum TableCommand {
    /// Print one station as JSON
    Get {
        /// Station id
        station_id: i64,
    },
    /// Print every station
    Dump,
}

pub async fn handle(args: TableArgs, ctx: Context) -> Result<()> {
    let mut sink = stations::table_sink(ctx.broker, &ctx.config.topics);
    let replayed = sink.restore().await?;
    tracing::debug!(replayed, changelog = sink.changelog(), "table rebuilt");
    let table = sink.into_table();

    match args.command {
        TableCommand::Get { station_id } => match table.get(&station_id) {
            Some(row) => println!("{}", serde_json::to_string_pretty(row)?),
            None => bail!("station {} not found in {}", station_id, table.name()),
        },
        TableCommand::Dump => {
            if table.is_empty() {
                println!("No rows in {}", table.name());
                return Ok(());
            }
            let rows: Vec<Vec<String>> = table.iter().map(|(_, row)| row.row()).collect();
            print!("{}", render_table(TransformedStation::columns(), &rows));
        }
    }
    Ok(())
}
