/// Ethereum Block Crawler
///
/// Fetches a range of Ethereum blocks over JSON-RPC and stores, per block, the
/// transaction count, timestamp and total ETH moved in SQLite or PostgreSQL.
mod cli;
mod db;
mod error;
mod etl;
mod models;
mod pipeline;
mod rpc;

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use cli::{Cli, TimeWindow};
use db::{Database, StorageTarget};
use models::TRANSACTIONS_TABLE;
use pipeline::{Pipeline, PipelineConfig, PipelineStats};
use rpc::EthRpcClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    cli.validate()?;

    println!("🚀 Starting Ethereum Block Crawler...");

    let rpc_client = EthRpcClient::new(cli.endpoint.clone(), Duration::from_secs(cli.timeout))
        .context("Failed to create RPC client")?;

    let target = StorageTarget::parse(&cli.path);
    println!("\n💾 Connecting to {} database...", target.backend_name());
    let database = Database::connect(&target).await.context("Failed to connect to the database")?;
    println!("✅ Database connected successfully!");

    let pipeline_config = PipelineConfig { range: cli.range, fail_fast: cli.fail_fast };

    // One connection serves ingestion and the dump, and is closed exactly once.
    let outcome = crawl(&database, rpc_client, pipeline_config, cli.report_window).await;
    database.close().await;
    let stats = outcome?;

    tracing::info!(
        "Stored {} of {} blocks",
        format_number(stats.blocks_inserted as u64),
        format_number(stats.blocks_attempted as u64)
    );
    println!("\n✨ Crawl complete!");

    Ok(())
}

/// Ingest the configured range, then dump the table and answer the optional window query
async fn crawl(
    database: &Database,
    rpc_client: EthRpcClient,
    config: PipelineConfig,
    window: Option<TimeWindow>,
) -> Result<PipelineStats> {
    let stats = Pipeline::new(rpc_client, database, config).run().await.context("Pipeline execution failed")?;
    report(database, window).await?;

    Ok(stats)
}

async fn report(database: &Database, window: Option<TimeWindow>) -> Result<()> {
    let dump = database.query_all(TRANSACTIONS_TABLE).await.context("Failed to read the transactions table")?;
    println!();
    print!("{}", dump);

    if let Some(window) = window {
        let best = database
            .max_value_between(window.from, window.to)
            .await
            .context("Failed to query the maximum block value")?;
        println!("\n{}", describe_max_value(window, best));
    }

    Ok(())
}

/// Human-readable answer to the "most ETH in one block" query
fn describe_max_value(window: TimeWindow, best: Option<(f64, i64)>) -> String {
    let span = format!("{} and {}", format_timestamp(window.from), format_timestamp(window.to));
    match best {
        Some((value, block_number)) => {
            format!("The max ether transferred in 1 block between {} is {} in the block {}.", span, value, block_number)
        }
        None => format!("No blocks were stored between {}.", span),
    }
}

fn format_timestamp(timestamp: i64) -> String {
    DateTime::<Utc>::from_timestamp(timestamp, 0)
        .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

/// Format a number with thousand separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();

    for (count, c) in s.chars().rev().enumerate() {
        if count > 0 && count % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    result.chars().rev().collect()
}
