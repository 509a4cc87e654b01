/// Pipeline Module
///
/// Orchestrates the ingestion loop: Extract → Transform → Load, one block at a
/// time, with per-block failure isolation and statistics tracking.
use crate::cli::BlockRange;
use crate::db::Database;
use crate::error::CrawlerError;
use crate::etl::{extract, transform};
use crate::rpc::EthRpcClient;
use anyhow::{Context, Result};
use std::time::{Duration, Instant};

/// Pipeline execution statistics
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub blocks_attempted: usize,
    pub blocks_inserted: usize,
    pub blocks_empty: usize,
    pub transactions_counted: usize,
    pub elapsed_time: Duration,
    pub errors: Vec<PipelineError>,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocks_failed(&self) -> usize {
        self.errors.len()
    }

    /// Block numbers that were skipped because of a failure
    pub fn skipped_blocks(&self) -> Vec<u64> {
        self.errors.iter().map(|e| e.block_number).collect()
    }

    pub fn success_rate(&self) -> f64 {
        if self.blocks_attempted == 0 {
            0.0
        } else {
            (self.blocks_inserted as f64 / self.blocks_attempted as f64) * 100.0
        }
    }

    pub fn blocks_per_second(&self) -> f64 {
        let secs = self.elapsed_time.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.blocks_inserted as f64 / secs
        }
    }
}

/// A block that was skipped, with the stage it failed in
#[derive(Debug, Clone)]
pub struct PipelineError {
    pub stage: PipelineStage,
    pub block_number: u64,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Extract,
    Transform,
    Load,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineStage::Extract => write!(f, "Extract"),
            PipelineStage::Transform => write!(f, "Transform"),
            PipelineStage::Load => write!(f, "Load"),
        }
    }
}

/// Configuration for pipeline execution
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub range: BlockRange,
    pub fail_fast: bool,
}

/// What happened to a single block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockOutcome {
    Inserted { transactions: usize },
    Empty,
}

/// Main ingestion pipeline
///
/// Borrows the database: the caller owns the connection and closes it once,
/// after whatever it still needs to read back.
pub struct Pipeline<'a> {
    rpc_client: EthRpcClient,
    database: &'a Database,
    config: PipelineConfig,
}

impl<'a> Pipeline<'a> {
    /// Create a new pipeline instance
    pub fn new(rpc_client: EthRpcClient, database: &'a Database, config: PipelineConfig) -> Self {
        Self { rpc_client, database, config }
    }

    /// Run the pipeline over the configured range
    pub async fn run(&self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let mut stats = PipelineStats::new();
        let range = self.config.range;

        self.database.ensure_schema().await.context("Failed to prepare the database schema")?;

        tracing::info!("Starting pipeline for blocks {} to {} (exclusive)", range.start, range.end);

        println!("\n🚀 Starting block crawl...");
        println!("   🌐 Endpoint: {}", self.rpc_client.endpoint());
        println!("   💾 Storage: {}", self.database.backend_name());
        println!("   📍 Block range: [{}, {}) ({} blocks)", range.start, range.end, range.len());

        if range.is_empty() {
            tracing::warn!("Block range [{}, {}) is empty, nothing to ingest", range.start, range.end);
        }

        for block_number in range.iter() {
            stats.blocks_attempted += 1;

            match self.process_block(block_number).await {
                Ok(BlockOutcome::Inserted { transactions }) => {
                    stats.blocks_inserted += 1;
                    stats.transactions_counted += transactions;
                }
                Ok(BlockOutcome::Empty) => {
                    stats.blocks_empty += 1;
                    tracing::info!("Block {} has no data, skipping", block_number);
                }
                Err((stage, e)) => {
                    tracing::warn!("Block {} broken at {} stage: {}", block_number, stage, e);
                    stats.errors.push(PipelineError { stage, block_number, message: e.to_string() });

                    if self.config.fail_fast {
                        stats.elapsed_time = start_time.elapsed();
                        return Err(anyhow::Error::new(e)
                            .context(format!("Aborting at block {} ({} stage)", block_number, stage)));
                    }
                }
            }
        }

        stats.elapsed_time = start_time.elapsed();

        println!("\n✅ Crawl complete!");
        print_final_stats(&stats);

        Ok(stats)
    }

    /// Fetch, aggregate and store one block
    async fn process_block(&self, block_number: u64) -> Result<BlockOutcome, (PipelineStage, CrawlerError)> {
        let payload = extract::extract_block(&self.rpc_client, block_number)
            .await
            .map_err(|e| (PipelineStage::Extract, e))?;

        let Some(payload) = payload else {
            return Ok(BlockOutcome::Empty);
        };

        let record = transform::build_record(&payload).map_err(|e| (PipelineStage::Transform, e))?;

        self.database.insert_record(&record).await.map_err(|e| (PipelineStage::Load, e))?;

        tracing::info!(
            "Stored block {}: {} transactions, {} ETH",
            record.block_number,
            record.transaction_count,
            record.total_value
        );
        Ok(BlockOutcome::Inserted { transactions: payload.transactions.len() })
    }
}

/// Print final statistics
fn print_final_stats(stats: &PipelineStats) {
    println!("\n📊 Crawl Statistics:");
    println!("   ⏱️  Total time: {:.2}s", stats.elapsed_time.as_secs_f64());
    println!(
        "   📦 Blocks: {} attempted, {} stored, {} empty, {} failed",
        stats.blocks_attempted,
        stats.blocks_inserted,
        stats.blocks_empty,
        stats.blocks_failed()
    );
    println!("   ✅ Success rate: {:.1}%", stats.success_rate());
    println!("   📝 Transactions counted: {}", stats.transactions_counted);
    println!("   ⚡ Speed: {:.2} blocks/sec", stats.blocks_per_second());

    if !stats.errors.is_empty() {
        println!("\n❌ Skipped blocks: {:?}", stats.skipped_blocks());
        for (i, error) in stats.errors.iter().take(5).enumerate() {
            println!("   {}. [{}] Block {}: {}", i + 1, error.stage, error.block_number, error.message);
        }
        if stats.errors.len() > 5 {
            println!("   ... and {} more errors", stats.errors.len() - 5);
        }
    }
}
