/// CLI Module
///
/// Command-line interface configuration using clap.
use clap::Parser;

use crate::error::CrawlerError;
use crate::rpc::DEFAULT_TIMEOUT;

/// Ethereum Block Crawler
///
/// Fetch a range of blocks from a JSON-RPC endpoint and store per-block
/// transaction counts and ETH totals in SQLite or PostgreSQL
#[derive(Parser, Debug)]
#[command(name = "eth-block-crawler")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// A JSON-RPC endpoint to call an Ethereum client
    #[arg(value_name = "ENDPOINT")]
    pub endpoint: String,

    /// The path of the SQLite file to write to or a postgresql:// connection URI
    #[arg(value_name = "PATH")]
    pub path: String,

    /// A block range, formatted as "{start}-{end}" (end excluded)
    #[arg(value_name = "START-END", value_parser = parse_block_range)]
    pub range: BlockRange,

    /// Per-request timeout in seconds
    #[arg(
        short = 't',
        long,
        value_name = "SECONDS",
        env = "CRAWLER_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT.as_secs()
    )]
    pub timeout: u64,

    /// Abort on the first block that fails instead of skipping it
    #[arg(long, env = "CRAWLER_FAIL_FAST")]
    pub fail_fast: bool,

    /// After ingestion, report the block moving the most ETH with a timestamp in "{from}-{to}"
    #[arg(short = 'w', long, value_name = "FROM-TO", value_parser = parse_time_window)]
    pub report_window: Option<TimeWindow>,
}

impl Cli {
    /// Validate CLI arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.timeout == 0 {
            anyhow::bail!("Timeout must be greater than 0");
        }

        Ok(())
    }
}

/// Half-open block range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    pub start: u64,
    pub end: u64,
}

impl BlockRange {
    /// Block numbers in ascending order; empty when `end <= start`
    pub fn iter(&self) -> std::ops::Range<u64> {
        self.start..self.end
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Inclusive Unix timestamp window `[from, to]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub from: i64,
    pub to: i64,
}

/// Parse `"{start}-{end}"` into a block range
pub fn parse_block_range(input: &str) -> Result<BlockRange, CrawlerError> {
    let (start, end) = parse_pair(input)?;
    Ok(BlockRange { start, end })
}

/// Parse `"{from}-{to}"` into a timestamp window
pub fn parse_time_window(input: &str) -> Result<TimeWindow, CrawlerError> {
    let (from, to) = parse_pair(input)?;
    let argument_error = || CrawlerError::Argument { input: input.to_string() };
    let from = i64::try_from(from).map_err(|_| argument_error())?;
    let to = i64::try_from(to).map_err(|_| argument_error())?;

    Ok(TimeWindow { from, to })
}

fn parse_pair(input: &str) -> Result<(u64, u64), CrawlerError> {
    let argument_error = || CrawlerError::Argument { input: input.to_string() };

    let (left, right) = input.split_once('-').ok_or_else(argument_error)?;
    let left = left.trim().parse::<u64>().map_err(|_| argument_error())?;
    let right = right.trim().parse::<u64>().map_err(|_| argument_error())?;

    Ok((left, right))
}
