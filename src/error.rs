/// Error Module
///
/// Typed failures for every stage of a crawl. Per-block variants (`Request`,
/// `InvalidResponse`, `Rpc`, `Parse`, `Insert`) are recovered by the pipeline;
/// the rest end the run.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Failed to connect to {backend} database: {source}")]
    Connection {
        backend: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to create the transactions table: {0}")]
    Schema(#[source] sqlx::Error),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Request for block {block_number} failed: {source}")]
    Request {
        block_number: u64,
        #[source]
        source: reqwest::Error,
    },

    #[error("Block {block_number}: response is not valid JSON (HTTP {status}): {reason}")]
    InvalidResponse { block_number: u64, status: u16, reason: String },

    #[error("Block {block_number}: RPC error {code}: {message}")]
    Rpc { block_number: u64, code: i64, message: String },

    #[error("Block {block_number}: {reason}")]
    Parse { block_number: u64, reason: String },

    #[error("Failed to insert block {block_number}{}: {source}", duplicate_suffix(.duplicate))]
    Insert {
        block_number: i64,
        duplicate: bool,
        #[source]
        source: sqlx::Error,
    },

    #[error("Improperly formatted range `{input}`. It should be formatted as '{{start}}-{{end}}', where {{start}} and {{end}} are integers")]
    Argument { input: String },
}

fn duplicate_suffix(duplicate: &bool) -> &'static str {
    if *duplicate {
        " (already stored)"
    } else {
        ""
    }
}

/// Failure to read a JSON-RPC quantity (`"0x..."` or decimal string)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("empty quantity")]
    Empty,

    #[error("negative quantity `{0}`")]
    Negative(String),

    #[error("invalid quantity `{0}`")]
    Invalid(String),

    #[error("quantity `{0}` does not fit in 128 bits")]
    Overflow(String),
}
