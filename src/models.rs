/// Data Models Module
///
/// This module defines the core data structures used throughout the application:
/// the JSON-RPC wire types exchanged with the Ethereum node and the per-block
/// aggregate persisted in the `transactions` table.
use serde::{Deserialize, Serialize};

/// JSON-RPC method used to fetch a block with full transaction objects
pub const GET_BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";

/// Table every ingested block is written to
pub const TRANSACTIONS_TABLE: &str = "transactions";

/// One row of the `transactions` table
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct BlockRecord {
    pub block_number: i64,
    #[sqlx(rename = "transaction_number")]
    pub transaction_count: i64,
    pub timestamp: i64,
    #[sqlx(rename = "value")]
    pub total_value: f64,
}

/// `eth_getBlockByNumber` request body
///
/// The `id` carries the block number so the response can be matched back to it.
#[derive(Debug, Clone, Serialize)]
pub struct BlockRequest {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: (String, bool),
    pub id: u64,
}

impl BlockRequest {
    pub fn new(block_number: u64) -> Self {
        Self { jsonrpc: "2.0", method: GET_BLOCK_BY_NUMBER, params: (format!("{:#x}", block_number), true), id: block_number }
    }
}

/// JSON-RPC response envelope
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub result: Option<RpcBlock>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// The subset of a block object the crawler reads
#[derive(Debug, Clone, Deserialize)]
pub struct RpcBlock {
    pub timestamp: String,
    pub transactions: Vec<RpcTransaction>,
}

/// A full transaction object; only `value` is used
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RpcTransaction {
    pub value: String,
}

/// A block returned by the node, tagged with the block number it answers
#[derive(Debug, Clone)]
pub struct BlockPayload {
    pub block_number: u64,
    pub timestamp: String,
    pub transactions: Vec<RpcTransaction>,
}
