/// Extract Module
///
/// Fetches a block from the node and decodes the JSON-RPC envelope into a
/// `BlockPayload`. A missing or `null` result means the node has no data for
/// that height and yields `Ok(None)`.
use serde_json::Value;

use crate::error::CrawlerError;
use crate::models::{BlockPayload, RpcResponse};
use crate::rpc::{EthRpcClient, RpcReply};

/// Fetch and decode a single block
pub async fn extract_block(rpc_client: &EthRpcClient, block_number: u64) -> Result<Option<BlockPayload>, CrawlerError> {
    let reply = rpc_client.get_block_by_number(block_number).await?;
    decode_block_reply(block_number, &reply)
}

/// Decode the body of an `eth_getBlockByNumber` reply
pub fn decode_block_reply(block_number: u64, reply: &RpcReply) -> Result<Option<BlockPayload>, CrawlerError> {
    let value: Value = serde_json::from_str(&reply.body).map_err(|e| CrawlerError::InvalidResponse {
        block_number,
        status: reply.status,
        reason: e.to_string(),
    })?;

    let response: RpcResponse = serde_json::from_value(value)
        .map_err(|e| CrawlerError::Parse { block_number, reason: format!("malformed block: {}", e) })?;

    if let Some(error) = response.error {
        return Err(CrawlerError::Rpc { block_number, code: error.code, message: error.message });
    }

    let Some(block) = response.result else {
        return Ok(None);
    };

    match response.id {
        Some(id) if id == block_number => {}
        Some(id) => {
            return Err(CrawlerError::Parse {
                block_number,
                reason: format!("response id {} does not match the requested block", id),
            });
        }
        None => {
            return Err(CrawlerError::Parse { block_number, reason: "response has no id".to_string() });
        }
    }

    Ok(Some(BlockPayload { block_number, timestamp: block.timestamp, transactions: block.transactions }))
}
