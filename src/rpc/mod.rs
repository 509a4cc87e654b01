/// RPC Client Module
///
/// This module handles all interactions with the Ethereum node over JSON-RPC.
/// It owns a single reqwest client with a per-request timeout so that an
/// unreachable endpoint cannot stall the whole crawl.
use std::time::Duration;

use anyhow::{Context, Result};

use crate::error::CrawlerError;
use crate::models::BlockRequest;

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Raw HTTP answer to a JSON-RPC call
#[derive(Debug, Clone)]
pub struct RpcReply {
    pub status: u16,
    pub body: String,
}

pub struct EthRpcClient {
    client: reqwest::Client,
    endpoint: String,
}

impl EthRpcClient {
    /// Create a new RPC client for the specified endpoint
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, endpoint })
    }

    /// Get the endpoint URL this client talks to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST an `eth_getBlockByNumber` call for one block
    ///
    /// Only transport failures are errors here; decoding the body is left to
    /// the extract stage.
    pub async fn get_block_by_number(&self, block_number: u64) -> Result<RpcReply, CrawlerError> {
        tracing::debug!("Fetching block {}", block_number);

        let response = self
            .client
            .post(&self.endpoint)
            .json(&BlockRequest::new(block_number))
            .send()
            .await
            .map_err(|source| CrawlerError::Request { block_number, source })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|source| CrawlerError::Request { block_number, source })?;

        Ok(RpcReply { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn test_get_block_by_number_posts_json_rpc_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({
                "jsonrpc": "2.0",
                "method": "eth_getBlockByNumber",
                "params": ["0x64", true],
                "id": 100
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"jsonrpc":"2.0","id":100,"result":null}"#)
            .create_async()
            .await;

        let client = EthRpcClient::new(server.url(), DEFAULT_TIMEOUT).unwrap();
        let reply = client.get_block_by_number(100).await.unwrap();

        mock.assert_async().await;
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, r#"{"jsonrpc":"2.0","id":100,"result":null}"#);
    }

    #[tokio::test]
    async fn test_get_block_by_number_unreachable_endpoint() {
        // Port 9 (discard) on localhost is closed in test environments.
        let client = EthRpcClient::new("http://127.0.0.1:9".to_string(), Duration::from_millis(500)).unwrap();

        let err = client.get_block_by_number(1).await.unwrap_err();
        assert!(matches!(err, CrawlerError::Request { block_number: 1, .. }));
    }

    #[tokio::test]
    async fn test_get_block_by_number_times_out_on_silent_endpoint() {
        // Accepts the connection but never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let client = EthRpcClient::new(format!("http://{}", address), Duration::from_millis(200)).unwrap();
        let started = std::time::Instant::now();

        let err = tokio::time::timeout(Duration::from_secs(5), client.get_block_by_number(1))
            .await
            .expect("request was not cut off by the client timeout")
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(5));
        match err {
            CrawlerError::Request { block_number: 1, source } => assert!(source.is_timeout()),
            other => panic!("unexpected error: {}", other),
        }
        server.abort();
    }

    #[test]
    fn test_endpoint_accessor() {
        let client = EthRpcClient::new("http://localhost:8545".to_string(), DEFAULT_TIMEOUT).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8545");
    }
}
