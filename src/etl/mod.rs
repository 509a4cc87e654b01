/// ETL Module
///
/// The per-block stages driven by the pipeline:
/// - Extract: fetch a block from the JSON-RPC endpoint and decode it
/// - Transform: count transactions and total their value in ETH
///
/// Loading is a single insert through `crate::db::Database`.
pub mod extract;
pub mod transform;
