/// Transform Module
///
/// Turns a fetched block into the aggregate row stored in the database:
/// quantity parsing, WEI → ETH conversion, and per-block summation.
use crate::error::{CrawlerError, QuantityError};
use crate::models::{BlockPayload, BlockRecord, RpcTransaction};

/// Number of WEI in one ETH (10^18)
pub const WEI_PER_ETH: f64 = 1_000_000_000_000_000_000.0;

/// Transaction count and ETH total of one block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockAggregate {
    pub transaction_count: usize,
    pub total_value: f64,
}

/// Parse a JSON-RPC quantity, detecting the base from its prefix
///
/// `0x`/`0X` is hexadecimal, `0o` octal, `0b` binary, anything else decimal.
/// Surrounding whitespace and `_` separators between digits are accepted; a
/// decimal literal may only start with `0` if it is all zeros.
pub fn parse_quantity(raw: &str) -> Result<u128, QuantityError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(QuantityError::Empty);
    }
    if text.starts_with('-') {
        return Err(QuantityError::Negative(raw.to_string()));
    }
    let text = text.strip_prefix('+').unwrap_or(text);

    let (radix, digits) = match text.get(..2).map(|p| p.to_ascii_lowercase()) {
        Some(prefix) if prefix == "0x" => (16, &text[2..]),
        Some(prefix) if prefix == "0o" => (8, &text[2..]),
        Some(prefix) if prefix == "0b" => (2, &text[2..]),
        _ => (10, text),
    };
    // Separators may follow the base prefix ("0x_ff") but never lead a bare number.
    let digits = if radix != 10 { digits.strip_prefix('_').unwrap_or(digits) } else { digits };

    if digits.is_empty() || digits.starts_with('_') || digits.ends_with('_') || digits.contains("__") {
        return Err(QuantityError::Invalid(raw.to_string()));
    }
    let digits: String = digits.chars().filter(|c| *c != '_').collect();

    if radix == 10 && digits.len() > 1 && digits.starts_with('0') && digits.chars().any(|c| c != '0') {
        return Err(QuantityError::Invalid(raw.to_string()));
    }
    if !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(QuantityError::Invalid(raw.to_string()));
    }

    u128::from_str_radix(&digits, radix).map_err(|_| QuantityError::Overflow(raw.to_string()))
}

/// Convert a WEI amount to ETH
///
/// Floating point: the result is a display quantity, not a ledger balance.
pub fn wei_to_eth(wei: u128) -> f64 {
    wei as f64 / WEI_PER_ETH
}

/// Count the transactions of a block and sum their values in ETH
///
/// Zero-value transactions count towards `transaction_count`.
pub fn aggregate(transactions: &[RpcTransaction]) -> Result<BlockAggregate, QuantityError> {
    let mut total_value = 0.0;
    for tx in transactions {
        total_value += wei_to_eth(parse_quantity(&tx.value)?);
    }

    Ok(BlockAggregate { transaction_count: transactions.len(), total_value })
}

/// Build the database row for a fetched block
pub fn build_record(payload: &BlockPayload) -> Result<BlockRecord, CrawlerError> {
    let block_number = payload.block_number;
    let parse_error = |reason: String| CrawlerError::Parse { block_number, reason };

    let aggregate = aggregate(&payload.transactions).map_err(|e| parse_error(format!("transaction value: {}", e)))?;

    let timestamp = parse_quantity(&payload.timestamp).map_err(|e| parse_error(format!("timestamp: {}", e)))?;
    let timestamp = i64::try_from(timestamp).map_err(|_| parse_error(format!("timestamp {} out of range", timestamp)))?;

    let stored_number =
        i64::try_from(block_number).map_err(|_| parse_error("block number out of range".to_string()))?;
    let transaction_count = i64::try_from(aggregate.transaction_count)
        .map_err(|_| parse_error("transaction count out of range".to_string()))?;

    Ok(BlockRecord { block_number: stored_number, transaction_count, timestamp, total_value: aggregate.total_value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(value: &str) -> RpcTransaction {
        RpcTransaction { value: value.to_string() }
    }

    #[test]
    fn test_parse_quantity_hex() {
        assert_eq!(parse_quantity("0x0"), Ok(0));
        assert_eq!(parse_quantity("0xde0b6b3a7640000"), Ok(1_000_000_000_000_000_000));
        assert_eq!(parse_quantity("0XFF"), Ok(255));
        assert_eq!(parse_quantity("  0x65920000\n"), Ok(1_704_067_072));
    }

    #[test]
    fn test_parse_quantity_decimal_fallback() {
        assert_eq!(parse_quantity("1000000000000000000"), Ok(1_000_000_000_000_000_000));
        assert_eq!(parse_quantity("0"), Ok(0));
        assert_eq!(parse_quantity("000"), Ok(0));
        assert_eq!(parse_quantity("1_000"), Ok(1000));
        assert_eq!(parse_quantity("+12"), Ok(12));
    }

    #[test]
    fn test_parse_quantity_other_prefixes() {
        assert_eq!(parse_quantity("0o17"), Ok(15));
        assert_eq!(parse_quantity("0b101"), Ok(5));
        assert_eq!(parse_quantity("0x_ff"), Ok(255));
    }

    #[test]
    fn test_parse_quantity_rejects_malformed() {
        assert_eq!(parse_quantity(""), Err(QuantityError::Empty));
        assert_eq!(parse_quantity("   "), Err(QuantityError::Empty));
        assert_eq!(parse_quantity("-0x1"), Err(QuantityError::Negative("-0x1".to_string())));
        assert!(matches!(parse_quantity("0x"), Err(QuantityError::Invalid(_))));
        assert!(matches!(parse_quantity("0xzz"), Err(QuantityError::Invalid(_))));
        assert!(matches!(parse_quantity("010"), Err(QuantityError::Invalid(_))));
        assert!(matches!(parse_quantity("1__0"), Err(QuantityError::Invalid(_))));
        assert!(matches!(parse_quantity("_1"), Err(QuantityError::Invalid(_))));
        assert!(matches!(parse_quantity("12a"), Err(QuantityError::Invalid(_))));
    }

    #[test]
    fn test_parse_quantity_overflow() {
        let too_big = format!("0x1{}", "0".repeat(32));
        assert_eq!(parse_quantity(&too_big), Err(QuantityError::Overflow(too_big.clone())));
    }

    #[test]
    fn test_wei_to_eth() {
        assert_eq!(wei_to_eth(0), 0.0);
        assert_eq!(wei_to_eth(1_000_000_000_000_000_000), 1.0);
        assert!((wei_to_eth(1_500_000_000_000_000) - 0.0015).abs() < 1e-15);
    }

    #[test]
    fn test_aggregate_counts_zero_value_transactions() {
        let aggregate = aggregate(&[tx("0xde0b6b3a7640000"), tx("0x0")]).unwrap();
        assert_eq!(aggregate.transaction_count, 2);
        assert_eq!(aggregate.total_value, 1.0);
    }

    #[test]
    fn test_aggregate_empty_block() {
        let aggregate = aggregate(&[]).unwrap();
        assert_eq!(aggregate, BlockAggregate { transaction_count: 0, total_value: 0.0 });
    }

    #[test]
    fn test_aggregate_mixed_bases() {
        // 0.5 ETH in hex plus 0.25 ETH in decimal
        let aggregate = aggregate(&[tx("0x6f05b59d3b20000"), tx("250000000000000000")]).unwrap();
        assert_eq!(aggregate.transaction_count, 2);
        assert!((aggregate.total_value - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_aggregate_rejects_bad_value() {
        assert!(aggregate(&[tx("0x1"), tx("not a number")]).is_err());
    }

    #[test]
    fn test_build_record() {
        let payload = BlockPayload {
            block_number: 100,
            timestamp: "0x65920000".to_string(),
            transactions: vec![tx("0xde0b6b3a7640000"), tx("0x0")],
        };

        let record = build_record(&payload).unwrap();
        assert_eq!(
            record,
            BlockRecord { block_number: 100, transaction_count: 2, timestamp: 1_704_067_072, total_value: 1.0 }
        );
    }

    #[test]
    fn test_build_record_bad_timestamp() {
        let payload = BlockPayload { block_number: 9, timestamp: "yesterday".to_string(), transactions: vec![] };

        let err = build_record(&payload).unwrap_err();
        assert!(matches!(err, CrawlerError::Parse { block_number: 9, .. }));
        assert!(err.to_string().contains("timestamp"));
    }
}
