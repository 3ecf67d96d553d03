//! Liquidity Ranker
//!
//! Orders every token's DEX listings by liquidity (highest first) and builds
//! the ranked export rows: best pool per token, tokens by liquidity.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::models::types::{normalize_address, ExportRow, SecurityMetadata, TokenSecurity};

/// Sort one token's DEX entries by liquidity, descending.
/// `sort_by` is stable, so ties keep provider order.
pub fn rank_token(token: &mut TokenSecurity) {
    token
        .dex
        .sort_by(|a, b| b.liquidity_value().total_cmp(&a.liquidity_value()));
}

/// Rank every token entry of every response, in place
pub fn normalize(metadata: &mut SecurityMetadata) {
    for response in metadata.values_mut() {
        for token in response.result.values_mut() {
            rank_token(token);
        }
    }
}

/// One row per (token, DEX entry) for the token each response was queried
/// for. Entries of other addresses in the same response are ignored.
pub fn export_rows(metadata: &SecurityMetadata) -> Vec<ExportRow> {
    let mut rows = Vec::new();

    for (address, response) in metadata {
        let wanted = normalize_address(address);
        for (result_address, details) in &response.result {
            if normalize_address(result_address) != wanted {
                continue;
            }
            for dex in &details.dex {
                rows.push(ExportRow {
                    token_address: address.clone(),
                    token_name: details.token_name.clone().unwrap_or_default(),
                    token_symbol: details.token_symbol.clone().unwrap_or_default(),
                    liquidity_value: dex.liquidity_value(),
                });
            }
        }
    }

    rows
}

/// Keep the first row per token, then order tokens by liquidity, descending.
/// Run after [`normalize`] so the first row is the deepest pool.
pub fn rank_rows(rows: Vec<ExportRow>) -> Vec<ExportRow> {
    let mut seen = HashSet::new();
    let mut unique: Vec<ExportRow> = rows
        .into_iter()
        .filter(|row| seen.insert(row.token_address.clone()))
        .collect();

    unique.sort_by(|a, b| {
        b.liquidity_value
            .partial_cmp(&a.liquidity_value)
            .unwrap_or(Ordering::Equal)
    });
    unique
}

/// `normalize` + `export_rows` + `rank_rows`
pub fn ranked_export(metadata: &mut SecurityMetadata) -> Vec<ExportRow> {
    normalize(metadata);
    rank_rows(export_rows(metadata))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::SecurityResponse;

    fn response(token: &str, name: &str, liquidity: &[&str]) -> SecurityResponse {
        let dex: Vec<serde_json::Value> = liquidity
            .iter()
            .enumerate()
            .map(|(i, l)| serde_json::json!({"liquidity": l, "pair": format!("pair{}", i)}))
            .collect();
        let mut result = serde_json::Map::new();
        result.insert(
            token.to_string(),
            serde_json::json!({"token_name": name, "token_symbol": name.to_uppercase(), "dex": dex}),
        );
        serde_json::from_value(serde_json::json!({"code": 1, "result": result})).unwrap()
    }

    fn liquidities(metadata: &SecurityMetadata, token: &str) -> Vec<f64> {
        metadata[token].result[token]
            .dex
            .iter()
            .map(|d| d.liquidity_value())
            .collect()
    }

    #[test]
    fn test_sorts_descending() {
        let mut metadata = SecurityMetadata::new();
        metadata.insert("0xt2".to_string(), response("0xt2", "bar", &["10", "500", "50"]));

        normalize(&mut metadata);

        assert_eq!(liquidities(&metadata, "0xt2"), vec![500.0, 50.0, 10.0]);
    }

    #[test]
    fn test_ties_keep_provider_order() {
        let mut metadata = SecurityMetadata::new();
        metadata.insert("0xt".to_string(), response("0xt", "t", &["5", "7", "5.0", "5"]));

        normalize(&mut metadata);

        let pairs: Vec<&str> = metadata["0xt"].result["0xt"]
            .dex
            .iter()
            .map(|d| d.extra["pair"].as_str().unwrap())
            .collect();
        assert_eq!(pairs, vec!["pair1", "pair0", "pair2", "pair3"]);
    }

    #[test]
    fn test_non_increasing_after_normalize() {
        let mut metadata = SecurityMetadata::new();
        metadata.insert(
            "0xa".to_string(),
            response("0xa", "a", &["1.5", "abc", "99999.01", "0", "42", "1e3"]),
        );
        metadata.insert("0xb".to_string(), response("0xb", "b", &["3", "2", "1"]));

        normalize(&mut metadata);

        for token in ["0xa", "0xb"] {
            let values = liquidities(&metadata, token);
            assert!(values.windows(2).all(|w| w[0] >= w[1]), "{:?}", values);
        }
    }

    #[test]
    fn test_ranked_export_dedups_and_sorts() {
        let mut metadata = SecurityMetadata::new();
        metadata.insert("0xsmall".to_string(), response("0xsmall", "small", &["5", "20"]));
        metadata.insert("0xbig".to_string(), response("0xbig", "big", &["100", "3000"]));
        metadata.insert("0xnone".to_string(), response("0xnone", "none", &[]));

        let rows = ranked_export(&mut metadata);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].token_address, "0xbig");
        assert_eq!(rows[0].token_symbol, "BIG");
        assert_eq!(rows[0].liquidity_value, 3000.0);
        assert_eq!(rows[1].token_address, "0xsmall");
        assert_eq!(rows[1].liquidity_value, 20.0);
    }

    #[test]
    fn test_export_ignores_foreign_result_keys() {
        let mut metadata = SecurityMetadata::new();
        let mut other = response("0xother", "other", &["1000"]);
        other.result.extend(response("0xmine", "mine", &["1"]).result);
        metadata.insert("0xmine".to_string(), other);

        let rows = export_rows(&metadata);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].token_name, "mine");
    }
}
