//! Pair list loader.
//!
//! The list is a plain comma-separated file, one pair per line:
//!
//! ```text
//! token0,token1,pair,decimals0,decimals1
//! ```
//!
//! Blank lines are ignored. A header row or any other row that does not parse
//! is skipped with a debug log, so the file can carry a header or comments.

use std::path::Path;

use alloy::primitives::Address;
use eyre::{eyre, Context, Result};

use crate::types::PairInfo;

/// Reads and parses a pair list file.
///
/// # Errors
/// Returns error if the file cannot be read or contains no valid rows.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_pairs(path: impl AsRef<Path>) -> Result<Vec<PairInfo>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read pair list {}", path.display()))?;

    let pairs = parse_pairs(&content);
    if pairs.is_empty() {
        return Err(eyre!("no valid pairs in {}", path.display()));
    }

    tracing::info!(count = pairs.len(), "loaded pair list");
    Ok(pairs)
}

/// Parses pair list text, skipping blank and malformed rows.
pub fn parse_pairs(content: &str) -> Vec<PairInfo> {
    let mut pairs = Vec::new();

    for (line_number, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match parse_row(trimmed) {
            Some(pair) => pairs.push(pair),
            None => {
                tracing::debug!(line_number = line_number + 1, row = trimmed, "skipping malformed pair row");
            }
        }
    }

    pairs
}

fn parse_row(row: &str) -> Option<PairInfo> {
    let parts: Vec<&str> = row.split(',').map(|p| p.trim().trim_matches('"')).collect();
    if parts.len() < 5 {
        return None;
    }

    Some(PairInfo {
        token0: parts[0].parse::<Address>().ok()?,
        token1: parts[1].parse::<Address>().ok()?,
        pair: parts[2].parse::<Address>().ok()?,
        decimals0: parts[3].parse::<u8>().ok()?,
        decimals1: parts[4].parse::<u8>().ok()?,
    })
}
