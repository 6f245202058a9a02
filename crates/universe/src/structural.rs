//! Structural focus selection
//!
//! Determines which tickers are structurally important by ranking ETF
//! holdings by weight and taking the top N:
//!
//! - SPY: top 15
//! - QQQ: top 10
//! - DIA: top 10
//! - IWM: skipped (too fragmented for any constituent to matter)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Top-N threshold for a tracked ETF, or None when the ETF contributes
/// no structural entries
pub fn structural_threshold(etf: &str) -> Option<u32> {
    match etf {
        "SPY" => Some(15),
        "QQQ" => Some(10),
        "DIA" => Some(10),
        _ => None,
    }
}

/// ETFs that contribute structural entries, in fetch order
pub const STRUCTURAL_ETFS: [&str; 3] = ["SPY", "QQQ", "DIA"];

/// A raw ETF holding as reported by a holdings source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub symbol: String,
    /// Index weight in percent, e.g. 7.2
    pub weight_pct: f64,
}

/// A single ETF constituent after ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConstituent {
    pub ticker: String,
    pub etf: String,
    /// 1-based rank by weight within the ETF
    pub rank: u32,
    pub weight_pct: f64,
}

/// Source of ETF holdings data
#[async_trait]
pub trait HoldingsSource: Send + Sync {
    async fn holdings(&self, etf: &str) -> Result<Vec<Holding>>;
}

/// Rank holdings by weight descending and keep the ETF's top N.
///
/// Returns an empty list when the ETF has no structural threshold.
/// Holdings with an empty symbol are dropped; ranks stay 1-based over
/// the kept entries.
pub fn top_constituents(etf: &str, mut holdings: Vec<Holding>) -> Vec<IndexConstituent> {
    let etf = etf.to_uppercase();
    let Some(threshold) = structural_threshold(&etf) else {
        log::debug!("skipping {etf}: no structural threshold");
        return Vec::new();
    };

    holdings.sort_by(|a, b| {
        b.weight_pct
            .partial_cmp(&a.weight_pct)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    holdings
        .into_iter()
        .filter(|h| !h.symbol.is_empty())
        .take(threshold as usize)
        .enumerate()
        .map(|(i, h)| IndexConstituent {
            ticker: h.symbol.to_uppercase(),
            etf: etf.clone(),
            rank: i as u32 + 1,
            weight_pct: h.weight_pct,
        })
        .collect()
}

/// Fetch and rank structural constituents for all tracked ETFs.
///
/// A failing ETF is logged and skipped; the remaining ETFs still
/// contribute (graceful degradation, never an error).
pub async fn fetch_all_structural_focus(
    source: &dyn HoldingsSource,
) -> Vec<IndexConstituent> {
    let mut all = Vec::new();
    for etf in STRUCTURAL_ETFS {
        match source.holdings(etf).await {
            Ok(holdings) if holdings.is_empty() => {
                log::warn!("{etf}: no holdings returned");
            }
            Ok(holdings) => {
                let constituents = top_constituents(etf, holdings);
                log::info!("{}: {} structural tickers", etf, constituents.len());
                all.extend(constituents);
            }
            Err(e) => {
                log::warn!("failed to fetch holdings for {etf}: {e}");
            }
        }
    }
    all
}

/// Deduplicate tickers appearing in multiple ETFs, keeping the entry
/// with the higher weight (e.g. AAPL in both SPY and QQQ).
pub fn deduplicate_constituents(constituents: Vec<IndexConstituent>) -> Vec<IndexConstituent> {
    let mut best: std::collections::BTreeMap<String, IndexConstituent> =
        std::collections::BTreeMap::new();

    for c in constituents {
        match best.get(&c.ticker) {
            Some(existing) if existing.weight_pct >= c.weight_pct => {}
            _ => {
                best.insert(c.ticker.clone(), c);
            }
        }
    }

    best.into_values().collect()
}
