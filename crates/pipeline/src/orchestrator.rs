//! Two-pass daily pipeline coordinator
//!
//! Pass 1 refreshes the FOCUS tier from structural index weights and the
//! event calendar, the main section evaluates every active ticker
//! concurrently, and pass 2 feeds the results back into the universe:
//! stress promotion, inactivity accounting, expiry, and the capacity cap.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use basalt_universe::{
    deduplicate_constituents, fetch_all_events, fetch_all_structural_focus, CalendarSource,
    HoldingsSource, UniverseManager,
};
use chrono::NaiveDate;
use tokio::task::JoinSet;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::ports::FeatureStore;
use crate::processor::{Evaluation, Processor};

/// Pipeline coordinator owning the universe state and the evaluator
pub struct Orchestrator {
    universe: UniverseManager,
    processor: Arc<Processor>,
    config: PipelineConfig,
}

impl Orchestrator {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let processor = Processor::new(
            config.window,
            config.min_periods,
            config.drift_threshold,
        )?;
        Ok(Self {
            universe: UniverseManager::with_config(config.universe.clone()),
            processor: Arc::new(processor),
            config,
        })
    }

    pub fn universe(&self) -> &UniverseManager {
        &self.universe
    }

    /// Run the full two-pass cycle for one date.
    ///
    /// `holdings` and `calendar` are optional: without them pass 1 is
    /// skipped and the universe carries over from the previous cycle.
    pub async fn run_diagnostics(
        &mut self,
        store: Arc<dyn FeatureStore>,
        holdings: Option<&dyn HoldingsSource>,
        calendar: Option<&dyn CalendarSource>,
        target: NaiveDate,
    ) -> Result<BTreeMap<String, Evaluation>> {
        if holdings.is_some() || calendar.is_some() {
            self.update_focus(holdings, calendar, target).await;
        }

        let active = self.universe.get_active_tickers();
        log::info!("processing {} tickers: {:?}", active.len(), active);

        let mut set = JoinSet::new();
        for ticker in &active {
            let store = Arc::clone(&store);
            let processor = Arc::clone(&self.processor);
            let ticker = ticker.clone();
            let lookback = self.config.lookback_days;
            set.spawn(async move {
                match store.load_panel(&ticker, target, lookback).await {
                    Ok(panel) => Some((ticker.clone(), processor.evaluate(&ticker, target, &panel))),
                    Err(e) => {
                        log::error!("failed to load features for {ticker}: {e}");
                        None
                    }
                }
            });
        }

        let mut results: BTreeMap<String, Evaluation> = BTreeMap::new();
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Some((ticker, evaluation))) => {
                    results.insert(ticker, evaluation);
                }
                Ok(None) => {}
                Err(e) => log::error!("evaluation task failed: {e}"),
            }
        }

        for (ticker, evaluation) in &results {
            let score = match evaluation.stress.unusualness {
                Some(u) => format!("U={u:.1}"),
                None => "U=N/A".to_string(),
            };
            log::info!(
                "  {}: {} ({})",
                ticker,
                evaluation.output.regime_result.regime.description(),
                score
            );
        }

        self.stress_update(&results, target);
        Ok(results)
    }

    /// Evaluate one ticker ad hoc, without touching the universe
    pub async fn run_single_ticker(
        &self,
        store: &dyn FeatureStore,
        ticker: &str,
        target: NaiveDate,
    ) -> Result<Evaluation> {
        let panel = store
            .load_panel(ticker, target, self.config.lookback_days)
            .await?;
        Ok(self.processor.evaluate(ticker, target, &panel))
    }

    /// Pass 1: structural and event promotion.
    ///
    /// Source failures degrade to empty result sets inside the universe
    /// crate; this pass never blocks the main evaluation.
    async fn update_focus(
        &mut self,
        holdings: Option<&dyn HoldingsSource>,
        calendar: Option<&dyn CalendarSource>,
        target: NaiveDate,
    ) {
        if let Some(holdings) = holdings {
            let constituents =
                deduplicate_constituents(fetch_all_structural_focus(holdings).await);
            let mut promoted = 0;
            let total = constituents.len();
            for c in constituents {
                if self
                    .universe
                    .promote_structural(&c.ticker, &c.etf, c.rank, target)
                {
                    promoted += 1;
                }
            }
            log::info!("structural focus: {promoted} new of {total} constituents");
        }

        if let Some(calendar) = calendar {
            let events =
                fetch_all_events(calendar, Some(calendar), target, self.config.event_window_days)
                    .await;
            let total = events.len();
            let mut promoted = 0;
            for event in &events {
                if let Some(ticker) = &event.ticker {
                    if self.universe.promote_event(ticker, &event.description, target) {
                        promoted += 1;
                    }
                }
            }
            log::info!("event focus: {promoted} new promotions from {total} events");
        }
    }

    /// Pass 2: stress feedback, inactivity accounting, expiry, cap
    fn stress_update(&mut self, results: &BTreeMap<String, Evaluation>, target: NaiveDate) {
        for (ticker, evaluation) in results {
            if self.universe.get_core_tickers().contains(ticker) {
                continue;
            }

            // A stress re-trigger counts as activity, not silence: only
            // genuinely quiet cycles advance the expiry counter
            if evaluation.stress.is_stressed(self.universe.config()) {
                self.universe
                    .promote_if_stressed(ticker, &evaluation.stress, target);
            } else if self.universe.get_focus_tickers().contains_key(ticker) {
                self.universe.increment_inactive(ticker);
            }
        }

        let expired = self.universe.expire_inactive();
        if !expired.is_empty() {
            log::info!("expired {} FOCUS tickers: {:?}", expired.len(), expired);
        }

        let focus = self.universe.get_focus_tickers();
        let scores: HashMap<String, f64> = results
            .iter()
            .filter(|(t, _)| focus.contains_key(*t))
            .map(|(t, e)| (t.clone(), e.stress.unusualness.unwrap_or(0.0)))
            .collect();
        let z_gex: HashMap<String, f64> = results
            .iter()
            .filter(|(t, _)| focus.contains_key(*t))
            .map(|(t, e)| (t.clone(), e.stress.z_gex.unwrap_or(0.0)))
            .collect();

        let evicted = self.universe.enforce_focus_cap(&scores, &z_gex);
        if !evicted.is_empty() {
            log::info!("evicted {} FOCUS tickers over cap: {:?}", evicted.len(), evicted);
        }
    }
}
