//! Per-symbol outlier filter
//!
//! This module implements the accept / reject / force-accept state machine
//! that guards the index sink against implausible quotes.
//!
//! ## Policy
//! For every supported symbol the filter remembers the last *accepted* rate
//! (the baseline) and how many rates in a row it has rejected since then.
//! A new rate is compared against the baseline by relative mid-price change:
//!
//! ```text
//! pct_change = |new_mid - last_mid| / last_mid
//! ```
//!
//! - first observation for a symbol → accepted unconditionally
//! - `pct_change <= threshold`      → accepted, counter reset
//! - `pct_change >  threshold`      → rejected, counter incremented,
//!   baseline untouched
//! - counter already at the limit   → accepted anyway (forced acceptance)
//!
//! The baseline is never updated on rejection, so a single bad tick cannot
//! poison every future comparison. The forced-acceptance override bounds the
//! worst case: a real market move is delayed by at most
//! `max_consecutive_outliers` observations before the baseline catches up.
//!
//! ## Degenerate baseline
//! When the baseline mid-price is zero the relative change is meaningless.
//! The incoming rate is treated as an automatic outlier and goes through the
//! same counter / forced-acceptance path as any other.
//!
//! ## Concurrency
//! Evaluations for different symbols run in parallel. Evaluations for the
//! same symbol serialize on a per-entry lock, so the read-decide-write step
//! is one atomic unit and the `(baseline, counter)` pair can never be
//! observed half-updated. The outer map lock is held only long enough to
//! fetch or lazily create the entry.
//!
//! This computation is pure and total given the configuration: no I/O, no
//! panics, every input produces a [`Evaluation`].

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::config::FilterConfig;
use crate::types::Rate;

/// Outcome of evaluating one rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// Accepted; the caller should forward the rate downstream.
    Forward,
    /// Rejected as a transient outlier; nothing goes downstream.
    Suppress,
    /// Symbol outside the allow-list; skipped without touching any state.
    Unsupported,
}

/// Mutable per-symbol history, updated as one unit under the entry lock.
#[derive(Debug, Default)]
struct SymbolState {
    /// Most recently accepted rate, `None` until the first acceptance.
    last_valid: Option<Rate>,
    /// Back-to-back rejections since the last acceptance.
    consecutive_outliers: u32,
}

impl SymbolState {
    fn accept(&mut self, rate: &Rate) {
        self.last_valid = Some(rate.clone());
        self.consecutive_outliers = 0;
    }
}

type SharedState = Arc<Mutex<SymbolState>>;

/// The per-symbol outlier-filtering state machine.
///
/// Holds one lazily created, process-lifetime state entry per distinct
/// supported symbol ever seen. No eviction.
pub struct OutlierFilter {
    cfg: FilterConfig,
    states: Mutex<HashMap<String, SharedState>>,
}

impl OutlierFilter {
    pub fn new(cfg: FilterConfig) -> Self {
        Self {
            cfg,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Decide whether `rate` should be forwarded downstream.
    ///
    /// Never blocks on I/O and never panics; the failure mode is purely the
    /// returned [`Evaluation`].
    pub fn evaluate(&self, rate: &Rate) -> Evaluation {
        if !self.cfg.is_supported(&rate.symbol) {
            debug!(symbol = %rate.symbol, "unsupported symbol, skipping");
            return Evaluation::Unsupported;
        }

        let entry = self.entry(&rate.symbol);
        let mut state = entry.lock();

        let last_mid = state.last_valid.as_ref().map(Rate::mid);

        let Some(last_mid) = last_mid else {
            // First-ever observation for this symbol.
            state.accept(rate);
            debug!(symbol = %rate.symbol, mid = rate.mid(), "first observation accepted");
            return Evaluation::Forward;
        };

        let new_mid = rate.mid();

        // A zero baseline makes the ratio meaningless: automatic outlier.
        let within_threshold =
            last_mid > 0.0 && ((new_mid - last_mid).abs() / last_mid) <= self.cfg.threshold;

        if within_threshold {
            state.accept(rate);
            debug!(symbol = %rate.symbol, mid = new_mid, "rate accepted");
            return Evaluation::Forward;
        }

        if state.consecutive_outliers >= self.cfg.max_consecutive_outliers {
            state.accept(rate);
            info!(
                symbol = %rate.symbol,
                mid = new_mid,
                baseline_mid = last_mid,
                "forced acceptance after consecutive outlier limit"
            );
            return Evaluation::Forward;
        }

        state.consecutive_outliers += 1;
        debug!(
            symbol = %rate.symbol,
            mid = new_mid,
            baseline_mid = last_mid,
            consecutive = state.consecutive_outliers,
            "outlier suppressed"
        );
        Evaluation::Suppress
    }

    /// Last accepted rate for a symbol, if any.
    pub fn baseline(&self, symbol: &str) -> Option<Rate> {
        let states = self.states.lock();
        let entry = states.get(symbol)?.clone();
        drop(states);
        entry.lock().last_valid.clone()
    }

    /// Current back-to-back rejection count for a symbol, if tracked.
    pub fn consecutive_outliers(&self, symbol: &str) -> Option<u32> {
        let states = self.states.lock();
        let entry = states.get(symbol)?.clone();
        drop(states);
        Some(entry.lock().consecutive_outliers)
    }

    /// Symbols with a state entry (first observed at least once).
    pub fn tracked_symbols(&self) -> Vec<String> {
        self.states.lock().keys().cloned().collect()
    }

    /// Fetch or lazily create the state entry for a supported symbol.
    fn entry(&self, symbol: &str) -> SharedState {
        let mut states = self.states.lock();
        states
            .entry(symbol.to_owned())
            .or_default()
            .clone()
    }
}
