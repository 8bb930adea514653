use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One closed drawdown series, emitted when a profitable deal ends a run of
/// consecutive non-profitable deals (or immediately for a standalone win).
///
/// `net_change` is the balance delta over the whole series, measured from the
/// balance at the series start. `drawdown_levels` maps within-series depth
/// (1st loss, 2nd loss, ...) to the cumulative drawdown at that depth, so a
/// replay can ask "what was the loss after exactly N consecutive losses".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesTrade {
    pub timestamp: i64,
    pub volume: f64,
    pub balance: f64,
    pub net_change: f64,
    pub drawdown: f64,
    pub series_length: u32,
    pub drawdown_levels: BTreeMap<u32, f64>,
}
