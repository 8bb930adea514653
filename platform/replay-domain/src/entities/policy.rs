use serde::{Deserialize, Serialize};

/// Tiered balance policy: ordered `(threshold, percent)` pairs, looked up by
/// "highest threshold at or below the current balance". Used both for the
/// risk split (percent of balance put at risk) and for profit skimming
/// (percent of a gain removed from the account).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierTable {
    tiers: Vec<Tier>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tier {
    pub threshold: f64,
    pub percent: f64,
}

impl TierTable {
    /// Builds a table sorted descending by threshold. Thresholds must be
    /// finite and non-negative, percents in (0, 100], duplicates rejected.
    pub fn new(tiers: Vec<(f64, f64)>) -> Result<Self, String> {
        if tiers.is_empty() {
            return Err("tier table cannot be empty".to_string());
        }
        let mut out: Vec<Tier> = Vec::with_capacity(tiers.len());
        for (threshold, percent) in tiers {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(format!("invalid tier threshold: {}", threshold));
            }
            if !percent.is_finite() || percent <= 0.0 || percent > 100.0 {
                return Err(format!(
                    "tier percent must be in (0, 100], got {}",
                    percent
                ));
            }
            if out.iter().any(|t| t.threshold == threshold) {
                return Err(format!("duplicate tier threshold: {}", threshold));
            }
            out.push(Tier { threshold, percent });
        }
        out.sort_by(|a, b| {
            b.threshold
                .partial_cmp(&a.threshold)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(Self { tiers: out })
    }

    /// Percent of the highest tier whose threshold is at or below `balance`,
    /// or `None` when the balance sits under every tier.
    pub fn lookup(&self, balance: f64) -> Option<f64> {
        self.tiers
            .iter()
            .find(|tier| tier.threshold <= balance)
            .map(|tier| tier.percent)
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }
}

/// Inclusive-exclusive time window, epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl DateWindow {
    pub fn contains(&self, timestamp: i64) -> bool {
        if let Some(start) = self.start {
            if timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if timestamp >= end {
                return false;
            }
        }
        true
    }
}

/// Full money-management policy for one replay run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaySettings {
    /// Starting balance, and the floor that triggers automatic deposits.
    pub initial_balance: f64,
    /// Series deeper than this substitute the drawdown recorded at exactly
    /// this depth for the series' net change.
    pub level_cap: u32,
    /// Baseline capital unit: position size scales with
    /// `floor(risky_balance / multiplier)`, minimum 1.
    pub multiplier: f64,
    pub window: Option<DateWindow>,
    /// Absent table puts the whole balance at risk.
    pub risk_tiers: Option<TierTable>,
    /// Absent table disables profit skimming.
    pub skim_tiers: Option<TierTable>,
}

impl ReplaySettings {
    pub fn validate(&self) -> Result<(), String> {
        if !self.initial_balance.is_finite() || self.initial_balance <= 0.0 {
            return Err(format!(
                "initial_balance must be positive, got {}",
                self.initial_balance
            ));
        }
        if self.level_cap < 1 {
            return Err("level_cap must be at least 1".to_string());
        }
        if !self.multiplier.is_finite() || self.multiplier <= 0.0 {
            return Err(format!(
                "multiplier must be positive, got {}",
                self.multiplier
            ));
        }
        if let Some(window) = &self.window {
            if let (Some(start), Some(end)) = (window.start, window.end) {
                if start >= end {
                    return Err(format!(
                        "date window start ({}) must be before end ({})",
                        start, end
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{DateWindow, ReplaySettings, TierTable};

    fn settings() -> ReplaySettings {
        ReplaySettings {
            initial_balance: 500.0,
            level_cap: 8,
            multiplier: 500.0,
            window: None,
            risk_tiers: None,
            skim_tiers: None,
        }
    }

    #[test]
    fn lookup_picks_highest_qualifying_threshold() {
        let table = TierTable::new(vec![(1000.0, 80.0), (5000.0, 60.0), (0.0, 100.0)])
            .expect("table should build");
        assert_eq!(table.lookup(400.0), Some(100.0));
        assert_eq!(table.lookup(1000.0), Some(80.0));
        assert_eq!(table.lookup(4999.0), Some(80.0));
        assert_eq!(table.lookup(12_000.0), Some(60.0));
    }

    #[test]
    fn lookup_below_every_tier_is_none() {
        let table = TierTable::new(vec![(1000.0, 80.0)]).expect("table should build");
        assert_eq!(table.lookup(999.99), None);
    }

    #[test]
    fn table_rejects_bad_percent_and_duplicates() {
        assert!(TierTable::new(vec![(100.0, 0.0)]).is_err());
        assert!(TierTable::new(vec![(100.0, 120.0)]).is_err());
        assert!(TierTable::new(vec![(100.0, 50.0), (100.0, 60.0)]).is_err());
        assert!(TierTable::new(Vec::new()).is_err());
    }

    #[test]
    fn settings_validation_fails_fast_on_bad_ranges() {
        let mut bad = settings();
        bad.multiplier = 0.0;
        assert!(bad.validate().is_err());

        let mut bad = settings();
        bad.initial_balance = -1.0;
        assert!(bad.validate().is_err());

        let mut bad = settings();
        bad.level_cap = 0;
        assert!(bad.validate().is_err());

        let mut bad = settings();
        bad.window = Some(DateWindow {
            start: Some(100),
            end: Some(100),
        });
        assert!(bad.validate().is_err());

        assert!(settings().validate().is_ok());
    }

    #[test]
    fn window_is_start_inclusive_end_exclusive() {
        let window = DateWindow {
            start: Some(10),
            end: Some(20),
        };
        assert!(!window.contains(9));
        assert!(window.contains(10));
        assert!(window.contains(19));
        assert!(!window.contains(20));
    }
}
