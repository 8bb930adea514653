use crate::entities::policy::{ReplaySettings, TierTable};
use crate::value_objects::ledger::{LedgerEvent, LedgerKind};
use crate::value_objects::series::SeriesTrade;

/// Synthetic deposits/withdrawals sort right after their triggering trade.
const TOP_UP_DELAY_SECONDS: i64 = 5;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ReplaySummary {
    pub trades: u64,
    pub deposits: u64,
    pub withdrawals: u64,
    pub deposited_total: f64,
    pub withdrawn_total: f64,
    pub skimmed_total: f64,
    pub final_balance: f64,
    pub first_timestamp: Option<i64>,
    pub last_timestamp: Option<i64>,
}

#[derive(Debug)]
pub struct ReplayOutcome {
    pub events: Vec<LedgerEvent>,
    pub summary: ReplaySummary,
}

/// Replays a segmented trade sequence under a money-management policy,
/// re-deriving every series' profit/loss from the capital the policy puts at
/// risk and injecting deposits/withdrawals on balance thresholds.
pub fn replay_balance(
    series: &[SeriesTrade],
    settings: &ReplaySettings,
) -> Result<ReplayOutcome, String> {
    settings.validate()?;
    let mut engine = ReplayEngine::new(settings);
    for trade in series {
        engine.process(trade);
    }
    Ok(engine.into_outcome())
}

struct ReplayEngine<'a> {
    settings: &'a ReplaySettings,
    balance: f64,
    deposits: u64,
    withdrawals: u64,
    deposited_total: f64,
    withdrawn_total: f64,
    skimmed_total: f64,
    trades: u64,
    events: Vec<LedgerEvent>,
}

impl<'a> ReplayEngine<'a> {
    fn new(settings: &'a ReplaySettings) -> Self {
        Self {
            settings,
            balance: settings.initial_balance,
            deposits: 0,
            withdrawals: 0,
            deposited_total: 0.0,
            withdrawn_total: 0.0,
            skimmed_total: 0.0,
            trades: 0,
            events: Vec::new(),
        }
    }

    fn process(&mut self, trade: &SeriesTrade) {
        if let Some(window) = &self.settings.window {
            if !window.contains(trade.timestamp) {
                return;
            }
        }

        self.settle_trade(trade);
        self.top_up_if_below_floor(trade.timestamp);
        self.withdraw_if_above_target(trade.timestamp);
    }

    /// Steps 1-7 of the per-trade walk: cap the series result, split the
    /// balance into risky/buffer, scale by the capital ratio, clamp the loss
    /// to what was at risk, skim profit, and emit the trade event.
    fn settle_trade(&mut self, trade: &SeriesTrade) {
        let mut result = if trade.series_length > self.settings.level_cap {
            trade
                .drawdown_levels
                .get(&self.settings.level_cap)
                .copied()
                .unwrap_or(0.0)
        } else {
            trade.net_change
        };

        let (mut risky, buffer) = split_risky(self.balance, self.settings.risk_tiers.as_ref());

        let ratio = capital_ratio(risky, self.settings.multiplier);
        result *= ratio as f64;

        // A series can never lose more than the capital that was at risk.
        let mut change = if risky + result < 0.0 {
            let capped = -risky;
            risky = 0.0;
            capped
        } else {
            risky += result;
            result
        };

        self.balance = risky + buffer;

        let mut skim = 0.0;
        if change > 0.0 {
            if let Some(tiers) = &self.settings.skim_tiers {
                if let Some(percent) = tiers.lookup(self.balance) {
                    skim = change * percent / 100.0;
                    change -= skim;
                    self.balance -= skim;
                    self.skimmed_total += skim;
                }
            }
        }

        self.trades += 1;
        self.events.push(LedgerEvent {
            timestamp: trade.timestamp,
            change,
            balance: self.balance,
            series_length: trade.series_length,
            multiplier: ratio,
            kind: LedgerKind::Trade,
            skim,
        });
    }

    fn top_up_if_below_floor(&mut self, trade_timestamp: i64) {
        if self.balance >= self.settings.initial_balance {
            return;
        }
        let amount = self.settings.initial_balance - self.balance;
        self.balance = self.settings.initial_balance;
        self.deposits += 1;
        self.deposited_total += amount;
        self.events.push(LedgerEvent {
            timestamp: trade_timestamp + TOP_UP_DELAY_SECONDS,
            change: amount,
            balance: self.balance,
            series_length: 0,
            multiplier: 0,
            kind: LedgerKind::Deposit,
            skim: 0.0,
        });
    }

    /// Withdrawals only recoup earlier deposits, one for one.
    fn withdraw_if_above_target(&mut self, trade_timestamp: i64) {
        let target = self.settings.multiplier * 2.0 + self.settings.initial_balance;
        if self.balance < target || self.withdrawals >= self.deposits {
            return;
        }
        self.balance -= self.settings.initial_balance;
        self.withdrawals += 1;
        self.withdrawn_total += self.settings.initial_balance;
        self.events.push(LedgerEvent {
            timestamp: trade_timestamp + TOP_UP_DELAY_SECONDS,
            change: -self.settings.initial_balance,
            balance: self.balance,
            series_length: 0,
            multiplier: 0,
            kind: LedgerKind::Withdrawal,
            skim: 0.0,
        });
    }

    fn into_outcome(self) -> ReplayOutcome {
        let summary = ReplaySummary {
            trades: self.trades,
            deposits: self.deposits,
            withdrawals: self.withdrawals,
            deposited_total: self.deposited_total,
            withdrawn_total: self.withdrawn_total,
            skimmed_total: self.skimmed_total,
            final_balance: self.balance,
            first_timestamp: self.events.first().map(|e| e.timestamp),
            last_timestamp: self.events.last().map(|e| e.timestamp),
        };
        ReplayOutcome {
            events: self.events,
            summary,
        }
    }
}

/// Rebuilds a run summary from a persisted ledger, for report regeneration.
pub fn summarize_events(events: &[LedgerEvent]) -> ReplaySummary {
    let mut summary = ReplaySummary {
        trades: 0,
        deposits: 0,
        withdrawals: 0,
        deposited_total: 0.0,
        withdrawn_total: 0.0,
        skimmed_total: 0.0,
        final_balance: events.last().map(|e| e.balance).unwrap_or(0.0),
        first_timestamp: events.first().map(|e| e.timestamp),
        last_timestamp: events.last().map(|e| e.timestamp),
    };
    for event in events {
        match event.kind {
            LedgerKind::Trade => {
                summary.trades += 1;
                summary.skimmed_total += event.skim;
            }
            LedgerKind::Deposit => {
                summary.deposits += 1;
                summary.deposited_total += event.change;
            }
            LedgerKind::Withdrawal => {
                summary.withdrawals += 1;
                summary.withdrawn_total += -event.change;
            }
        }
    }
    summary
}

fn split_risky(balance: f64, tiers: Option<&TierTable>) -> (f64, f64) {
    match tiers.and_then(|t| t.lookup(balance)) {
        Some(percent) => {
            let risky = balance * percent / 100.0;
            (risky, balance - risky)
        }
        None => (balance, 0.0),
    }
}

fn capital_ratio(risky_balance: f64, multiplier: f64) -> u32 {
    let ratio = (risky_balance / multiplier).floor();
    if ratio < 1.0 {
        1
    } else {
        ratio as u32
    }
}
