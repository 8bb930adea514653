use serde::{Deserialize, Serialize};

/// One entry of the replayed account ledger: a settled trade series, or a
/// synthetic deposit/withdrawal injected by the money-management policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub timestamp: i64,
    pub change: f64,
    /// Balance after `change` (and any profit skim) was applied.
    pub balance: f64,
    /// Length of the series settled by this event; 0 for synthetic events.
    pub series_length: u32,
    /// Capital ratio applied to the series result; 0 for synthetic events.
    pub multiplier: u32,
    pub kind: LedgerKind,
    /// Profit removed from the account by the skim policy on this event.
    pub skim: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerKind {
    Trade,
    Deposit,
    Withdrawal,
}

impl LedgerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerKind::Trade => "trade",
            LedgerKind::Deposit => "deposit",
            LedgerKind::Withdrawal => "withdrawal",
        }
    }
}
