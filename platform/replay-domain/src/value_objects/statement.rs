use serde::{Deserialize, Serialize};

/// A single row ingested from a broker statement, numeric fields already
/// parsed. `timestamp` is epoch seconds in the statement's local time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementRecord {
    pub timestamp: i64,
    pub volume: f64,
    pub profit: f64,
    pub balance: f64,
    pub kind: RecordKind,
}

/// Broker statements mix ordinary deals with balance operations (deposits
/// and withdrawals the account holder made on the real account).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Deal,
    BalanceOp,
}

impl RecordKind {
    /// Maps a statement's type cell onto a record kind. Anything that is not
    /// recognizably a balance operation is treated as a deal, which is what
    /// the reports use for buy/sell rows across locales.
    pub fn from_label(label: &str) -> Self {
        let label = label.trim().to_lowercase();
        if label == "balance" || label.starts_with("пополнение") || label.starts_with("снятие") {
            RecordKind::BalanceOp
        } else {
            RecordKind::Deal
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RecordKind;

    #[test]
    fn balance_labels_map_to_balance_op() {
        assert_eq!(RecordKind::from_label("balance"), RecordKind::BalanceOp);
        assert_eq!(RecordKind::from_label(" Balance "), RecordKind::BalanceOp);
        assert_eq!(RecordKind::from_label("Пополнение"), RecordKind::BalanceOp);
    }

    #[test]
    fn trade_labels_map_to_deal() {
        assert_eq!(RecordKind::from_label("buy"), RecordKind::Deal);
        assert_eq!(RecordKind::from_label("sell"), RecordKind::Deal);
        assert_eq!(RecordKind::from_label(""), RecordKind::Deal);
    }
}
