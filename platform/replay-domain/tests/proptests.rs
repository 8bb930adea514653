use proptest::prelude::*;
use replay_domain::entities::policy::{ReplaySettings, TierTable};
use replay_domain::services::replay::replay_balance;
use replay_domain::services::segmenter::segment_deals;
use replay_domain::value_objects::ledger::LedgerKind;
use replay_domain::value_objects::series::SeriesTrade;
use replay_domain::value_objects::statement::{RecordKind, StatementRecord};
use std::collections::BTreeMap;

fn records_from_profits(profits: &[f64]) -> Vec<StatementRecord> {
    let mut balance = 10_000.0;
    let mut records = vec![StatementRecord {
        timestamp: 0,
        volume: 0.0,
        profit: 0.0,
        balance,
        kind: RecordKind::BalanceOp,
    }];
    for (idx, profit) in profits.iter().copied().enumerate() {
        balance += profit;
        records.push(StatementRecord {
            timestamp: (idx as i64 + 1) * 60,
            volume: 0.1,
            profit,
            balance,
            kind: RecordKind::Deal,
        });
    }
    records
}

fn series_from_changes(changes: &[f64]) -> Vec<SeriesTrade> {
    changes
        .iter()
        .copied()
        .enumerate()
        .map(|(idx, net_change)| SeriesTrade {
            timestamp: (idx as i64 + 1) * 60,
            volume: 0.1,
            balance: 0.0,
            net_change,
            drawdown: net_change.min(0.0),
            series_length: 1,
            drawdown_levels: BTreeMap::new(),
        })
        .collect()
}

fn base_settings() -> ReplaySettings {
    ReplaySettings {
        initial_balance: 500.0,
        level_cap: 8,
        multiplier: 500.0,
        window: None,
        risk_tiers: None,
        skim_tiers: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    #[test]
    fn all_winning_deals_segment_one_to_one(profits in prop::collection::vec(0.01f64..500.0, 1..60)) {
        let records = records_from_profits(&profits);
        let series = segment_deals(&records);
        prop_assert_eq!(series.len(), profits.len());
        for trade in &series {
            prop_assert_eq!(trade.series_length, 1);
            prop_assert_eq!(trade.drawdown, 0.0);
            prop_assert!(trade.drawdown_levels.is_empty());
        }
    }

    #[test]
    fn segmented_series_never_outnumber_wins(profits in prop::collection::vec(-300.0f64..300.0, 1..80)) {
        let records = records_from_profits(&profits);
        let series = segment_deals(&records);
        let wins = profits.iter().filter(|p| **p > 0.0).count();
        prop_assert_eq!(series.len(), wins);
        for trade in &series {
            prop_assert!(trade.drawdown <= 0.0);
            prop_assert_eq!(trade.drawdown_levels.len() as u32, trade.series_length - 1);
        }
    }

    #[test]
    fn replay_keeps_balance_invariants(changes in prop::collection::vec(-400.0f64..400.0, 1..80)) {
        let series = series_from_changes(&changes);
        let settings = base_settings();
        let outcome = replay_balance(&series, &settings).expect("replay");

        let mut deposits = 0u64;
        let mut withdrawals = 0u64;
        for event in &outcome.events {
            prop_assert!(event.balance.is_finite());
            prop_assert!(event.balance >= 0.0);
            match event.kind {
                LedgerKind::Trade => {
                    prop_assert!(event.multiplier >= 1);
                }
                LedgerKind::Deposit => {
                    deposits += 1;
                    // A deposit always restores the balance to exactly the floor.
                    prop_assert_eq!(event.balance, settings.initial_balance);
                }
                LedgerKind::Withdrawal => {
                    withdrawals += 1;
                    prop_assert!(withdrawals <= deposits);
                    prop_assert_eq!(event.change, -settings.initial_balance);
                }
            }
        }
        prop_assert_eq!(deposits, outcome.summary.deposits);
        prop_assert_eq!(withdrawals, outcome.summary.withdrawals);
    }

    #[test]
    fn deposit_follows_every_below_floor_trade(changes in prop::collection::vec(-400.0f64..400.0, 1..60)) {
        let series = series_from_changes(&changes);
        let settings = base_settings();
        let outcome = replay_balance(&series, &settings).expect("replay");

        for pair in outcome.events.windows(2) {
            if pair[0].kind == LedgerKind::Trade && pair[0].balance < settings.initial_balance {
                prop_assert_eq!(pair[1].kind, LedgerKind::Deposit);
                prop_assert_eq!(pair[1].timestamp, pair[0].timestamp + 5);
            }
        }
        if let Some(last) = outcome.events.last() {
            prop_assert!(last.balance >= settings.initial_balance || last.kind != LedgerKind::Trade);
        }
    }

    #[test]
    fn risk_tiers_never_produce_negative_balances(
        changes in prop::collection::vec(-600.0f64..600.0, 1..60),
        percent in 10.0f64..100.0,
    ) {
        let series = series_from_changes(&changes);
        let mut settings = base_settings();
        settings.initial_balance = 2000.0;
        settings.risk_tiers = Some(TierTable::new(vec![(0.0, percent)]).expect("table"));

        let outcome = replay_balance(&series, &settings).expect("replay");
        for event in &outcome.events {
            prop_assert!(event.balance >= 0.0);
        }
    }
}
