use crate::value_objects::series::SeriesTrade;
use crate::value_objects::statement::StatementRecord;
use std::collections::BTreeMap;

/// State of the drawdown run currently being accumulated.
#[derive(Debug, Default)]
struct RunState {
    drawdown: f64,
    length: u32,
    levels: BTreeMap<u32, f64>,
    start_balance: Option<f64>,
}

impl RunState {
    fn reset(&mut self) {
        self.drawdown = 0.0;
        self.length = 0;
        self.levels.clear();
        self.start_balance = None;
    }
}

/// Groups consecutive non-profitable deals into drawdown series.
///
/// The first statement record is an opening balance marker, not a deal, and
/// is dropped unconditionally. Each profitable deal closes the current run
/// and emits one `SeriesTrade` summarizing it; losing deals only accumulate.
/// A trailing run with no closing win emits nothing.
pub fn segment_deals(records: &[StatementRecord]) -> Vec<SeriesTrade> {
    let mut out = Vec::new();
    let mut run = RunState::default();

    for record in records.iter().skip(1) {
        let profit = record.profit;
        let balance = record.balance;

        // Anchor the series start balance whenever no run is in progress.
        let start_balance = match run.start_balance {
            Some(anchor) if run.drawdown != 0.0 => anchor,
            _ => {
                let anchor = balance - profit;
                run.start_balance = Some(anchor);
                anchor
            }
        };
        let net_change = balance - start_balance;

        if profit > 0.0 {
            if run.drawdown < 0.0 {
                out.push(SeriesTrade {
                    timestamp: record.timestamp,
                    volume: record.volume,
                    balance,
                    net_change,
                    drawdown: run.drawdown,
                    series_length: run.length + 1,
                    drawdown_levels: std::mem::take(&mut run.levels),
                });
                run.reset();
            } else {
                out.push(SeriesTrade {
                    timestamp: record.timestamp,
                    volume: record.volume,
                    balance,
                    net_change,
                    drawdown: 0.0,
                    series_length: 1,
                    drawdown_levels: BTreeMap::new(),
                });
            }
        } else {
            run.drawdown += profit;
            run.length += 1;
            run.levels.insert(run.length, run.drawdown);
        }
    }

    out
}
