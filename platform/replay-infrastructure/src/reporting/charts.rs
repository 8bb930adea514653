//! Weekly chart data for the run report: series sizes per week and the
//! stepped last-known-balance line, with month/year boundary markers.

use chrono::{DateTime, Datelike, Utc};
use replay_domain::value_objects::ledger::LedgerEvent;
use replay_domain::value_objects::series::SeriesTrade;
use serde::Serialize;

const WEEK_SECONDS: i64 = 7 * 86_400;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekMark {
    pub week: usize,
    pub label: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WeeklyChartData {
    /// Number of week buckets between the first and last record, inclusive.
    pub weeks: usize,
    /// Last known balance per week, carried forward over weeks without
    /// events; `null` before the first balance is seen.
    pub balances: Vec<Option<f64>>,
    /// Series lengths closed in each week, in order.
    pub series_lengths: Vec<Vec<u32>>,
    pub month_marks: Vec<WeekMark>,
    pub year_marks: Vec<WeekMark>,
}

pub fn weekly_chart_data(series: &[SeriesTrade], events: &[LedgerEvent]) -> WeeklyChartData {
    let first = series
        .first()
        .map(|t| t.timestamp)
        .into_iter()
        .chain(events.first().map(|e| e.timestamp))
        .min();
    let last = series
        .last()
        .map(|t| t.timestamp)
        .into_iter()
        .chain(events.last().map(|e| e.timestamp))
        .max();
    let (Some(base), Some(last)) = (first, last) else {
        return WeeklyChartData::default();
    };

    let weeks = week_index(base, last) + 1;
    let mut balances: Vec<Option<f64>> = vec![None; weeks];
    let mut series_lengths: Vec<Vec<u32>> = vec![Vec::new(); weeks];

    for trade in series {
        let week = week_index(base, trade.timestamp);
        if week < weeks {
            series_lengths[week].push(trade.series_length);
        }
    }

    for event in events {
        let week = week_index(base, event.timestamp);
        if week < weeks {
            balances[week] = Some(event.balance);
        }
    }
    let mut last_known = None;
    for slot in balances.iter_mut() {
        match slot {
            Some(balance) => last_known = Some(*balance),
            None => *slot = last_known,
        }
    }

    let (month_marks, year_marks) = boundary_marks(base, weeks);

    WeeklyChartData {
        weeks,
        balances,
        series_lengths,
        month_marks,
        year_marks,
    }
}

fn week_index(base: i64, timestamp: i64) -> usize {
    let days = (timestamp - base).max(0) / 86_400;
    (days / 7) as usize
}

/// Weeks where a new month or year starts, labeled for the axis.
fn boundary_marks(base: i64, weeks: usize) -> (Vec<WeekMark>, Vec<WeekMark>) {
    let Some(base_date) = DateTime::<Utc>::from_timestamp(base, 0) else {
        return (Vec::new(), Vec::new());
    };
    let mut month_marks = Vec::new();
    let mut year_marks = Vec::new();
    let mut current_month = base_date.month();
    let mut current_year = base_date.year();

    for week in 0..weeks {
        let Some(week_date) =
            DateTime::<Utc>::from_timestamp(base + week as i64 * WEEK_SECONDS, 0)
        else {
            continue;
        };
        if week_date.month() != current_month {
            current_month = week_date.month();
            month_marks.push(WeekMark {
                week,
                label: MONTH_NAMES[(current_month - 1) as usize].to_string(),
            });
        }
        if week_date.year() != current_year {
            current_year = week_date.year();
            year_marks.push(WeekMark {
                week,
                label: current_year.to_string(),
            });
        }
    }
    (month_marks, year_marks)
}

#[cfg(test)]
mod tests {
    use super::{week_index, weekly_chart_data};
    use chrono::{TimeZone, Utc};
    use replay_domain::value_objects::ledger::{LedgerEvent, LedgerKind};
    use replay_domain::value_objects::series::SeriesTrade;
    use std::collections::BTreeMap;

    fn ts(y: i32, m: u32, d: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap().timestamp()
    }

    fn event(timestamp: i64, balance: f64) -> LedgerEvent {
        LedgerEvent {
            timestamp,
            change: 0.0,
            balance,
            series_length: 1,
            multiplier: 1,
            kind: LedgerKind::Trade,
            skim: 0.0,
        }
    }

    fn series_trade(timestamp: i64, series_length: u32) -> SeriesTrade {
        SeriesTrade {
            timestamp,
            volume: 0.1,
            balance: 0.0,
            net_change: 0.0,
            drawdown: 0.0,
            series_length,
            drawdown_levels: BTreeMap::new(),
        }
    }

    #[test]
    fn week_index_is_relative_to_the_first_record() {
        let base = ts(2023, 1, 2);
        assert_eq!(week_index(base, base), 0);
        assert_eq!(week_index(base, base + 6 * 86_400), 0);
        assert_eq!(week_index(base, base + 7 * 86_400), 1);
        assert_eq!(week_index(base, base + 20 * 86_400), 2);
    }

    #[test]
    fn balances_carry_forward_over_silent_weeks() {
        let base = ts(2023, 1, 2);
        let events = vec![
            event(base, 500.0),
            event(base + 86_400, 520.0),
            // nothing in weeks 1 and 2
            event(base + 21 * 86_400, 480.0),
        ];
        let data = weekly_chart_data(&[], &events);
        assert_eq!(data.weeks, 4);
        assert_eq!(
            data.balances,
            vec![Some(520.0), Some(520.0), Some(520.0), Some(480.0)]
        );
    }

    #[test]
    fn series_lengths_group_by_week() {
        let base = ts(2023, 1, 2);
        let series = vec![
            series_trade(base, 1),
            series_trade(base + 2 * 86_400, 4),
            series_trade(base + 8 * 86_400, 2),
        ];
        let data = weekly_chart_data(&series, &[]);
        assert_eq!(data.weeks, 2);
        assert_eq!(data.series_lengths[0], vec![1, 4]);
        assert_eq!(data.series_lengths[1], vec![2]);
        assert_eq!(data.balances, vec![None, None]);
    }

    #[test]
    fn month_and_year_boundaries_are_marked() {
        let base = ts(2023, 12, 4);
        let events = vec![event(base, 500.0), event(ts(2024, 2, 5), 600.0)];
        let data = weekly_chart_data(&[], &events);

        assert!(data
            .year_marks
            .iter()
            .any(|mark| mark.label == "2024"));
        assert!(data
            .month_marks
            .iter()
            .any(|mark| mark.label == "Jan" || mark.label == "Feb"));
        for mark in data.month_marks.iter().chain(data.year_marks.iter()) {
            assert!(mark.week < data.weeks);
        }
    }

    #[test]
    fn empty_inputs_produce_an_empty_chart() {
        let data = weekly_chart_data(&[], &[]);
        assert_eq!(data.weeks, 0);
        assert!(data.balances.is_empty());
        assert!(data.month_marks.is_empty());
    }
}
