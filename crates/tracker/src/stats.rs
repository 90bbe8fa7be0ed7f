use std::collections::BTreeMap;
use std::fmt::Write as _;

use common::{Horizon, HorizonStats, MethodStatistics, SignalOutcome};

/// Per-method statistics over recorded outcomes, sorted by method name.
///
/// Win rate treats unresolved horizons as losses: a signal whose price
/// could not be sampled did not win. Average return is over resolved
/// horizons only, since a null sample says nothing about magnitude.
pub fn aggregate(outcomes: &[SignalOutcome]) -> Vec<MethodStatistics> {
    let mut by_method: BTreeMap<&str, Vec<&SignalOutcome>> = BTreeMap::new();
    for outcome in outcomes {
        by_method.entry(&outcome.method).or_default().push(outcome);
    }

    by_method
        .into_iter()
        .map(|(method, rows)| {
            let n = rows.len() as f64;
            let mut horizons = [HorizonStats::default(); 5];

            for horizon in Horizon::ALL {
                let mut wins = 0u64;
                let mut returns = Vec::new();
                for row in &rows {
                    let cell = row.horizon(horizon);
                    if cell.profitable == Some(true) {
                        wins += 1;
                    }
                    if let Some(pct) = cell.pct_change {
                        returns.push(pct);
                    }
                }
                horizons[horizon.idx()] = HorizonStats {
                    win_rate: wins as f64 / n,
                    avg_return: if returns.is_empty() {
                        0.0
                    } else {
                        returns.iter().sum::<f64>() / returns.len() as f64
                    },
                };
            }

            MethodStatistics {
                method: method.to_string(),
                signal_count: rows.len() as u64,
                avg_quality: rows.iter().map(|r| r.quality as f64).sum::<f64>() / n,
                avg_score: rows.iter().map(|r| r.score).sum::<f64>() / n,
                horizons,
            }
        })
        .collect()
}

/// The method to prefer going forward: best 1h win rate, 1h average
/// return as the tiebreaker.
pub fn best_method(stats: &[MethodStatistics]) -> Option<&MethodStatistics> {
    stats.iter().max_by(|a, b| {
        let (a1h, b1h) = (a.horizon(Horizon::H1), b.horizon(Horizon::H1));
        a1h.win_rate
            .total_cmp(&b1h.win_rate)
            .then(a1h.avg_return.total_cmp(&b1h.avg_return))
    })
}

/// Plain-text comparison table, one block per method.
pub fn format_report(stats: &[MethodStatistics]) -> String {
    let mut out = String::new();
    if stats.is_empty() {
        out.push_str("No tracked outcomes yet.\n");
        return out;
    }

    for s in stats {
        let _ = writeln!(
            out,
            "method {} | signals {} | avg quality {:.1} | avg score {:.1}",
            s.method, s.signal_count, s.avg_quality, s.avg_score
        );
        for horizon in Horizon::ALL {
            let h = s.horizon(horizon);
            let _ = writeln!(
                out,
                "  {:>3}: win rate {:>5.1}%  avg return {:+.2}%",
                horizon.label(),
                h.win_rate * 100.0,
                h.avg_return
            );
        }
    }

    if let Some(best) = best_method(stats) {
        let _ = writeln!(
            out,
            "best: {} ({:.1}% at 1h)",
            best.method,
            best.horizon(Horizon::H1).win_rate * 100.0
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use common::{HorizonOutcome, SignalDirection};

    fn t0() -> DateTime<Utc> {
        "2026-08-01T12:00:00Z".parse().unwrap()
    }

    fn outcome(method: &str, at_1h: Option<(f64, bool)>) -> SignalOutcome {
        let mut horizons = [HorizonOutcome::default(); 5];
        if let Some((pct, win)) = at_1h {
            horizons[Horizon::H1.idx()] = HorizonOutcome {
                price: Some(100.0 * (1.0 + pct / 100.0)),
                pct_change: Some(pct),
                profitable: Some(win),
            };
        }
        SignalOutcome {
            signal_id: uuid_ish(method, at_1h),
            symbol: "BTC".into(),
            entry_price: 100.0,
            entry_time: t0(),
            direction: SignalDirection::Buy,
            score: 40.0,
            quality: 80,
            horizons,
            method: method.into(),
            tracked_at: t0(),
        }
    }

    fn uuid_ish(method: &str, at_1h: Option<(f64, bool)>) -> String {
        format!("{method}-{at_1h:?}")
    }

    #[test]
    fn unresolved_horizons_count_as_losses_but_not_in_avg_return() {
        let outcomes = vec![
            outcome("base_v1", Some((2.0, true))),
            outcome("base_v1", Some((-1.0, false))),
            outcome("base_v1", None),
        ];

        let stats = aggregate(&outcomes);
        assert_eq!(stats.len(), 1);
        let h1 = stats[0].horizon(Horizon::H1);

        // One win out of three signals, null included in the denominator.
        assert!((h1.win_rate - 1.0 / 3.0).abs() < 1e-12);
        // Average over the two resolved returns only.
        assert!((h1.avg_return - 0.5).abs() < 1e-12);

        // A horizon with no resolutions at all reports 0/0 as 0.0/0.0.
        let h24 = stats[0].horizon(Horizon::H24);
        assert_eq!(h24.win_rate, 0.0);
        assert_eq!(h24.avg_return, 0.0);
    }

    #[test]
    fn best_method_prefers_win_rate_then_return() {
        let outcomes = vec![
            // alpha: 50% at 1h, avg +0.5
            outcome("alpha", Some((2.0, true))),
            outcome("alpha", Some((-1.0, false))),
            // beta: 50% at 1h, avg +1.0
            outcome("beta", Some((3.0, true))),
            outcome("beta", Some((-1.0, false))),
            // gamma: 0% at 1h
            outcome("gamma", Some((-2.0, false))),
        ];

        let stats = aggregate(&outcomes);
        let best = best_method(&stats).unwrap();
        assert_eq!(best.method, "beta");
    }

    #[test]
    fn win_rates_separate_methods_cleanly() {
        // A: 3 signals, 2 profitable at 1h. B: 5 signals, 1 profitable.
        let mut outcomes = vec![
            outcome("A", Some((2.0, true))),
            outcome("A", Some((1.0, true))),
            outcome("A", Some((-1.0, false))),
            outcome("B", Some((3.0, true))),
        ];
        for pct in [-1.0, -2.0, -0.5, -1.5] {
            outcomes.push(outcome("B", Some((pct, false))));
        }

        let stats = aggregate(&outcomes);
        let a = stats.iter().find(|s| s.method == "A").unwrap();
        let b = stats.iter().find(|s| s.method == "B").unwrap();

        assert_eq!(a.signal_count, 3);
        assert!((a.horizon(Horizon::H1).win_rate - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(b.signal_count, 5);
        assert!((b.horizon(Horizon::H1).win_rate - 0.2).abs() < 1e-12);
        assert_eq!(best_method(&stats).unwrap().method, "A");
    }

    #[test]
    fn report_lists_every_method_and_names_the_best() {
        let outcomes = vec![
            outcome("alpha", Some((2.0, true))),
            outcome("beta", Some((-1.0, false))),
        ];
        let report = format_report(&aggregate(&outcomes));
        assert!(report.contains("method alpha"));
        assert!(report.contains("method beta"));
        assert!(report.contains("best: alpha"));
    }

    #[test]
    fn empty_input_produces_placeholder_report() {
        assert!(format_report(&[]).contains("No tracked outcomes"));
    }
}
