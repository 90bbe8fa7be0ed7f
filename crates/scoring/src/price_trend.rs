use common::PriceTrend;

/// Fewer prior prices than this always yields `Neutral`.
pub const MIN_HISTORY: usize = 5;

/// Estimate whether raw price is trending, independent of the oscillator.
///
/// `history` holds the most recent prior prices, newest first.
/// `observed_timeframes` is how many timeframes currently have readings for
/// the symbol; more observed frames widen the comparison window and loosen
/// the threshold so longer-horizon context is not drowned in 1m noise.
///
/// Total function: sparse or degenerate input degrades to `Neutral`,
/// never panics.
pub fn estimate_price_trend(current: f64, history: &[f64], observed_timeframes: usize) -> PriceTrend {
    if history.len() < MIN_HISTORY {
        return PriceTrend::Neutral;
    }

    let (max_window, threshold_pct) = window_params(observed_timeframes);
    let window = max_window.min(history.len());

    let baseline: f64 = history[..window].iter().sum::<f64>() / window as f64;
    if baseline <= 0.0 {
        return PriceTrend::Neutral;
    }

    let deviation_pct = (current - baseline) / baseline * 100.0;
    if deviation_pct > threshold_pct {
        PriceTrend::Up
    } else if deviation_pct < -threshold_pct {
        PriceTrend::Down
    } else {
        PriceTrend::Neutral
    }
}

/// Window length and percent threshold, scaled by the number of observed
/// timeframes. Short windows get tight thresholds, long windows loose ones.
fn window_params(observed_timeframes: usize) -> (usize, f64) {
    match observed_timeframes {
        0..=2 => (10, 0.10),
        3 => (15, 0.15),
        4 => (20, 0.20),
        _ => (30, 0.30),
    }
}
