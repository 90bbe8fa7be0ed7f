use common::{TrendAnnotation, TrendDirection};

/// Minimum oscillator change considered a real move rather than noise.
pub const DEFAULT_TREND_THRESHOLD: f64 = 0.1;

/// Label the oscillator trend by comparing the current reading against the
/// previous one for the same symbol/timeframe.
///
/// No previous reading yields `Unknown` with change 0. `Unknown` is not the
/// same as `Flat`: flat readings count toward convergence, unknown ones are
/// excluded entirely.
pub fn classify_trend(current: f64, previous: Option<f64>, threshold: f64) -> TrendAnnotation {
    let Some(previous) = previous else {
        return TrendAnnotation::unknown();
    };

    let change = current - previous;
    let direction = if change == 0.0 || change.abs() < threshold {
        TrendDirection::Flat
    } else if change > 0.0 {
        TrendDirection::Up
    } else {
        TrendDirection::Down
    };

    TrendAnnotation { direction, change }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_previous_reading_is_unknown_not_flat() {
        let t = classify_trend(55.0, None, DEFAULT_TREND_THRESHOLD);
        assert_eq!(t.direction, TrendDirection::Unknown);
        assert_eq!(t.change, 0.0);
        assert!(!t.direction.is_directional());
    }

    #[test]
    fn change_below_threshold_is_flat() {
        let t = classify_trend(50.05, Some(50.0), DEFAULT_TREND_THRESHOLD);
        assert_eq!(t.direction, TrendDirection::Flat);
        assert!((t.change - 0.05).abs() < 1e-12);
    }

    #[test]
    fn zero_change_is_flat() {
        let t = classify_trend(42.0, Some(42.0), DEFAULT_TREND_THRESHOLD);
        assert_eq!(t.direction, TrendDirection::Flat);
    }

    #[test]
    fn sign_of_change_sets_direction() {
        let up = classify_trend(52.5, Some(50.0), DEFAULT_TREND_THRESHOLD);
        assert_eq!(up.direction, TrendDirection::Up);
        assert_eq!(up.change, 2.5);

        let down = classify_trend(47.5, Some(50.0), DEFAULT_TREND_THRESHOLD);
        assert_eq!(down.direction, TrendDirection::Down);
        assert_eq!(down.change, -2.5);
    }

    #[test]
    fn exact_threshold_counts_as_directional() {
        // 0.5 is exactly representable, so the comparison is not subject
        // to float rounding.
        let t = classify_trend(50.5, Some(50.0), 0.5);
        assert_eq!(t.direction, TrendDirection::Up);
    }
}
