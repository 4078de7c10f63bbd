use super::metrics::MetricKind;
use crate::models::analytics::{KpiDelta, NamedKpi, Trend};
use crate::models::work_item::WorkItem;
use chrono::{DateTime, Duration, Utc};

pub const DEFAULT_WINDOW_DAYS: i64 = 14;

/// Compares `calculator` over items created in the most recent window against
/// the window before it. The result is direction-neutral: `trend` follows the
/// sign of `delta` and `lower_is_better` is only passed through so display
/// widgets can choose their colours.
pub fn kpi_with_delta<F>(
    items: &[WorkItem],
    calculator: F,
    lower_is_better: bool,
    as_of: DateTime<Utc>,
    window_days: i64,
) -> KpiDelta
where
    F: Fn(&[WorkItem]) -> f64,
{
    let window = Duration::days(window_days.max(1));
    let current_start = as_of - window;
    let previous_start = current_start - window;

    let (current, previous): (Vec<WorkItem>, Vec<WorkItem>) = items
        .iter()
        .filter(|item| item.created_at() > previous_start && item.created_at() <= as_of)
        .cloned()
        .partition(|item| item.created_at() > current_start);

    let current_value = calculator(&current);
    let previous_value = calculator(&previous);

    let delta = if previous_value == 0.0 {
        0
    } else {
        (100.0 * (current_value - previous_value) / previous_value).round() as i64
    };

    KpiDelta {
        value: current_value,
        delta,
        trend: match delta {
            d if d > 0 => Trend::Up,
            d if d < 0 => Trend::Down,
            _ => Trend::Neutral,
        },
        lower_is_better,
    }
}

/// Every catalogue KPI with its delta.
pub fn kpi_report(items: &[WorkItem], as_of: DateTime<Utc>, window_days: i64) -> Vec<NamedKpi> {
    MetricKind::ALL
        .into_iter()
        .map(|kind| NamedKpi {
            name: kind.key().to_string(),
            label: kind.label().to_string(),
            unit: kind.unit().to_string(),
            kpi: kpi_with_delta(
                items,
                kind.calculator(),
                kind.lower_is_better(),
                as_of,
                window_days,
            ),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::metrics::{cycle_time_days, wip_count};
    use crate::analysis::test_support::{at, completed, in_progress};

    #[test]
    fn zero_previous_value_yields_zero_delta() {
        // everything lands in the current window
        let items = vec![completed("a", 20, 0, 2), completed("b", 21, 0, 4)];
        let kpi = kpi_with_delta(&items, cycle_time_days, false, at(28), DEFAULT_WINDOW_DAYS);

        assert_eq!(kpi.value, 3.0);
        assert_eq!(kpi.delta, 0);
        assert_eq!(kpi.trend, Trend::Neutral);
    }

    #[test]
    fn rising_cycle_time_trends_up_regardless_of_polarity() {
        let items = vec![
            // previous window: days 1..=14 back from day 28
            completed("old", 5, 0, 2),
            // current window
            completed("new", 20, 0, 3),
        ];

        let kpi = kpi_with_delta(&items, cycle_time_days, true, at(28), DEFAULT_WINDOW_DAYS);
        assert_eq!(kpi.value, 3.0);
        assert_eq!(kpi.delta, 50);
        assert_eq!(kpi.trend, Trend::Up);
        assert!(kpi.lower_is_better);
    }

    #[test]
    fn falling_values_trend_down_and_old_items_are_ignored() {
        let items = vec![
            in_progress("ancient", 0, 1),
            in_progress("p1", 16, 0),
            in_progress("p2", 17, 0),
            in_progress("c1", 40, 0),
        ];

        // as of day 42: current (28, 42], previous (14, 28]
        let kpi = kpi_with_delta(&items, wip_count, true, at(42), DEFAULT_WINDOW_DAYS);
        assert_eq!(kpi.value, 1.0);
        assert_eq!(kpi.delta, -50);
        assert_eq!(kpi.trend, Trend::Down);
    }

    #[test]
    fn window_edges_are_exclusive_at_start_and_inclusive_at_end() {
        // as of day 28: current (14, 28], previous (0, 14]
        let as_of = at(28);
        let on_current_start = in_progress("edge", 14, 0);
        let on_previous_start = in_progress("old", 0, 0);
        let on_as_of = in_progress("now", 28, 0);

        let kpi = kpi_with_delta(&[on_current_start.clone()], wip_count, true, as_of, DEFAULT_WINDOW_DAYS);
        assert_eq!(kpi.value, 0.0);
        assert_eq!(kpi.delta, -100);
        assert_eq!(kpi.trend, Trend::Down);

        let kpi = kpi_with_delta(&[on_previous_start.clone()], wip_count, true, as_of, DEFAULT_WINDOW_DAYS);
        assert_eq!(kpi.value, 0.0);
        assert_eq!(kpi.delta, 0);
        assert_eq!(kpi.trend, Trend::Neutral);

        let kpi = kpi_with_delta(
            &[on_as_of, on_current_start, on_previous_start],
            wip_count,
            true,
            as_of,
            DEFAULT_WINDOW_DAYS,
        );
        assert_eq!(kpi.value, 1.0);
        assert_eq!(kpi.delta, 0);
        assert_eq!(kpi.trend, Trend::Neutral);
    }

    #[test]
    fn kpi_report_covers_catalogue() {
        let report = kpi_report(&[], at(0), DEFAULT_WINDOW_DAYS);
        assert_eq!(report.len(), MetricKind::ALL.len());
        assert!(report.iter().all(|k| k.kpi.value == 0.0 && k.kpi.delta == 0));

        let json = serde_json::to_value(&report[0]).expect("serialize");
        assert_eq!(json["name"], serde_json::json!("cycleTime"));
        assert_eq!(json["trend"], serde_json::json!("neutral"));
        assert!(json.get("delta").is_some());
    }
}
