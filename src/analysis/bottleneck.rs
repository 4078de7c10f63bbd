use super::buckets::{hours_between, week_bucket, week_range, WeekStart};
use crate::models::analytics::{
    BlockerParetoEntry, HeatmapCell, ParetoMetric, ParetoPoint, StageBottleneck, StageDuration,
    StageHeatmap, WeekBucket,
};
use crate::models::work_item::{WorkItem, WorkStatus};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

/// Row and column labels of a stage heatmap.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapAxes {
    pub weeks: Vec<WeekBucket>,
    pub statuses: Vec<WorkStatus>,
}

impl HeatmapAxes {
    /// Continuous creation-week range of `items` against every status.
    pub fn from_items(items: &[WorkItem], week_start: WeekStart) -> Self {
        let first = items.iter().map(WorkItem::created_at).min();
        let last = items.iter().map(WorkItem::created_at).max();
        let weeks = match (first, last) {
            (Some(first), Some(last)) => week_range(first, last, week_start),
            _ => Vec::new(),
        };

        HeatmapAxes {
            weeks,
            statuses: WorkStatus::ALL.to_vec(),
        }
    }
}

/// Hours an item has spent in its current status as of `as_of`.
pub fn hours_in_current_stage(item: &WorkItem, as_of: DateTime<Utc>) -> f64 {
    let hours = match (item.status(), item.started_at(), item.completed_at()) {
        (WorkStatus::Done, Some(started), Some(completed)) => hours_between(started, completed),
        (WorkStatus::ToDo, _, _) | (_, None, _) => hours_between(item.created_at(), as_of),
        (_, Some(started), _) => hours_between(started, as_of),
    };
    hours.max(0.0)
}

/// Average time-in-stage per (creation week, status) cell. The grid is always
/// complete: cells without items carry `count = 0` and `value = 0`. Items whose
/// week or status falls outside `axes` are ignored.
pub fn stage_heatmap(
    items: &[WorkItem],
    axes: &HeatmapAxes,
    week_start: WeekStart,
    sla_hours: Option<f64>,
    as_of: DateTime<Utc>,
) -> StageHeatmap {
    let mut sums: HashMap<(String, WorkStatus), (f64, usize)> = HashMap::new();
    for item in items {
        let key = (week_bucket(item.created_at(), week_start).key, item.status());
        let entry = sums.entry(key).or_insert((0.0, 0));
        entry.0 += hours_in_current_stage(item, as_of);
        entry.1 += 1;
    }

    let mut cells = Vec::with_capacity(axes.weeks.len() * axes.statuses.len());
    for week in &axes.weeks {
        for status in &axes.statuses {
            let (total, count) = sums
                .get(&(week.key.clone(), *status))
                .copied()
                .unwrap_or((0.0, 0));
            let value = if count == 0 { 0.0 } else { total / count as f64 };
            cells.push(HeatmapCell {
                week: week.key.clone(),
                week_label: week.label.clone(),
                status: *status,
                count,
                value,
                over_sla: sla_hours.is_some_and(|sla| count > 0 && value > sla),
            });
        }
    }

    StageHeatmap {
        weeks: axes.weeks.clone(),
        statuses: axes.statuses.clone(),
        sla_threshold: sla_hours,
        cells,
    }
}

/// Middle element of an ascending list; for even lengths the lower of the two
/// middle elements.
fn lower_median(sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    sorted[(sorted.len() - 1) / 2]
}

/// Blocked-hours statistics per blocker reason, heaviest first.
pub fn blocker_pareto(items: &[WorkItem]) -> Vec<BlockerParetoEntry> {
    let mut reasons: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for item in items {
        let Some(reason) = item.blocker_reason().filter(|r| !r.is_empty()) else {
            continue;
        };
        if item.blocked_hours() <= 0.0 {
            continue;
        }
        reasons.entry(reason).or_default().push(item.blocked_hours());
    }

    let mut entries: Vec<BlockerParetoEntry> = reasons
        .into_iter()
        .map(|(reason, mut durations)| {
            durations.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let total: f64 = durations.iter().sum();
            BlockerParetoEntry {
                name: reason.to_string(),
                blocked_hours: total,
                count: durations.len(),
                avg_hours: total / durations.len() as f64,
                median_hours: lower_median(&durations),
            }
        })
        .collect();

    // BTreeMap iteration already orders names, so the stable sort keeps ties alphabetical.
    entries.sort_by(|a, b| {
        b.blocked_hours
            .partial_cmp(&a.blocked_hours)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    entries
}

/// Running share of the grand total across `entries` in their given order.
pub fn pareto_series(entries: &[BlockerParetoEntry], metric: ParetoMetric) -> Vec<ParetoPoint> {
    let value_of = |e: &BlockerParetoEntry| match metric {
        ParetoMetric::BlockedHours => e.blocked_hours,
        ParetoMetric::Count => e.count as f64,
    };
    let total: f64 = entries.iter().map(value_of).sum();

    let mut running = 0.0;
    entries
        .iter()
        .map(|entry| {
            let value = value_of(entry);
            running += value;
            ParetoPoint {
                name: entry.name.clone(),
                value,
                cumulative_percent: if total > 0.0 { running / total * 100.0 } else { 0.0 },
            }
        })
        .collect()
}

/// Time each item has spent in its current status, for stage ranking.
pub fn status_durations(items: &[WorkItem], as_of: DateTime<Utc>) -> Vec<StageDuration> {
    items
        .iter()
        .map(|item| StageDuration {
            stage: item.status().label().to_string(),
            item_id: item.id().to_string(),
            hours: hours_in_current_stage(item, as_of),
        })
        .collect()
}

/// Stages ordered by average dwell time, longest first.
pub fn stage_bottlenecks(durations: &[StageDuration]) -> Vec<StageBottleneck> {
    let mut stages: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for d in durations {
        let entry = stages.entry(d.stage.as_str()).or_insert((0.0, 0));
        entry.0 += d.hours;
        entry.1 += 1;
    }

    let mut ranking: Vec<StageBottleneck> = stages
        .into_iter()
        .map(|(stage, (total, count))| StageBottleneck {
            stage: stage.to_string(),
            avg_hours: total / count as f64,
            item_count: count,
        })
        .collect();

    ranking.sort_by(|a, b| {
        b.avg_hours
            .partial_cmp(&a.avg_hours)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranking
}
