use super::buckets::{parse_week_key, week_bucket, week_end, week_range, WeekStart};
use crate::models::analytics::{CommitmentPoint, CumulativeFlowPoint, ThroughputPoint};
use crate::models::work_item::{StatusGroup, WorkItem, WorkItemType};
use std::collections::BTreeMap;

pub const DEFAULT_SPRINT_LIMIT: usize = 10;

/// Completions per calendar week. Weeks without completions are omitted.
pub fn throughput_series(items: &[WorkItem], week_start: WeekStart) -> Vec<ThroughputPoint> {
    let mut weeks: BTreeMap<String, ThroughputPoint> = BTreeMap::new();

    for item in items {
        let Some(completed) = item.completed_at() else {
            continue;
        };
        let bucket = week_bucket(completed, week_start);
        let point = weeks.entry(bucket.key.clone()).or_insert_with(|| ThroughputPoint {
            week: bucket.key,
            label: bucket.label,
            total: 0,
            story: 0,
            bug: 0,
            task: 0,
        });

        point.total += 1;
        match item.item_type() {
            WorkItemType::Story => point.story += 1,
            WorkItemType::Bug => point.bug += 1,
            WorkItemType::Task => point.task += 1,
            WorkItemType::Epic => {}
        }
    }

    weeks.into_values().collect()
}

/// Cumulative snapshot per week, evaluated at each week's end. Every week
/// between the earliest and latest touched week appears, so `done` forms a
/// continuous non-decreasing line.
pub fn cumulative_flow(items: &[WorkItem], week_start: WeekStart) -> Vec<CumulativeFlowPoint> {
    let touched = items
        .iter()
        .flat_map(|item| std::iter::once(item.created_at()).chain(item.completed_at()));
    let (Some(first), Some(last)) = (touched.clone().min(), touched.max()) else {
        return Vec::new();
    };

    week_range(first, last, week_start)
        .into_iter()
        .filter_map(|bucket| {
            let end = week_end(parse_week_key(&bucket.key)?);

            let mut point = CumulativeFlowPoint {
                week: bucket.key,
                label: bucket.label,
                todo: 0,
                in_progress: 0,
                done: 0,
            };

            for item in items.iter().filter(|i| i.created_at() < end) {
                let started = item.started_at().filter(|s| *s < end);
                let completed = item.completed_at().filter(|c| *c < end);

                match (started, completed) {
                    (_, Some(_)) => point.done += 1,
                    (None, None) => point.todo += 1,
                    (Some(_), None) => {
                        if matches!(item.status_group(), StatusGroup::InProgress | StatusGroup::Review) {
                            point.in_progress += 1;
                        }
                    }
                }
            }

            Some(point)
        })
        .collect()
}

/// Planned-versus-completed per sprint, oldest first, keeping only the most
/// recent `limit` sprints.
pub fn commitment_reliability(items: &[WorkItem], limit: usize) -> Vec<CommitmentPoint> {
    let mut sprints: BTreeMap<&str, (usize, usize)> = BTreeMap::new();

    for item in items {
        let Some(sprint) = item.sprint() else {
            continue;
        };
        let entry = sprints.entry(sprint).or_insert((0, 0));
        if item.is_planned() {
            entry.0 += 1;
        }
        if item.is_completed() {
            entry.1 += 1;
        }
    }

    let mut points: Vec<CommitmentPoint> = sprints
        .into_iter()
        .map(|(sprint, (planned, completed))| CommitmentPoint {
            sprint: sprint.to_string(),
            planned,
            completed,
            reliability: if planned == 0 {
                0.0
            } else {
                (100.0 * completed as f64 / planned as f64).round()
            },
        })
        .collect();

    if points.len() > limit {
        points.drain(..points.len() - limit);
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{completed, completed_typed, in_progress, sprint_item, todo};

    #[test]
    fn throughput_is_sparse_and_split_by_type() {
        let items = vec![
            completed_typed("a", WorkItemType::Story, 0, 0, 1),
            completed_typed("b", WorkItemType::Bug, 0, 0, 2),
            completed_typed("c", WorkItemType::Epic, 0, 0, 2),
            // completes three weeks later; the weeks in between stay absent
            completed_typed("d", WorkItemType::Task, 0, 0, 21),
            in_progress("e", 0, 1),
        ];

        let series = throughput_series(&items, WeekStart::Monday);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].week, "2026-03-02");
        assert_eq!((series[0].total, series[0].story, series[0].bug, series[0].task), (3, 1, 1, 0));
        assert_eq!(series[1].week, "2026-03-23");
        assert_eq!((series[1].total, series[1].task), (1, 1));
    }

    #[test]
    fn cumulative_flow_covers_every_week_and_done_never_drops() {
        let items = vec![
            todo("a", 0),
            in_progress("b", 0, 1),
            completed("c", 0, 1, 2),
            completed("d", 7, 0, 14),
            todo("e", 28),
        ];

        let cfd = cumulative_flow(&items, WeekStart::Monday);
        let weeks: Vec<&str> = cfd.iter().map(|p| p.week.as_str()).collect();
        assert_eq!(
            weeks,
            vec!["2026-03-02", "2026-03-09", "2026-03-16", "2026-03-23", "2026-03-30"]
        );
        assert!(cfd.windows(2).all(|w| w[0].done <= w[1].done));

        assert_eq!((cfd[0].todo, cfd[0].in_progress, cfd[0].done), (1, 1, 1));
        // d started in week 2, completes in week 4
        assert_eq!(cfd[1].done, 1);
        assert_eq!(cfd[3].done, 2);
        assert_eq!(cfd[4].todo, 2);
    }

    #[test]
    fn cumulative_flow_of_nothing_is_empty() {
        assert!(cumulative_flow(&[], WeekStart::Monday).is_empty());
    }

    #[test]
    fn cumulative_flow_in_progress_tracks_current_status_group() {
        // Completed items never count as in progress, even in weeks before they finished.
        let items = vec![completed("a", 0, 0, 10)];
        let cfd = cumulative_flow(&items, WeekStart::Monday);
        assert_eq!(cfd[0].in_progress, 0);
        assert_eq!(cfd[0].todo, 0);
        assert_eq!(cfd.last().map(|p| p.done), Some(1));
    }

    #[test]
    fn commitment_reliability_per_sprint() {
        let items = vec![
            sprint_item("a", "Sprint 01", true, true),
            sprint_item("b", "Sprint 01", true, false),
            sprint_item("c", "Sprint 01", false, true),
            sprint_item("d", "Sprint 02", false, true),
        ];

        let points = commitment_reliability(&items, DEFAULT_SPRINT_LIMIT);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].sprint, "Sprint 01");
        assert_eq!((points[0].planned, points[0].completed), (2, 2));
        assert_eq!(points[0].reliability, 100.0);
        // nothing planned → 0 rather than a division by zero
        assert_eq!(points[1].reliability, 0.0);
    }

    #[test]
    fn commitment_reliability_keeps_most_recent_sprints() {
        let items: Vec<_> = (1..=12)
            .map(|n| sprint_item(&format!("s{n}"), &format!("Sprint {n:02}"), true, true))
            .collect();

        let points = commitment_reliability(&items, 10);
        assert_eq!(points.len(), 10);
        assert_eq!(points[0].sprint, "Sprint 03");
        assert_eq!(points[9].sprint, "Sprint 12");
    }
}
