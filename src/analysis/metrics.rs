use super::buckets::days_between;
use crate::models::work_item::WorkItem;
use serde::{Deserialize, Serialize};

/// Signature shared by every point-in-time calculator.
pub type MetricFn = fn(&[WorkItem]) -> f64;

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Mean days from start to completion.
pub fn cycle_time_days(items: &[WorkItem]) -> f64 {
    mean(items.iter().filter_map(|item| {
        let started = item.started_at()?;
        let completed = item.completed_at()?;
        Some(days_between(started, completed))
    }))
}

/// Mean days from creation to completion.
pub fn lead_time_days(items: &[WorkItem]) -> f64 {
    mean(
        items
            .iter()
            .filter_map(|item| Some(days_between(item.created_at(), item.completed_at()?))),
    )
}

pub fn wip_count(items: &[WorkItem]) -> f64 {
    items.iter().filter(|item| item.is_in_flight()).count() as f64
}

pub fn reopen_rate(items: &[WorkItem]) -> f64 {
    let completed: Vec<&WorkItem> = items.iter().filter(|i| i.is_completed()).collect();
    if completed.is_empty() {
        return 0.0;
    }
    let reopened = completed.iter().filter(|i| i.reopened()).count();
    100.0 * reopened as f64 / completed.len() as f64
}

/// Share of elapsed cycle time not spent blocked. Items completed in zero time
/// carry no signal and are skipped; blocked time beyond the elapsed window is
/// clamped so a single item never contributes outside 0–100.
pub fn flow_efficiency(items: &[WorkItem]) -> f64 {
    mean(items.iter().filter_map(|item| {
        let elapsed = days_between(item.started_at()?, item.completed_at()?);
        if elapsed <= 0.0 {
            return None;
        }
        let active = elapsed - item.blocked_hours() / 24.0;
        Some((100.0 * active / elapsed).clamp(0.0, 100.0))
    }))
}

/// Mean blocked hours across items that were ever blocked.
pub fn blocked_time_hours(items: &[WorkItem]) -> f64 {
    mean(
        items
            .iter()
            .map(|item| item.blocked_hours())
            .filter(|hours| *hours > 0.0),
    )
}

/// The dashboard's KPI catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricKind {
    CycleTime,
    LeadTime,
    Wip,
    ReopenRate,
    FlowEfficiency,
    BlockedTime,
}

impl MetricKind {
    pub const ALL: [MetricKind; 6] = [
        MetricKind::CycleTime,
        MetricKind::LeadTime,
        MetricKind::Wip,
        MetricKind::ReopenRate,
        MetricKind::FlowEfficiency,
        MetricKind::BlockedTime,
    ];

    pub fn calculator(self) -> MetricFn {
        match self {
            MetricKind::CycleTime => cycle_time_days,
            MetricKind::LeadTime => lead_time_days,
            MetricKind::Wip => wip_count,
            MetricKind::ReopenRate => reopen_rate,
            MetricKind::FlowEfficiency => flow_efficiency,
            MetricKind::BlockedTime => blocked_time_hours,
        }
    }

    pub fn lower_is_better(self) -> bool {
        !matches!(self, MetricKind::FlowEfficiency)
    }

    pub fn key(self) -> &'static str {
        match self {
            MetricKind::CycleTime => "cycleTime",
            MetricKind::LeadTime => "leadTime",
            MetricKind::Wip => "wip",
            MetricKind::ReopenRate => "reopenRate",
            MetricKind::FlowEfficiency => "flowEfficiency",
            MetricKind::BlockedTime => "blockedTime",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MetricKind::CycleTime => "Cycle Time",
            MetricKind::LeadTime => "Lead Time",
            MetricKind::Wip => "Work in Progress",
            MetricKind::ReopenRate => "Reopen Rate",
            MetricKind::FlowEfficiency => "Flow Efficiency",
            MetricKind::BlockedTime => "Blocked Time",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            MetricKind::CycleTime | MetricKind::LeadTime => "days",
            MetricKind::Wip => "items",
            MetricKind::ReopenRate | MetricKind::FlowEfficiency => "%",
            MetricKind::BlockedTime => "hours",
        }
    }
}
