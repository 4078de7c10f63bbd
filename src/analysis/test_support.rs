//! Fixture builders shared by the analysis unit tests. Day offsets are
//! relative to Monday 2026-03-02 09:00 UTC.

use crate::models::work_item::{WorkItem, WorkItemRecord, WorkItemType, WorkStatus};
use chrono::{DateTime, Duration, TimeZone, Utc};

pub fn at(day: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap() + Duration::days(day)
}

pub fn record(id: &str, created_day: i64) -> WorkItemRecord {
    WorkItemRecord {
        id: id.to_string(),
        assignee: "Ada".to_string(),
        team: "Platform".to_string(),
        project: "Atlas".to_string(),
        component: "API".to_string(),
        story_points: 3,
        created_at: at(created_day),
        ..Default::default()
    }
}

pub fn build(record: WorkItemRecord) -> WorkItem {
    WorkItem::try_from(record).expect("fixture must be valid")
}

pub fn todo(id: &str, created_day: i64) -> WorkItem {
    build(record(id, created_day))
}

pub fn in_progress(id: &str, created_day: i64, start_offset: i64) -> WorkItem {
    build(WorkItemRecord {
        status: WorkStatus::InProgress,
        started_at: Some(at(created_day + start_offset)),
        ..record(id, created_day)
    })
}

pub fn completed(id: &str, created_day: i64, start_offset: i64, duration_days: i64) -> WorkItem {
    completed_typed(id, WorkItemType::Story, created_day, start_offset, duration_days)
}

pub fn completed_typed(
    id: &str,
    item_type: WorkItemType,
    created_day: i64,
    start_offset: i64,
    duration_days: i64,
) -> WorkItem {
    let started = created_day + start_offset;
    build(WorkItemRecord {
        item_type,
        status: WorkStatus::Done,
        started_at: Some(at(started)),
        completed_at: Some(at(started + duration_days)),
        ..record(id, created_day)
    })
}

pub fn reopened(id: &str, created_day: i64, start_offset: i64, duration_days: i64) -> WorkItem {
    let started = created_day + start_offset;
    build(WorkItemRecord {
        status: WorkStatus::Done,
        started_at: Some(at(started)),
        completed_at: Some(at(started + duration_days)),
        reopened: true,
        ..record(id, created_day)
    })
}

pub fn blocked_completed(
    id: &str,
    created_day: i64,
    start_offset: i64,
    duration_days: i64,
    blocked_hours: f64,
    reason: &str,
) -> WorkItem {
    let started = created_day + start_offset;
    build(WorkItemRecord {
        status: WorkStatus::Done,
        started_at: Some(at(started)),
        completed_at: Some(at(started + duration_days)),
        blocked_hours,
        blocker_reason: Some(reason.to_string()),
        ..record(id, created_day)
    })
}

pub fn blocked_in_progress(id: &str, blocked_hours: f64, reason: &str) -> WorkItem {
    build(WorkItemRecord {
        status: WorkStatus::InProgress,
        started_at: Some(at(1)),
        blocked_hours,
        blocker_reason: Some(reason.to_string()),
        ..record(id, 0)
    })
}

pub fn sprint_item(id: &str, sprint: &str, planned: bool, done: bool) -> WorkItem {
    let mut rec = WorkItemRecord {
        sprint: Some(sprint.to_string()),
        is_planned: planned,
        ..record(id, 0)
    };
    if done {
        rec.status = WorkStatus::Done;
        rec.started_at = Some(at(1));
        rec.completed_at = Some(at(3));
    }
    build(rec)
}
