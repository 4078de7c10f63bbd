use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rejected record constructions.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },
    #[error("story points must be positive, got {0}")]
    NonPositiveStoryPoints(u32),
    #[error("startedAt precedes createdAt")]
    StartedBeforeCreated,
    #[error("completedAt requires startedAt")]
    CompletedWithoutStart,
    #[error("completedAt precedes startedAt")]
    CompletedBeforeStarted,
    #[error("status {status} is inconsistent with completedAt")]
    CompletionMismatch { status: WorkStatus },
    #[error("status {status} is inconsistent with startedAt")]
    StartMismatch { status: WorkStatus },
    #[error("statusGroup {group} does not match status {status}")]
    StatusGroupMismatch { status: WorkStatus, group: StatusGroup },
    #[error("blockedHours must be a non-negative number, got {0}")]
    InvalidBlockedHours(f64),
    #[error("blockerReason must be present exactly when blockedHours > 0")]
    BlockerReasonMismatch,
    #[error("invalid capacity value: {0}")]
    InvalidCapacity(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum WorkItemType {
    #[default]
    Story,
    Bug,
    Task,
    Epic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum WorkStatus {
    #[default]
    #[serde(rename = "To Do")]
    ToDo,
    #[serde(rename = "In Progress")]
    InProgress,
    Review,
    #[serde(rename = "QA")]
    Qa,
    Done,
    Blocked,
}

impl WorkStatus {
    pub const ALL: [WorkStatus; 6] = [
        WorkStatus::ToDo,
        WorkStatus::InProgress,
        WorkStatus::Review,
        WorkStatus::Qa,
        WorkStatus::Done,
        WorkStatus::Blocked,
    ];

    pub fn label(self) -> &'static str {
        match self {
            WorkStatus::ToDo => "To Do",
            WorkStatus::InProgress => "In Progress",
            WorkStatus::Review => "Review",
            WorkStatus::Qa => "QA",
            WorkStatus::Done => "Done",
            WorkStatus::Blocked => "Blocked",
        }
    }

    pub fn group(self) -> StatusGroup {
        match self {
            WorkStatus::ToDo => StatusGroup::Todo,
            WorkStatus::InProgress | WorkStatus::Blocked => StatusGroup::InProgress,
            WorkStatus::Review | WorkStatus::Qa => StatusGroup::Review,
            WorkStatus::Done => StatusGroup::Done,
        }
    }

    pub fn parse(label: &str) -> Option<WorkStatus> {
        WorkStatus::ALL.into_iter().find(|s| s.label() == label)
    }
}

impl std::fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusGroup {
    Todo,
    InProgress,
    Review,
    Done,
}

impl std::fmt::Display for StatusGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            StatusGroup::Todo => "todo",
            StatusGroup::InProgress => "inprogress",
            StatusGroup::Review => "review",
            StatusGroup::Done => "done",
        };
        f.write_str(label)
    }
}

/// Unvalidated shape of a work item, as it arrives from JSON or a database row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItemRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: WorkItemType,
    pub status: WorkStatus,
    #[serde(default)]
    pub status_group: Option<StatusGroup>,
    pub assignee: String,
    pub team: String,
    pub project: String,
    pub component: String,
    #[serde(default)]
    pub sprint: Option<String>,
    pub story_points: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub blocked_hours: f64,
    #[serde(default)]
    pub blocker_reason: Option<String>,
    #[serde(default)]
    pub reopened: bool,
    #[serde(default)]
    pub is_planned: bool,
}

/// A validated unit of tracked work. Only constructible through
/// `WorkItem::try_from(WorkItemRecord)`, so every instance honours the
/// timestamp ordering, status and blocker invariants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "WorkItemRecord")]
pub struct WorkItem {
    id: String,
    #[serde(rename = "type")]
    item_type: WorkItemType,
    status: WorkStatus,
    status_group: StatusGroup,
    assignee: String,
    team: String,
    project: String,
    component: String,
    sprint: Option<String>,
    story_points: u32,
    created_at: DateTime<Utc>,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    blocked_hours: f64,
    blocker_reason: Option<String>,
    reopened: bool,
    is_planned: bool,
}

impl TryFrom<WorkItemRecord> for WorkItem {
    type Error = ModelError;

    fn try_from(record: WorkItemRecord) -> Result<Self, Self::Error> {
        if record.id.trim().is_empty() {
            return Err(ModelError::EmptyField { field: "id" });
        }
        if record.story_points == 0 {
            return Err(ModelError::NonPositiveStoryPoints(record.story_points));
        }

        let group = record.status.group();
        if let Some(declared) = record.status_group {
            if declared != group {
                return Err(ModelError::StatusGroupMismatch {
                    status: record.status,
                    group: declared,
                });
            }
        }

        if let Some(started) = record.started_at {
            if started < record.created_at {
                return Err(ModelError::StartedBeforeCreated);
            }
        }
        match (record.started_at, record.completed_at) {
            (None, Some(_)) => return Err(ModelError::CompletedWithoutStart),
            (Some(started), Some(completed)) if completed < started => {
                return Err(ModelError::CompletedBeforeStarted)
            }
            _ => {}
        }

        let is_done = record.status == WorkStatus::Done;
        if is_done != record.completed_at.is_some() {
            return Err(ModelError::CompletionMismatch { status: record.status });
        }
        // Blocked items may be stuck either before or after leaving the backlog.
        let start_ok = match record.status {
            WorkStatus::ToDo => record.started_at.is_none(),
            WorkStatus::Blocked => true,
            _ => record.started_at.is_some(),
        };
        if !start_ok {
            return Err(ModelError::StartMismatch { status: record.status });
        }

        if !record.blocked_hours.is_finite() || record.blocked_hours < 0.0 {
            return Err(ModelError::InvalidBlockedHours(record.blocked_hours));
        }
        let reason = record
            .blocker_reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        if (record.blocked_hours > 0.0) != reason.is_some() {
            return Err(ModelError::BlockerReasonMismatch);
        }

        Ok(WorkItem {
            id: record.id,
            item_type: record.item_type,
            status: record.status,
            status_group: group,
            assignee: record.assignee,
            team: record.team,
            project: record.project,
            component: record.component,
            sprint: record.sprint.filter(|s| !s.trim().is_empty()),
            story_points: record.story_points,
            created_at: record.created_at,
            started_at: record.started_at,
            completed_at: record.completed_at,
            blocked_hours: record.blocked_hours,
            blocker_reason: reason,
            reopened: record.reopened,
            is_planned: record.is_planned,
        })
    }
}

impl From<WorkItem> for WorkItemRecord {
    fn from(item: WorkItem) -> Self {
        WorkItemRecord {
            id: item.id,
            item_type: item.item_type,
            status: item.status,
            status_group: Some(item.status_group),
            assignee: item.assignee,
            team: item.team,
            project: item.project,
            component: item.component,
            sprint: item.sprint,
            story_points: item.story_points,
            created_at: item.created_at,
            started_at: item.started_at,
            completed_at: item.completed_at,
            blocked_hours: item.blocked_hours,
            blocker_reason: item.blocker_reason,
            reopened: item.reopened,
            is_planned: item.is_planned,
        }
    }
}

impl WorkItem {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn item_type(&self) -> WorkItemType {
        self.item_type
    }

    pub fn status(&self) -> WorkStatus {
        self.status
    }

    pub fn status_group(&self) -> StatusGroup {
        self.status_group
    }

    pub fn assignee(&self) -> &str {
        &self.assignee
    }

    pub fn team(&self) -> &str {
        &self.team
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn component(&self) -> &str {
        &self.component
    }

    pub fn sprint(&self) -> Option<&str> {
        self.sprint.as_deref()
    }

    pub fn story_points(&self) -> u32 {
        self.story_points
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn blocked_hours(&self) -> f64 {
        self.blocked_hours
    }

    pub fn blocker_reason(&self) -> Option<&str> {
        self.blocker_reason.as_deref()
    }

    pub fn reopened(&self) -> bool {
        self.reopened
    }

    pub fn is_planned(&self) -> bool {
        self.is_planned
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Started but not yet completed.
    pub fn is_in_flight(&self) -> bool {
        self.started_at.is_some() && self.completed_at.is_none()
    }
}
