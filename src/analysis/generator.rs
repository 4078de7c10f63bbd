use super::buckets::{week_bucket, WeekStart};
use crate::models::team::{HistoryPoint, TeamMember, TeamMemberRecord};
use crate::models::work_item::{WorkItem, WorkItemRecord, WorkItemType, WorkStatus};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

const ASSIGNEES: [&str; 8] = [
    "Amara Okafor",
    "Ben Carter",
    "Chen Wei",
    "Diego Alvarez",
    "Elif Demir",
    "Farah Haddad",
    "Gus Lindqvist",
    "Hana Sato",
];
const TEAMS: [&str; 4] = ["Product", "Engineering", "Platform", "Implementation"];
const PROJECTS: [&str; 4] = ["Atlas", "Beacon", "Compass", "Drift"];
const COMPONENTS: [&str; 5] = ["API", "Web", "Mobile", "Data", "Infra"];
const BLOCKER_REASONS: [&str; 6] = [
    "Waiting on review",
    "Dependency on another team",
    "Environment unavailable",
    "Unclear requirements",
    "External vendor",
    "Awaiting approval",
];
const ROLES: [&str; 4] = ["Engineer", "Designer", "Product Manager", "QA Analyst"];
const STORY_POINTS: [u32; 5] = [1, 2, 3, 5, 8];

const TYPE_WEIGHTS: [(WorkItemType, u32); 4] = [
    (WorkItemType::Story, 50),
    (WorkItemType::Bug, 25),
    (WorkItemType::Task, 20),
    (WorkItemType::Epic, 5),
];
const STATUS_WEIGHTS: [(WorkStatus, u32); 6] = [
    (WorkStatus::ToDo, 20),
    (WorkStatus::InProgress, 15),
    (WorkStatus::Review, 8),
    (WorkStatus::Qa, 7),
    (WorkStatus::Done, 45),
    (WorkStatus::Blocked, 5),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetConfig {
    pub item_count: usize,
    pub history_days: i64,
    pub history_weeks: usize,
    pub sprint_length_days: i64,
    pub now: DateTime<Utc>,
}

impl DatasetConfig {
    pub fn new(item_count: usize, now: DateTime<Utc>) -> Self {
        DatasetConfig {
            item_count,
            history_days: 90,
            history_weeks: 8,
            sprint_length_days: 14,
            now,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub work_items: Vec<WorkItem>,
    pub team_members: Vec<TeamMember>,
}

fn pick<'a, R: Rng>(rng: &mut R, options: &[&'a str]) -> &'a str {
    options[rng.gen_range(0..options.len())]
}

fn weighted<T: Copy, R: Rng>(rng: &mut R, choices: &[(T, u32)]) -> T {
    let total: u32 = choices.iter().map(|(_, w)| w).sum();
    let mut roll = rng.gen_range(0..total);
    for (value, weight) in choices {
        if roll < *weight {
            return *value;
        }
        roll -= weight;
    }
    choices[choices.len() - 1].0
}

fn generate_item<R: Rng>(rng: &mut R, index: usize, config: &DatasetConfig) -> WorkItemRecord {
    let now = config.now;
    let window_start = now - Duration::days(config.history_days);
    let created_at = window_start + Duration::minutes(rng.gen_range(0..config.history_days.max(1) * 24 * 60));

    let status = weighted(rng, &STATUS_WEIGHTS);
    let leaves_backlog = match status {
        WorkStatus::ToDo => false,
        WorkStatus::Blocked => rng.gen_bool(0.7),
        _ => true,
    };

    let started_at = leaves_backlog
        .then(|| (created_at + Duration::hours(rng.gen_range(1..=120))).min(now));
    let completed_at = match (status, started_at) {
        (WorkStatus::Done, Some(started)) => {
            Some((started + Duration::hours(rng.gen_range(4..=14 * 24))).min(now))
        }
        _ => None,
    };

    let blocked = status == WorkStatus::Blocked || rng.gen_bool(0.25);
    let (blocked_hours, blocker_reason) = if blocked {
        (
            f64::from(rng.gen_range(2..=72u32)),
            Some(pick(rng, &BLOCKER_REASONS).to_string()),
        )
    } else {
        (0.0, None)
    };

    let sprint_index = (created_at - window_start).num_days() / config.sprint_length_days.max(1) + 1;

    WorkItemRecord {
        id: format!("NUV-{}", 1000 + index),
        item_type: weighted(rng, &TYPE_WEIGHTS),
        status,
        status_group: None,
        assignee: pick(rng, &ASSIGNEES).to_string(),
        team: pick(rng, &TEAMS).to_string(),
        project: pick(rng, &PROJECTS).to_string(),
        component: pick(rng, &COMPONENTS).to_string(),
        sprint: Some(format!("Sprint {sprint_index:02}")),
        story_points: STORY_POINTS[rng.gen_range(0..STORY_POINTS.len())],
        created_at,
        started_at,
        completed_at,
        blocked_hours,
        blocker_reason,
        reopened: completed_at.is_some() && rng.gen_bool(0.08),
        is_planned: rng.gen_bool(0.8),
    }
}

fn generate_member<R: Rng>(
    rng: &mut R,
    index: usize,
    name: &str,
    config: &DatasetConfig,
) -> TeamMemberRecord {
    let mut level: f64 = rng.gen_range(60.0..110.0);
    let history: Vec<HistoryPoint> = (0..config.history_weeks)
        .rev()
        .map(|weeks_back| {
            level = (level + rng.gen_range(-10.0..10.0)).clamp(20.0, 150.0);
            let week = week_bucket(
                config.now - Duration::weeks(weeks_back as i64 + 1),
                WeekStart::Monday,
            );
            HistoryPoint {
                week: week.label,
                value: level.round(),
            }
        })
        .collect();

    let slug = name.to_lowercase().replace(' ', ".");
    TeamMemberRecord {
        id: format!("tm-{}", index + 1),
        name: name.to_string(),
        role: pick(rng, &ROLES).to_string(),
        team: TEAMS[index % TEAMS.len()].to_string(),
        email: format!("{slug}@nuvio.dev"),
        capacity: history.last().map_or(level.round(), |p| p.value),
        weekly_capacity_hours: if rng.gen_bool(0.8) { 40.0 } else { 32.0 },
        history,
    }
}

/// Synthetic work items and team members drawn from `rng`. Every record is
/// passed through the validating constructors.
pub fn generate_dataset<R: Rng>(config: &DatasetConfig, rng: &mut R) -> Dataset {
    let mut dataset = Dataset::default();

    for index in 0..config.item_count {
        match WorkItem::try_from(generate_item(rng, index, config)) {
            Ok(item) => dataset.work_items.push(item),
            Err(e) => log::warn!("Discarding generated work item {index}: {e}"),
        }
    }

    for (index, name) in ASSIGNEES.iter().enumerate() {
        match TeamMember::try_from(generate_member(rng, index, name, config)) {
            Ok(member) => dataset.team_members.push(member),
            Err(e) => log::warn!("Discarding generated team member {name}: {e}"),
        }
    }

    dataset
}

/// Reproducible dataset: the same seed always yields the same records.
pub fn generate_demo_dataset(seed: u64, item_count: usize, now: DateTime<Utc>) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    generate_dataset(&DatasetConfig::new(item_count, now), &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    #[test]
    fn same_seed_reproduces_dataset() {
        let a = generate_demo_dataset(7, 50, now());
        let b = generate_demo_dataset(7, 50, now());
        assert_eq!(a.work_items, b.work_items);
        assert_eq!(a.team_members, b.team_members);

        let c = generate_demo_dataset(8, 50, now());
        assert_ne!(a.work_items, c.work_items);
    }

    #[test]
    fn generated_records_respect_invariants() {
        let dataset = generate_demo_dataset(42, 300, now());
        assert_eq!(dataset.work_items.len(), 300);
        assert_eq!(dataset.team_members.len(), ASSIGNEES.len());

        for item in &dataset.work_items {
            assert!(item.created_at() <= now());
            if let Some(completed) = item.completed_at() {
                assert!(completed <= now());
                assert!(completed >= item.started_at().expect("completed implies started"));
            }
            assert_eq!(item.blocked_hours() > 0.0, item.blocker_reason().is_some());
        }

        for member in &dataset.team_members {
            assert_eq!(member.history().len(), 8);
            assert!(member.weekly_capacity_hours() > 0.0);
        }
    }
}
