use crate::analysis::bottleneck::{
    blocker_pareto, pareto_series, stage_bottlenecks, stage_heatmap, status_durations, HeatmapAxes,
};
use crate::analysis::flow::{commitment_reliability, cumulative_flow, throughput_series};
use crate::analysis::forecast::forecast_team;
use crate::analysis::generator::generate_demo_dataset;
use crate::analysis::kpi::kpi_report;
use crate::commands::db;
use crate::commands::settings::{load_effective_analytics_settings, load_settings_from_disk, EffectiveAnalyticsSettings};
use crate::models::analytics::{BottleneckReport, CapacityForecast, FlowMetrics, NamedKpi};
use crate::models::team::{TeamMember, TeamMemberRecord};
use crate::models::work_item::{WorkItem, WorkItemRecord};
use crate::models::workspace::{DatasetSummary, ImportRejection, ImportSummary, WorkspaceMeta};
use chrono::{DateTime, Utc};
use std::path::Path;

/// Runs `job` on the blocking pool and logs how long it took.
async fn run_blocking<T, F>(label: &'static str, job: F) -> Result<T, String>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, String> + Send + 'static,
{
    let start = std::time::Instant::now();
    let result = tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| format!("{label} task failed: {e}"))?;
    log::debug!("{label} finished in {} ms", start.elapsed().as_millis());
    result
}

struct WorkspaceData {
    settings: EffectiveAnalyticsSettings,
    items: Vec<WorkItem>,
    members: Vec<TeamMember>,
}

fn load_workspace_data(workspace_path: &str) -> Result<WorkspaceData, String> {
    let settings = load_effective_analytics_settings(workspace_path)?;
    let conn = db::get_db_connection(workspace_path).map_err(|e| format!("DB error: {e}"))?;
    let items = db::load_work_items(&conn).map_err(|e| format!("Query error: {e}"))?;
    let members = db::load_team_members(&conn).map_err(|e| format!("Query error: {e}"))?;
    Ok(WorkspaceData {
        settings,
        items,
        members,
    })
}

#[cfg_attr(feature = "desktop", tauri::command)]
pub async fn open_workspace(path: String) -> Result<WorkspaceMeta, String> {
    let workspace_path = Path::new(&path);

    if !workspace_path.is_dir() {
        return Err("PATH_NOT_FOUND: Directory does not exist".to_string());
    }

    let conn = db::get_db_connection(&path)
        .map_err(|e| format!("INIT_FAILED: Could not initialize database: {e}"))?;

    load_settings_from_disk(&path)
        .map_err(|e| format!("INIT_FAILED: Could not initialize settings: {e}"))?;

    let name = workspace_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "workspace".to_string());

    let meta = WorkspaceMeta {
        path: path.clone(),
        name,
        work_item_count: db::count_rows(&conn, "work_items").map_err(|e| format!("DB error: {e}"))?,
        team_member_count: db::count_rows(&conn, "team_members").map_err(|e| format!("DB error: {e}"))?,
        last_snapshot_at: db::last_snapshot_time(&conn),
    };
    log::info!(
        "Opened workspace {} ({} work items, {} team members)",
        meta.path,
        meta.work_item_count,
        meta.team_member_count
    );
    Ok(meta)
}

/// Replaces the stored dataset with a synthetic one. Seed and size default to
/// the workspace settings.
#[cfg_attr(feature = "desktop", tauri::command)]
pub async fn generate_demo_data(
    workspace_path: String,
    seed: Option<u64>,
    item_count: Option<usize>,
) -> Result<DatasetSummary, String> {
    run_blocking("generate_demo_data", move || {
        let settings = load_effective_analytics_settings(&workspace_path)?;
        let seed = seed.unwrap_or(settings.demo_seed);
        let item_count = item_count.unwrap_or(settings.demo_item_count);
        let dataset = generate_demo_dataset(seed, item_count, Utc::now());

        let conn = db::get_db_connection(&workspace_path).map_err(|e| format!("DB error: {e}"))?;
        db::replace_dataset(&conn, &dataset.work_items, &dataset.team_members)
            .map_err(|e| format!("Insert error: {e}"))?;

        log::info!(
            "Generated demo dataset (seed {seed}): {} work items, {} team members",
            dataset.work_items.len(),
            dataset.team_members.len()
        );
        Ok(DatasetSummary {
            seed,
            work_item_count: dataset.work_items.len(),
            team_member_count: dataset.team_members.len(),
        })
    })
    .await
}

fn validate_records<R, T, E, F>(records: Vec<R>, id_of: F) -> (Vec<T>, Vec<ImportRejection>)
where
    T: TryFrom<R, Error = E>,
    F: Fn(&R) -> String,
    E: std::fmt::Display,
{
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    for record in records {
        let id = id_of(&record);
        match T::try_from(record) {
            Ok(value) => accepted.push(value),
            Err(e) => rejected.push(ImportRejection {
                id,
                reason: e.to_string(),
            }),
        }
    }
    (accepted, rejected)
}

/// Upserts externally supplied records. Invalid records are reported back
/// instead of failing the whole import.
#[cfg_attr(feature = "desktop", tauri::command)]
pub async fn import_work_items(
    workspace_path: String,
    items: Vec<WorkItemRecord>,
    team_members: Option<Vec<TeamMemberRecord>>,
) -> Result<ImportSummary, String> {
    run_blocking("import_work_items", move || {
        let (work_items, mut rejected) =
            validate_records::<_, WorkItem, _, _>(items, |r: &WorkItemRecord| r.id.clone());
        let (members, member_rejections) = validate_records::<_, TeamMember, _, _>(
            team_members.unwrap_or_default(),
            |r: &TeamMemberRecord| r.id.clone(),
        );
        rejected.extend(member_rejections);

        let conn = db::get_db_connection(&workspace_path).map_err(|e| format!("DB error: {e}"))?;
        db::import_dataset(&conn, &work_items, &members).map_err(|e| format!("Insert error: {e}"))?;

        if !rejected.is_empty() {
            log::warn!("Rejected {} records during import", rejected.len());
        }
        Ok(ImportSummary {
            imported: work_items.len(),
            team_members_imported: members.len(),
            rejected,
        })
    })
    .await
}

#[cfg_attr(feature = "desktop", tauri::command)]
pub async fn list_work_items(workspace_path: String) -> Result<Vec<WorkItem>, String> {
    run_blocking("list_work_items", move || {
        let conn = db::get_db_connection(&workspace_path).map_err(|e| format!("DB error: {e}"))?;
        db::load_work_items(&conn).map_err(|e| format!("Query error: {e}"))
    })
    .await
}

#[cfg_attr(feature = "desktop", tauri::command)]
pub async fn get_flow_metrics(workspace_path: String) -> Result<FlowMetrics, String> {
    run_blocking("get_flow_metrics", move || {
        let data = load_workspace_data(&workspace_path)?;
        let week_start = data.settings.week_start;
        Ok(FlowMetrics {
            throughput: throughput_series(&data.items, week_start),
            cumulative_flow: cumulative_flow(&data.items, week_start),
            commitment: commitment_reliability(&data.items, data.settings.sprint_history_limit),
        })
    })
    .await
}

#[cfg_attr(feature = "desktop", tauri::command)]
pub async fn get_bottlenecks(
    workspace_path: String,
    as_of: Option<DateTime<Utc>>,
) -> Result<BottleneckReport, String> {
    run_blocking("get_bottlenecks", move || {
        let data = load_workspace_data(&workspace_path)?;
        let as_of = as_of.unwrap_or_else(Utc::now);
        let settings = &data.settings;

        let axes = HeatmapAxes::from_items(&data.items, settings.week_start);
        let blockers = blocker_pareto(&data.items);
        Ok(BottleneckReport {
            heatmap: stage_heatmap(
                &data.items,
                &axes,
                settings.week_start,
                Some(settings.sla_threshold_hours),
                as_of,
            ),
            pareto: pareto_series(&blockers, settings.pareto_metric),
            blockers,
            stages: stage_bottlenecks(&status_durations(&data.items, as_of)),
        })
    })
    .await
}

#[cfg_attr(feature = "desktop", tauri::command)]
pub async fn get_kpis(
    workspace_path: String,
    as_of: Option<DateTime<Utc>>,
) -> Result<Vec<NamedKpi>, String> {
    run_blocking("get_kpis", move || {
        let data = load_workspace_data(&workspace_path)?;
        Ok(kpi_report(
            &data.items,
            as_of.unwrap_or_else(Utc::now),
            data.settings.kpi_window_days,
        ))
    })
    .await
}

#[cfg_attr(feature = "desktop", tauri::command)]
pub async fn get_capacity_forecasts(workspace_path: String) -> Result<Vec<CapacityForecast>, String> {
    run_blocking("get_capacity_forecasts", move || {
        let data = load_workspace_data(&workspace_path)?;
        Ok(forecast_team(&data.members, data.settings.forecast_variance))
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::work_item::WorkStatus;
    use chrono::TimeZone;

    #[test]
    fn validation_splits_accepted_and_rejected_records() {
        let created = Utc.with_ymd_and_hms(2026, 4, 6, 9, 0, 0).unwrap();
        let good = WorkItemRecord {
            id: "NUV-1".to_string(),
            assignee: "Ada".to_string(),
            team: "Platform".to_string(),
            project: "Atlas".to_string(),
            component: "API".to_string(),
            story_points: 2,
            created_at: created,
            ..Default::default()
        };
        let bad = WorkItemRecord {
            id: "NUV-2".to_string(),
            status: WorkStatus::Done,
            ..good.clone()
        };

        let (accepted, rejected) =
            validate_records::<_, WorkItem, _, _>(vec![good, bad], |r: &WorkItemRecord| r.id.clone());
        assert_eq!(accepted.len(), 1);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].id, "NUV-2");
        assert!(!rejected[0].reason.is_empty());
    }
}
