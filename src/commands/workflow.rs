use crate::analysis::bottleneck::stage_bottlenecks;
use crate::models::analytics::StageBottleneck;
use crate::models::opportunity::{Comment, Opportunity, Role, Stage};
use crate::workflow::OpportunityRepository;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard};

pub type SharedRepository = Arc<Mutex<OpportunityRepository>>;

fn lock(repo: &SharedRepository) -> Result<MutexGuard<'_, OpportunityRepository>, String> {
    repo.lock().map_err(|_| "Repository lock error".to_string())
}

pub fn create_opportunity_internal(
    repo: &SharedRepository,
    title: &str,
    description: &str,
    actor: &str,
) -> Result<Opportunity, String> {
    let opportunity = lock(repo)?
        .create(title, description, actor, Utc::now())
        .map_err(|e| e.to_string())?;
    log::info!("Created opportunity {} ({})", opportunity.id, opportunity.title);
    Ok(opportunity)
}

pub fn advance_opportunity_stage_internal(
    repo: &SharedRepository,
    id: &str,
    actor: &str,
) -> Result<Opportunity, String> {
    let opportunity = lock(repo)?
        .advance_stage(id, actor, Utc::now())
        .map_err(|e| e.to_string())?;
    log::info!("Opportunity {id} moved to {}", opportunity.stage);
    Ok(opportunity)
}

pub fn assign_opportunity_internal(
    repo: &SharedRepository,
    id: &str,
    assignee: Option<&str>,
) -> Result<Opportunity, String> {
    lock(repo)?
        .assign(id, assignee, Utc::now())
        .map_err(|e| e.to_string())
}

pub fn add_opportunity_comment_internal(
    repo: &SharedRepository,
    id: &str,
    author: &str,
    body: &str,
) -> Result<Comment, String> {
    lock(repo)?
        .add_comment(id, author, body, Utc::now())
        .map_err(|e| e.to_string())
}

/// Opportunities visible to `role` (all of them when no role is given),
/// optionally narrowed to one stage.
pub fn list_opportunities_internal(
    repo: &SharedRepository,
    role: Option<Role>,
    stage: Option<Stage>,
) -> Result<Vec<Opportunity>, String> {
    let repo = lock(repo)?;
    let visible = match role {
        Some(role) => repo.list_for_role(role),
        None => repo.list(None),
    };
    Ok(visible
        .into_iter()
        .filter(|o| stage.map_or(true, |s| o.stage == s))
        .cloned()
        .collect())
}

pub fn get_stage_bottlenecks_internal(
    repo: &SharedRepository,
    as_of: Option<DateTime<Utc>>,
) -> Result<Vec<StageBottleneck>, String> {
    let durations = lock(repo)?.stage_durations(as_of.unwrap_or_else(Utc::now));
    Ok(stage_bottlenecks(&durations))
}

#[cfg(feature = "desktop")]
#[tauri::command]
pub async fn create_opportunity(
    title: String,
    description: String,
    actor: String,
    repo: tauri::State<'_, SharedRepository>,
) -> Result<Opportunity, String> {
    create_opportunity_internal(repo.inner(), &title, &description, &actor)
}

#[cfg(feature = "desktop")]
#[tauri::command]
pub async fn advance_opportunity_stage(
    id: String,
    actor: String,
    repo: tauri::State<'_, SharedRepository>,
) -> Result<Opportunity, String> {
    advance_opportunity_stage_internal(repo.inner(), &id, &actor)
}

#[cfg(feature = "desktop")]
#[tauri::command]
pub async fn assign_opportunity(
    id: String,
    assignee: Option<String>,
    repo: tauri::State<'_, SharedRepository>,
) -> Result<Opportunity, String> {
    assign_opportunity_internal(repo.inner(), &id, assignee.as_deref())
}

#[cfg(feature = "desktop")]
#[tauri::command]
pub async fn add_opportunity_comment(
    id: String,
    author: String,
    body: String,
    repo: tauri::State<'_, SharedRepository>,
) -> Result<Comment, String> {
    add_opportunity_comment_internal(repo.inner(), &id, &author, &body)
}

#[cfg(feature = "desktop")]
#[tauri::command]
pub async fn list_opportunities(
    role: Option<Role>,
    stage: Option<Stage>,
    repo: tauri::State<'_, SharedRepository>,
) -> Result<Vec<Opportunity>, String> {
    list_opportunities_internal(repo.inner(), role, stage)
}

#[cfg(feature = "desktop")]
#[tauri::command]
pub async fn get_stage_bottlenecks(
    as_of: Option<DateTime<Utc>>,
    repo: tauri::State<'_, SharedRepository>,
) -> Result<Vec<StageBottleneck>, String> {
    get_stage_bottlenecks_internal(repo.inner(), as_of)
}
