use serde::{Deserialize, Serialize};

/// Point-in-time KPI values, persisted so the dashboard can chart trends
/// across sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSnapshot {
    pub id: i64,
    pub timestamp: i64,
    pub item_count: usize,
    pub cycle_time_days: f64,
    pub lead_time_days: f64,
    pub wip: usize,
    pub reopen_rate: f64,
    pub flow_efficiency: f64,
    pub blocked_hours: f64,
    pub snapshot_metadata: Option<String>, // JSON string
}
