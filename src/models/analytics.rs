use super::work_item::WorkStatus;
use serde::{Deserialize, Serialize};

/// A calendar week. `key` is the ISO date of the week's first day and sorts
/// chronologically; `label` is for axis ticks.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WeekBucket {
    pub key: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThroughputPoint {
    pub week: String,
    pub label: String,
    pub total: usize,
    pub story: usize,
    pub bug: usize,
    pub task: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CumulativeFlowPoint {
    pub week: String,
    pub label: String,
    pub todo: usize,
    pub in_progress: usize,
    pub done: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentPoint {
    pub sprint: String,
    pub planned: usize,
    pub completed: usize,
    pub reliability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapCell {
    pub week: String,
    pub week_label: String,
    pub status: WorkStatus,
    pub count: usize,
    pub value: f64,
    pub over_sla: bool,
}

/// Row-major (week, then status) rectangular grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageHeatmap {
    pub weeks: Vec<WeekBucket>,
    pub statuses: Vec<WorkStatus>,
    pub sla_threshold: Option<f64>,
    pub cells: Vec<HeatmapCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockerParetoEntry {
    pub name: String,
    pub blocked_hours: f64,
    pub count: usize,
    pub avg_hours: f64,
    pub median_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParetoPoint {
    pub name: String,
    pub value: f64,
    pub cumulative_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum ParetoMetric {
    #[default]
    BlockedHours,
    Count,
}

/// One observation of time spent in a named stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageDuration {
    pub stage: String,
    pub item_id: String,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageBottleneck {
    pub stage: String,
    pub avg_hours: f64,
    pub item_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KpiDelta {
    pub value: f64,
    pub delta: i64,
    pub trend: Trend,
    pub lower_is_better: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedKpi {
    pub name: String,
    pub label: String,
    pub unit: String,
    #[serde(flatten)]
    pub kpi: KpiDelta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapacityForecast {
    pub member_id: String,
    pub name: String,
    pub next_week_utilization: i64,
    pub confidence: Confidence,
    pub estimated_hours: Option<f64>,
    pub trend_slope: f64,
    pub insights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowMetrics {
    pub throughput: Vec<ThroughputPoint>,
    pub cumulative_flow: Vec<CumulativeFlowPoint>,
    pub commitment: Vec<CommitmentPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BottleneckReport {
    pub heatmap: StageHeatmap,
    pub blockers: Vec<BlockerParetoEntry>,
    pub pareto: Vec<ParetoPoint>,
    pub stages: Vec<StageBottleneck>,
}
