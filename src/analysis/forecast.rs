use crate::models::analytics::{CapacityForecast, Confidence};
use crate::models::team::TeamMember;
use serde::{Deserialize, Serialize};

pub const HIGH_RISK_THRESHOLD: f64 = 110.0;
pub const OVERALLOCATION_THRESHOLD: f64 = 100.0;
pub const UNDERUTILIZATION_THRESHOLD: f64 = 70.0;
pub const SPIKE_SLOPE_THRESHOLD: f64 = 5.0;

/// How the spread of a member's history is measured for the confidence tier.
///
/// `Squared` is the population variance. `Legacy` reproduces the dashboard's
/// original formula, which raised each deviation to the power zero and so
/// always evaluates to the number of samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarianceFormula {
    #[default]
    Squared,
    Legacy,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
}

impl Regression {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Ordinary least squares over `x = 0..n-1`. A single sample (zero
/// denominator) gives a flat line through it; `None` for no samples.
pub fn linear_regression(values: &[f64]) -> Option<Regression> {
    if values.is_empty() {
        return None;
    }

    let n = values.len() as f64;
    let (mut sum_x, mut sum_y, mut sum_xy, mut sum_xx) = (0.0, 0.0, 0.0, 0.0);
    for (i, y) in values.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_xx += x * x;
    }

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator.abs() < f64::EPSILON {
        return Some(Regression {
            slope: 0.0,
            intercept: sum_y / n,
        });
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;
    Some(Regression { slope, intercept })
}

pub fn history_variance(values: &[f64], formula: VarianceFormula) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    match formula {
        VarianceFormula::Squared => {
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
        }
        VarianceFormula::Legacy => values.iter().map(|v| (v - mean).powi(0)).sum(),
    }
}

pub fn confidence_for_variance(variance: f64) -> Confidence {
    if variance < 25.0 {
        Confidence::High
    } else if variance < 100.0 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

fn estimated_hours(utilization: f64, weekly_capacity_hours: f64) -> Option<f64> {
    if weekly_capacity_hours <= 0.0 {
        return None;
    }
    Some((utilization / 100.0 * weekly_capacity_hours * 10.0).round() / 10.0)
}

/// Next-week utilization for one member with heuristic insights.
pub fn forecast_capacity(member: &TeamMember, formula: VarianceFormula) -> CapacityForecast {
    let values = member.history_values();

    let Some(regression) = linear_regression(&values) else {
        return CapacityForecast {
            member_id: member.id().to_string(),
            name: member.name().to_string(),
            next_week_utilization: member.capacity().round() as i64,
            confidence: Confidence::Low,
            estimated_hours: estimated_hours(member.capacity(), member.weekly_capacity_hours()),
            trend_slope: 0.0,
            insights: vec![
                "Not enough history to forecast; showing current utilization".to_string(),
            ],
        };
    };

    let predicted = regression.predict(values.len() as f64).max(0.0).round();
    let confidence = confidence_for_variance(history_variance(&values, formula));

    let mut insights = Vec::new();
    if predicted > HIGH_RISK_THRESHOLD {
        insights.push(format!(
            "High risk next week: {predicted:.0}% utilization predicted"
        ));
    }
    if values.len() >= 3 && values[values.len() - 3..].iter().all(|v| *v >= OVERALLOCATION_THRESHOLD) {
        insights.push("Sustained overallocation: at or above 100% for the last 3 weeks".to_string());
    }
    if values.len() >= 2 && values[values.len() - 2..].iter().all(|v| *v < UNDERUTILIZATION_THRESHOLD) {
        insights.push("Under-utilized: below 70% for the last 2 weeks".to_string());
    }
    if regression.slope > SPIKE_SLOPE_THRESHOLD {
        insights.push(format!(
            "Spike risk: utilization rising {:.1} points per week",
            regression.slope
        ));
    }

    CapacityForecast {
        member_id: member.id().to_string(),
        name: member.name().to_string(),
        next_week_utilization: predicted as i64,
        confidence,
        estimated_hours: estimated_hours(predicted, member.weekly_capacity_hours()),
        trend_slope: regression.slope,
        insights,
    }
}

pub fn forecast_team(members: &[TeamMember], formula: VarianceFormula) -> Vec<CapacityForecast> {
    members
        .iter()
        .map(|member| forecast_capacity(member, formula))
        .collect()
}
