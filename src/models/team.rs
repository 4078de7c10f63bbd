use super::work_item::ModelError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub week: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberRecord {
    pub id: String,
    pub name: String,
    pub role: String,
    pub team: String,
    pub email: String,
    pub capacity: f64,
    pub weekly_capacity_hours: f64,
    #[serde(default)]
    pub history: Vec<HistoryPoint>,
}

/// One resource in the capacity module. `history` is chronological, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "TeamMemberRecord")]
pub struct TeamMember {
    id: String,
    name: String,
    role: String,
    team: String,
    email: String,
    capacity: f64,
    weekly_capacity_hours: f64,
    history: Vec<HistoryPoint>,
}

impl TryFrom<TeamMemberRecord> for TeamMember {
    type Error = ModelError;

    fn try_from(record: TeamMemberRecord) -> Result<Self, Self::Error> {
        if record.id.trim().is_empty() {
            return Err(ModelError::EmptyField { field: "id" });
        }
        if !record.capacity.is_finite() || record.capacity < 0.0 {
            return Err(ModelError::InvalidCapacity(record.capacity));
        }
        if !record.weekly_capacity_hours.is_finite() || record.weekly_capacity_hours < 0.0 {
            return Err(ModelError::InvalidCapacity(record.weekly_capacity_hours));
        }
        if let Some(bad) = record
            .history
            .iter()
            .find(|p| !p.value.is_finite() || p.value < 0.0)
        {
            return Err(ModelError::InvalidCapacity(bad.value));
        }

        Ok(TeamMember {
            id: record.id,
            name: record.name,
            role: record.role,
            team: record.team,
            email: record.email,
            capacity: record.capacity,
            weekly_capacity_hours: record.weekly_capacity_hours,
            history: record.history,
        })
    }
}

impl TeamMember {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn team(&self) -> &str {
        &self.team
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Current utilization, in percent.
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn weekly_capacity_hours(&self) -> f64 {
        self.weekly_capacity_hours
    }

    pub fn history(&self) -> &[HistoryPoint] {
        &self.history
    }

    pub fn history_values(&self) -> Vec<f64> {
        self.history.iter().map(|p| p.value).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_negative_utilization_in_history() {
        let record = TeamMemberRecord {
            id: "tm-1".to_string(),
            name: "Ada".to_string(),
            capacity: 80.0,
            weekly_capacity_hours: 40.0,
            history: vec![HistoryPoint {
                week: "W1".to_string(),
                value: -5.0,
            }],
            ..Default::default()
        };

        assert_eq!(
            TeamMember::try_from(record).unwrap_err(),
            ModelError::InvalidCapacity(-5.0)
        );
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let member = TeamMember::try_from(TeamMemberRecord {
            id: "tm-2".to_string(),
            capacity: 95.0,
            weekly_capacity_hours: 32.0,
            ..Default::default()
        })
        .expect("valid member");

        let json = serde_json::to_value(&member).expect("serialize");
        assert_eq!(json["weeklyCapacityHours"], serde_json::json!(32.0));
        assert!(json["history"].as_array().expect("history").is_empty());
    }

    #[test]
    fn deserializing_goes_through_validation() {
        let bad = serde_json::json!({
            "id": "tm-3",
            "name": "Grace",
            "role": "Engineer",
            "team": "Platform",
            "email": "grace@example.com",
            "capacity": -10.0,
            "weeklyCapacityHours": 40.0
        });
        assert!(serde_json::from_value::<TeamMember>(bad).is_err());

        let good = serde_json::json!({
            "id": "tm-3",
            "name": "Grace",
            "role": "Engineer",
            "team": "Platform",
            "email": "grace@example.com",
            "capacity": 85.0,
            "weeklyCapacityHours": 40.0,
            "history": [{ "week": "W1", "value": 85.0 }]
        });
        let member: TeamMember = serde_json::from_value(good).expect("valid member");
        assert_eq!(member.id(), "tm-3");
        assert_eq!(member.name(), "Grace");
        assert_eq!(member.capacity(), 85.0);
        assert_eq!(member.history_values(), vec![85.0]);
    }
}
