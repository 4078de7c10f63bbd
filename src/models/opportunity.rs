use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sequential lifecycle stages an opportunity moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Intake,
    Product,
    Engineering,
    Platform,
    Implementation,
    Support,
}

impl Stage {
    pub const ORDER: [Stage; 6] = [
        Stage::Intake,
        Stage::Product,
        Stage::Engineering,
        Stage::Platform,
        Stage::Implementation,
        Stage::Support,
    ];

    pub fn next(self) -> Option<Stage> {
        let idx = Stage::ORDER.iter().position(|s| *s == self)?;
        Stage::ORDER.get(idx + 1).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Intake => "intake",
            Stage::Product => "product",
            Stage::Engineering => "engineering",
            Stage::Platform => "platform",
            Stage::Implementation => "implementation",
            Stage::Support => "support",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dashboard roles. Every stage has an owning role; admins see everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Intake,
    Product,
    Engineering,
    Platform,
    Implementation,
    Support,
}

impl Role {
    pub fn owned_stage(self) -> Option<Stage> {
        match self {
            Role::Admin => None,
            Role::Intake => Some(Stage::Intake),
            Role::Product => Some(Stage::Product),
            Role::Engineering => Some(Stage::Engineering),
            Role::Platform => Some(Stage::Platform),
            Role::Implementation => Some(Stage::Implementation),
            Role::Support => Some(Stage::Support),
        }
    }

    pub fn can_view(self, stage: Stage) -> bool {
        self.owned_stage().map_or(true, |owned| owned == stage)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTransition {
    pub from: Option<Stage>,
    pub to: Stage,
    pub at: DateTime<Utc>,
    pub actor: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub author: String,
    pub body: String,
    pub stage: Stage,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: String,
    pub title: String,
    pub description: String,
    pub stage: Stage,
    pub assignee: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub stage_history: Vec<StageTransition>,
    pub comments: Vec<Comment>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_advance_in_order_and_stop_at_support() {
        assert_eq!(Stage::Intake.next(), Some(Stage::Product));
        assert_eq!(Stage::Platform.next(), Some(Stage::Implementation));
        assert_eq!(Stage::Support.next(), None);
    }

    #[test]
    fn stage_roles_only_see_their_stage() {
        assert!(Role::Admin.can_view(Stage::Support));
        assert!(Role::Engineering.can_view(Stage::Engineering));
        assert!(!Role::Engineering.can_view(Stage::Product));
    }
}
