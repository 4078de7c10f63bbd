use crate::analysis::buckets::hours_between;
use crate::models::analytics::StageDuration;
use crate::models::opportunity::{Comment, Opportunity, Role, Stage, StageTransition};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorkflowError {
    #[error("Opportunity not found: {0}")]
    NotFound(String),
    #[error("Opportunity {0} is already in the final stage")]
    FinalStage(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Owns every opportunity record. Callers hold it behind a handle
/// (`Arc<Mutex<_>>` in the desktop shell) and mutate only through these methods.
#[derive(Debug, Default)]
pub struct OpportunityRepository {
    opportunities: Vec<Opportunity>,
}

impl OpportunityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &mut self,
        title: &str,
        description: &str,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Opportunity, WorkflowError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(WorkflowError::InvalidInput("title must not be empty".to_string()));
        }

        let opportunity = Opportunity {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            description: description.trim().to_string(),
            stage: Stage::Intake,
            assignee: None,
            created_at: now,
            updated_at: now,
            stage_history: vec![StageTransition {
                from: None,
                to: Stage::Intake,
                at: now,
                actor: actor.to_string(),
            }],
            comments: Vec::new(),
        };
        self.opportunities.push(opportunity.clone());
        Ok(opportunity)
    }

    pub fn get(&self, id: &str) -> Option<&Opportunity> {
        self.opportunities.iter().find(|o| o.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Opportunity, WorkflowError> {
        self.opportunities
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| WorkflowError::NotFound(id.to_string()))
    }

    /// All opportunities, optionally restricted to one stage, in creation order.
    pub fn list(&self, stage: Option<Stage>) -> Vec<&Opportunity> {
        self.opportunities
            .iter()
            .filter(|o| stage.map_or(true, |s| o.stage == s))
            .collect()
    }

    pub fn list_for_role(&self, role: Role) -> Vec<&Opportunity> {
        self.opportunities
            .iter()
            .filter(|o| role.can_view(o.stage))
            .collect()
    }

    /// Moves an opportunity to the next stage and records the transition.
    pub fn advance_stage(
        &mut self,
        id: &str,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Opportunity, WorkflowError> {
        let opportunity = self.get_mut(id)?;
        let next = opportunity
            .stage
            .next()
            .ok_or_else(|| WorkflowError::FinalStage(id.to_string()))?;

        opportunity.stage_history.push(StageTransition {
            from: Some(opportunity.stage),
            to: next,
            at: now,
            actor: actor.to_string(),
        });
        opportunity.stage = next;
        opportunity.updated_at = now;
        Ok(opportunity.clone())
    }

    pub fn assign(
        &mut self,
        id: &str,
        assignee: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Opportunity, WorkflowError> {
        let opportunity = self.get_mut(id)?;
        opportunity.assignee = assignee
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string);
        opportunity.updated_at = now;
        Ok(opportunity.clone())
    }

    pub fn add_comment(
        &mut self,
        id: &str,
        author: &str,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<Comment, WorkflowError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(WorkflowError::InvalidInput("comment body must not be empty".to_string()));
        }

        let opportunity = self.get_mut(id)?;
        let comment = Comment {
            id: uuid::Uuid::new_v4().to_string(),
            author: author.to_string(),
            body: body.to_string(),
            stage: opportunity.stage,
            created_at: now,
        };
        opportunity.comments.push(comment.clone());
        opportunity.updated_at = now;
        Ok(comment)
    }

    /// Hours each opportunity spent in each stage. The current stage is
    /// measured up to `as_of`.
    pub fn stage_durations(&self, as_of: DateTime<Utc>) -> Vec<StageDuration> {
        let mut durations = Vec::new();
        for opportunity in &self.opportunities {
            let history = &opportunity.stage_history;
            for (i, transition) in history.iter().enumerate() {
                let left_at = history.get(i + 1).map_or(as_of, |next| next.at);
                durations.push(StageDuration {
                    stage: transition.to.to_string(),
                    item_id: opportunity.id.clone(),
                    hours: hours_between(transition.at, left_at).max(0.0),
                });
            }
        }
        durations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 8, 0, 0).unwrap()
    }

    #[test]
    fn advances_through_every_stage_then_stops() {
        let mut repo = OpportunityRepository::new();
        let opp = repo.create("Self-serve onboarding", "", "pm", t0()).expect("create");

        for _ in 0..5 {
            repo.advance_stage(&opp.id, "pm", t0()).expect("advance");
        }
        assert_eq!(repo.get(&opp.id).map(|o| o.stage), Some(Stage::Support));
        assert_eq!(
            repo.advance_stage(&opp.id, "pm", t0()).unwrap_err(),
            WorkflowError::FinalStage(opp.id.clone())
        );

        let history = &repo.get(&opp.id).expect("exists").stage_history;
        assert_eq!(history.len(), 6);
        assert_eq!(history[1].from, Some(Stage::Intake));
        assert_eq!(history[1].to, Stage::Product);
    }

    #[test]
    fn comments_record_current_stage_and_reject_empty_bodies() {
        let mut repo = OpportunityRepository::new();
        let opp = repo.create("Billing revamp", "Move to usage-based", "pm", t0()).expect("create");
        repo.advance_stage(&opp.id, "pm", t0()).expect("advance");

        let comment = repo
            .add_comment(&opp.id, "eng", "Needs a spike first", t0())
            .expect("comment");
        assert_eq!(comment.stage, Stage::Product);

        assert!(matches!(
            repo.add_comment(&opp.id, "eng", "   ", t0()),
            Err(WorkflowError::InvalidInput(_))
        ));
        assert!(matches!(
            repo.add_comment("missing", "eng", "hi", t0()),
            Err(WorkflowError::NotFound(_))
        ));
    }

    #[test]
    fn role_views_filter_by_owned_stage() {
        let mut repo = OpportunityRepository::new();
        let a = repo.create("A", "", "pm", t0()).expect("create");
        repo.create("B", "", "pm", t0()).expect("create");
        repo.advance_stage(&a.id, "pm", t0()).expect("advance");

        assert_eq!(repo.list_for_role(Role::Admin).len(), 2);
        assert_eq!(repo.list_for_role(Role::Product).len(), 1);
        assert_eq!(repo.list_for_role(Role::Intake).len(), 1);
        assert!(repo.list_for_role(Role::Support).is_empty());
        assert_eq!(repo.list(Some(Stage::Product))[0].title, "A");
    }

    #[test]
    fn assignment_can_be_cleared() {
        let mut repo = OpportunityRepository::new();
        let opp = repo.create("A", "", "pm", t0()).expect("create");
        let assigned = repo.assign(&opp.id, Some("Chen Wei"), t0()).expect("assign");
        assert_eq!(assigned.assignee.as_deref(), Some("Chen Wei"));
        let cleared = repo.assign(&opp.id, Some("  "), t0()).expect("clear");
        assert_eq!(cleared.assignee, None);
    }

    #[test]
    fn stage_durations_measure_time_between_transitions() {
        let mut repo = OpportunityRepository::new();
        let opp = repo.create("A", "", "pm", t0()).expect("create");
        repo.advance_stage(&opp.id, "pm", t0() + Duration::hours(10)).expect("advance");

        let durations = repo.stage_durations(t0() + Duration::hours(14));
        assert_eq!(durations.len(), 2);
        assert_eq!((durations[0].stage.as_str(), durations[0].hours), ("intake", 10.0));
        assert_eq!((durations[1].stage.as_str(), durations[1].hours), ("product", 4.0));
    }
}
