pub mod repository;

pub use repository::{OpportunityRepository, WorkflowError};
