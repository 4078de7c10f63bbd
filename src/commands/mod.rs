pub mod dashboard;
pub mod db;
pub mod settings;
pub mod workflow;
