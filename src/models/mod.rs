pub mod analytics;
pub mod opportunity;
pub mod snapshot;
pub mod team;
pub mod work_item;
pub mod workspace;
