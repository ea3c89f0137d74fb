pub mod settlement;
pub mod workflow;
