//! Entities - citizens and resource nodes

pub mod citizen;
pub mod names;
pub mod resource_node;

pub use citizen::{Cargo, Citizen, CitizenState, JobType, Skills, Task};
pub use resource_node::{ResourceNode, ResourceNodeType};
