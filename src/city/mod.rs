//! City layer - buildings, construction, storage and designations

pub mod building;
pub mod construction;
pub mod designation;
pub mod placement;
pub mod stockpile;

pub use building::{footprint_obstacles, Building, BuildingState, BuildingType};
pub use construction::{apply_construction_work, calculate_worker_contribution, ContributionResult};
pub use designation::{Designation, DesignationKind, DesignationManager};
pub use placement::{check_placement, PlacementError};
pub use stockpile::Stockpile;
