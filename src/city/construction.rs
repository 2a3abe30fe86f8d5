//! Construction system - building progress from worker contributions

use crate::city::building::{Building, BuildingState};

/// Work per second at skill 0
pub const BASE_RATE: f32 = 10.0;

/// Result of a worker contribution
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContributionResult {
    /// Work contributed, building still under construction
    InProgress { contributed: f32 },
    /// Work contributed, building is now complete
    Completed { contributed: f32 },
    /// Building is already complete
    AlreadyComplete,
    /// Building has not started construction
    NotStarted,
}

/// Work one citizen adds in `delta_time` seconds
///
/// Formula: base_rate * (1 + skill / 20) * delta_time
/// - Skill 0 => 10.0 per second
/// - Skill 10 => 15.0 per second
/// - Skill 20 => 20.0 per second
pub fn calculate_worker_contribution(base_rate: f32, skill: u8, delta_time: f32) -> f32 {
    base_rate * (1.0 + skill as f32 / 20.0) * delta_time
}

/// Apply construction work to a building
///
/// Progress caps at the required work; reaching it completes and activates
/// the building.
pub fn apply_construction_work(building: &mut Building, work_amount: f32) -> ContributionResult {
    match building.state {
        BuildingState::Complete => return ContributionResult::AlreadyComplete,
        BuildingState::Planned => return ContributionResult::NotStarted,
        BuildingState::UnderConstruction => {}
    }

    let work_required = building.building_type.work_required();
    building.construction_progress += work_amount;

    if building.construction_progress >= work_required {
        building.construction_progress = work_required;
        building.state = BuildingState::Complete;
        building.is_active = true;
        ContributionResult::Completed {
            contributed: work_amount,
        }
    } else {
        ContributionResult::InProgress {
            contributed: work_amount,
        }
    }
}
