//! Citizens: identity, skills, cargo and waypoint movement

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::types::{BuildingId, CitizenId, GridPos, ResourceKind, ResourceNodeId, Vec2};
use crate::entity::names::generate_name;

/// Within this distance a waypoint counts as reached
pub const WAYPOINT_RADIUS: f32 = 0.3;
/// Within this distance the movement target counts as reached
pub const ARRIVAL_RADIUS: f32 = 0.5;
pub const DEFAULT_MOVE_SPEED: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitizenState {
    #[default]
    Idle,
    Walking,
    Working,
    Carrying,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Hauling,
    Construction,
    Gathering,
}

/// What a citizen is currently working on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum Task {
    Haul(BuildingId),
    Construct(BuildingId),
    Gather(ResourceNodeId),
}

impl Task {
    pub fn job_type(&self) -> JobType {
        match self {
            Task::Haul(_) => JobType::Hauling,
            Task::Construct(_) => JobType::Construction,
            Task::Gather(_) => JobType::Gathering,
        }
    }
}

/// Skill levels, 0 to 20
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Skills {
    pub construction: u8,
    pub gathering: u8,
    pub hauling: u8,
}

impl Skills {
    /// Uniform 0..=10 for a fresh recruit
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            construction: rng.gen_range(0..=10),
            gathering: rng.gen_range(0..=10),
            hauling: rng.gen_range(0..=10),
        }
    }

    pub fn for_job(&self, job: JobType) -> u8 {
        match job {
            JobType::Construction => self.construction,
            JobType::Gathering => self.gathering,
            JobType::Hauling => self.hauling,
        }
    }
}

/// One kind of resource in hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cargo {
    pub kind: ResourceKind,
    pub amount: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citizen {
    pub id: CitizenId,
    pub name: String,
    pub position: Vec2,
    #[serde(default)]
    pub state: CitizenState,
    #[serde(default)]
    pub task: Option<Task>,
    #[serde(default)]
    pub target: Option<Vec2>,
    pub skills: Skills,
    #[serde(default = "default_true")]
    pub can_construct: bool,
    #[serde(default = "default_true")]
    pub can_gather: bool,
    #[serde(default = "default_true")]
    pub can_haul: bool,
    #[serde(default)]
    pub carrying: Option<Cargo>,
    #[serde(default = "default_move_speed")]
    pub move_speed: f32,
    /// Recomputed after load
    #[serde(skip)]
    pub path: Option<Vec<GridPos>>,
    #[serde(skip)]
    pub path_index: usize,
}

fn default_true() -> bool {
    true
}

fn default_move_speed() -> f32 {
    DEFAULT_MOVE_SPEED
}

impl Citizen {
    pub fn new(id: CitizenId, name: impl Into<String>, position: Vec2, skills: Skills) -> Self {
        Self {
            id,
            name: name.into(),
            position,
            state: CitizenState::Idle,
            task: None,
            target: None,
            skills,
            can_construct: true,
            can_gather: true,
            can_haul: true,
            carrying: None,
            move_speed: DEFAULT_MOVE_SPEED,
            path: None,
            path_index: 0,
        }
    }

    /// Random name and skills
    pub fn recruit<R: Rng + ?Sized>(id: CitizenId, position: Vec2, rng: &mut R) -> Self {
        let name = generate_name(rng);
        let skills = Skills::random(rng);
        Self::new(id, name, position, skills)
    }

    pub fn current_job(&self) -> Option<JobType> {
        self.task.map(|t| t.job_type())
    }

    /// Tile the citizen is standing on
    pub fn tile(&self) -> GridPos {
        GridPos::from_world(self.position)
    }

    pub fn skill_for(&self, job: JobType) -> u8 {
        self.skills.for_job(job)
    }

    pub fn can_do(&self, job: JobType) -> bool {
        match job {
            JobType::Construction => self.can_construct,
            JobType::Gathering => self.can_gather,
            JobType::Hauling => self.can_haul,
        }
    }

    pub fn assign_task(&mut self, task: Task) {
        self.task = Some(task);
        self.state = CitizenState::Walking;
    }

    /// Drop the task, movement target and path; back to Idle
    pub fn clear_task(&mut self) {
        self.task = None;
        self.state = CitizenState::Idle;
        self.clear_movement();
    }

    pub fn clear_movement(&mut self) {
        self.target = None;
        self.path = None;
        self.path_index = 0;
    }

    /// Start walking toward `target` along `path`
    pub fn set_target(&mut self, target: Vec2, path: Vec<GridPos>) {
        self.target = Some(target);
        self.path = Some(path);
        self.path_index = 0;
        self.state = if self.carrying.is_some() {
            CitizenState::Carrying
        } else {
            CitizenState::Walking
        };
    }

    pub fn has_reached(&self, point: Vec2) -> bool {
        self.position.distance(&point) < ARRIVAL_RADIUS
    }

    /// True when there is no target or it is within the arrival radius
    pub fn has_reached_target(&self) -> bool {
        match self.target {
            Some(target) => self.has_reached(target),
            None => true,
        }
    }

    pub fn take_cargo(&mut self) -> Option<Cargo> {
        self.carrying.take()
    }

    /// Advance along the current path
    ///
    /// With no path the citizen stands still; the job layer retries routing.
    /// Reaching the last waypoint snaps exactly onto the stored target.
    pub fn update(&mut self, delta_time: f32) {
        if !matches!(self.state, CitizenState::Walking | CitizenState::Carrying) {
            return;
        }
        let Some(target) = self.target else {
            return;
        };
        let Some(path) = self.path.as_ref() else {
            return;
        };
        let Some(&waypoint) = path.get(self.path_index) else {
            return;
        };
        let path_len = path.len();

        let waypoint = waypoint.to_vec2();
        let delta = waypoint - self.position;
        let distance = delta.length();

        if distance < WAYPOINT_RADIUS {
            self.path_index += 1;
            if self.path_index >= path_len {
                self.position = target;
            }
            return;
        }

        let step = self.move_speed * delta_time;
        if step >= distance {
            self.position = waypoint;
        } else {
            self.position = self.position + delta.normalize() * step;
        }
    }
}
