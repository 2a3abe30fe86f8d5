//! Gameplay events surfaced to the player
//!
//! The log is an owned service: the job system and game state push into it,
//! a UI layer drains it once per frame.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::city::building::BuildingType;
use crate::core::types::{BuildingId, CitizenId, GridPos, ResourceKind, ResourceNodeId};
use crate::entity::citizen::JobType;

/// Oldest events are dropped past this many
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    CitizenAssigned {
        citizen: CitizenId,
        job: JobType,
    },
    ResourceHarvested {
        citizen: CitizenId,
        node: ResourceNodeId,
        kind: ResourceKind,
        amount: u32,
    },
    ResourceDeposited {
        citizen: CitizenId,
        kind: ResourceKind,
        amount: u32,
    },
    /// Cargo was discarded because the stockpile had no room
    StorageFull {
        citizen: CitizenId,
        kind: ResourceKind,
        lost: u32,
    },
    MaterialsDelivered {
        building: BuildingId,
        kind: ResourceKind,
        amount: u32,
    },
    ConstructionStarted {
        building: BuildingId,
    },
    BuildingCompleted {
        building: BuildingId,
        building_type: BuildingType,
    },
    BuildingPlaced {
        building: BuildingId,
        building_type: BuildingType,
        position: GridPos,
    },
    PlacementRejected {
        building_type: BuildingType,
        position: GridPos,
        reason: String,
    },
    GameSaved {
        save_name: String,
    },
}

#[derive(Debug, Clone)]
pub struct EventLog {
    events: VecDeque<GameEvent>,
    capacity: usize,
    storage_full: bool,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(capacity.min(DEFAULT_EVENT_CAPACITY)),
            capacity: capacity.max(1),
            storage_full: false,
        }
    }

    pub fn push(&mut self, event: GameEvent) {
        if matches!(event, GameEvent::StorageFull { .. }) {
            self.storage_full = true;
        }
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    /// Take every pending event and reset the storage warning
    pub fn drain(&mut self) -> Vec<GameEvent> {
        self.storage_full = false;
        self.events.drain(..).collect()
    }

    /// A storage-full drop happened since the last drain
    pub fn storage_full(&self) -> bool {
        self.storage_full
    }

    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
