//! Gatherable resource nodes placed on the local map

use serde::{Deserialize, Serialize};

use crate::core::types::{CitizenId, GridPos, ResourceKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceNodeType {
    Tree,
    Stone,
    BerryBush,
    IronOre,
}

impl ResourceNodeType {
    /// Resource produced by a harvest
    pub fn provides(&self) -> ResourceKind {
        match self {
            ResourceNodeType::Tree => ResourceKind::Wood,
            ResourceNodeType::Stone => ResourceKind::Stone,
            ResourceNodeType::BerryBush => ResourceKind::Food,
            ResourceNodeType::IronOre => ResourceKind::Iron,
        }
    }

    /// Units produced per harvest
    pub fn yield_per_harvest(&self) -> u32 {
        match self {
            ResourceNodeType::Tree => 4,
            ResourceNodeType::Stone => 8,
            ResourceNodeType::BerryBush => 5,
            ResourceNodeType::IronOre => 5,
        }
    }

    /// Total units a fresh node holds
    pub fn max_amount(&self) -> u32 {
        match self {
            ResourceNodeType::Tree => 4,
            ResourceNodeType::Stone => 24,
            ResourceNodeType::BerryBush => 25,
            ResourceNodeType::IronOre => 60,
        }
    }

    /// Nominal seconds per harvest
    pub fn gather_time(&self) -> f32 {
        match self {
            ResourceNodeType::Tree => 3.0,
            ResourceNodeType::Stone => 5.0,
            ResourceNodeType::BerryBush => 2.0,
            ResourceNodeType::IronOre => 6.0,
        }
    }
}

/// A gatherable node
///
/// `amount_remaining` only ever decreases; a depleted node never regenerates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceNode {
    pub node_type: ResourceNodeType,
    pub position: GridPos,
    pub amount_remaining: u32,
    pub max_amount: u32,
    pub provides: ResourceKind,
    pub provides_amount: u32,
    pub gather_time: f32,
    pub is_depleted: bool,
    #[serde(default)]
    pub designated: bool,
    #[serde(default)]
    pub assigned_citizen: Option<CitizenId>,
}

impl ResourceNode {
    pub fn new(node_type: ResourceNodeType, position: GridPos) -> Self {
        Self {
            node_type,
            position,
            amount_remaining: node_type.max_amount(),
            max_amount: node_type.max_amount(),
            provides: node_type.provides(),
            provides_amount: node_type.yield_per_harvest(),
            gather_time: node_type.gather_time(),
            is_depleted: false,
            designated: false,
            assigned_citizen: None,
        }
    }

    /// Take one harvest
    ///
    /// Returns None once the node is depleted.
    pub fn gather(&mut self) -> Option<(ResourceKind, u32)> {
        if self.is_depleted || self.amount_remaining == 0 {
            self.is_depleted = true;
            return None;
        }

        let amount = self.provides_amount.min(self.amount_remaining);
        self.amount_remaining -= amount;
        if self.amount_remaining == 0 {
            self.is_depleted = true;
        }
        Some((self.provides, amount))
    }

    /// Fraction already harvested, 0.0 to 1.0
    pub fn gather_progress_percent(&self) -> f32 {
        if self.max_amount == 0 {
            return 1.0;
        }
        1.0 - self.amount_remaining as f32 / self.max_amount as f32
    }

    pub fn assign_citizen(&mut self, citizen: CitizenId) {
        self.assigned_citizen = Some(citizen);
    }

    pub fn unassign_citizen(&mut self) {
        self.assigned_citizen = None;
    }

    pub fn currently_being_gathered(&self) -> bool {
        self.assigned_citizen.is_some()
    }

    /// Designated, not depleted, and nobody else is on it
    pub fn is_available_for_gathering(&self) -> bool {
        self.designated && !self.is_depleted && self.assigned_citizen.is_none()
    }
}
