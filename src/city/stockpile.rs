//! Stockpile - settlement-level resource storage
//!
//! One shared pool bounded by a total capacity across all kinds. The owner
//! raises the capacity as warehouses complete.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::ResourceKind;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stockpile {
    resources: AHashMap<ResourceKind, u32>,
    #[serde(default)]
    capacity: u32,
}

impl Stockpile {
    pub fn new(capacity: u32) -> Self {
        Self {
            resources: AHashMap::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn set_capacity(&mut self, capacity: u32) {
        self.capacity = capacity;
    }

    /// Get current amount of a resource
    pub fn get(&self, resource: ResourceKind) -> u32 {
        self.resources.get(&resource).copied().unwrap_or(0)
    }

    pub fn used(&self) -> u32 {
        self.resources.values().sum()
    }

    pub fn remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.used())
    }

    pub fn is_full(&self) -> bool {
        self.used() >= self.capacity
    }

    pub fn can_add(&self, amount: u32) -> bool {
        self.used().saturating_add(amount) <= self.capacity
    }

    /// All-or-nothing deposit; returns false and stores nothing on overflow
    pub fn deposit(&mut self, resource: ResourceKind, amount: u32) -> bool {
        if !self.can_add(amount) {
            return false;
        }
        *self.resources.entry(resource).or_insert(0) += amount;
        true
    }

    /// Remove up to `max`, returns amount actually removed
    pub fn take(&mut self, resource: ResourceKind, max: u32) -> u32 {
        if let Some(current) = self.resources.get_mut(&resource) {
            let removed = max.min(*current);
            *current -= removed;
            removed
        } else {
            0
        }
    }

    /// Amounts per kind in declaration order, zeroes included
    pub fn snapshot(&self) -> Vec<(ResourceKind, u32)> {
        ResourceKind::ALL.iter().map(|&k| (k, self.get(k))).collect()
    }
}
