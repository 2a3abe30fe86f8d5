//! Player designations marking resource nodes for gathering

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::types::{GridPos, ResourceNodeId};
use crate::entity::resource_node::{ResourceNode, ResourceNodeType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DesignationKind {
    ChopTrees,
    MineStone,
    GatherBerries,
}

impl DesignationKind {
    pub fn node_type(&self) -> ResourceNodeType {
        match self {
            DesignationKind::ChopTrees => ResourceNodeType::Tree,
            DesignationKind::MineStone => ResourceNodeType::Stone,
            DesignationKind::GatherBerries => ResourceNodeType::BerryBush,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Designation {
    pub kind: DesignationKind,
    pub nodes: Vec<ResourceNodeId>,
    /// Game time when created
    pub created_at: f64,
}

impl Designation {
    /// All marked nodes are gone
    pub fn is_complete(&self, nodes: &[ResourceNode]) -> bool {
        self.nodes
            .iter()
            .all(|id| nodes.get(id.index()).map(|n| n.is_depleted).unwrap_or(true))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesignationManager {
    designations: Vec<Designation>,
}

impl DesignationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark matching, non-depleted nodes inside the inclusive rectangle
    ///
    /// Returns the number of nodes marked; an empty area creates nothing.
    pub fn designate_area(
        &mut self,
        kind: DesignationKind,
        nodes: &mut [ResourceNode],
        corner_a: GridPos,
        corner_b: GridPos,
        now: f64,
    ) -> usize {
        let (min_x, max_x) = (corner_a.x.min(corner_b.x), corner_a.x.max(corner_b.x));
        let (min_y, max_y) = (corner_a.y.min(corner_b.y), corner_a.y.max(corner_b.y));
        let wanted = kind.node_type();

        let mut marked = Vec::new();
        for (i, node) in nodes.iter_mut().enumerate() {
            let p = node.position;
            if node.node_type == wanted
                && !node.is_depleted
                && (min_x..=max_x).contains(&p.x)
                && (min_y..=max_y).contains(&p.y)
            {
                node.designated = true;
                marked.push(ResourceNodeId(i as u32));
            }
        }

        if marked.is_empty() {
            warn!(?kind, "Designation area contains no matching resources");
            return 0;
        }

        let count = marked.len();
        info!(?kind, count, "Created designation");
        self.designations.push(Designation {
            kind,
            nodes: marked,
            created_at: now,
        });
        count
    }

    /// Retire designations whose nodes are all depleted
    pub fn update(&mut self, nodes: &[ResourceNode]) {
        let before = self.designations.len();
        self.designations.retain(|d| !d.is_complete(nodes));
        let removed = before - self.designations.len();
        if removed > 0 {
            debug!(removed, "Completed designations retired");
        }
    }

    pub fn active(&self, kind: Option<DesignationKind>) -> impl Iterator<Item = &Designation> {
        self.designations
            .iter()
            .filter(move |d| kind.map_or(true, |k| d.kind == k))
    }

    /// Unmark and drop designations, optionally of one kind
    pub fn cancel_all(&mut self, kind: Option<DesignationKind>, nodes: &mut [ResourceNode]) -> usize {
        let mut cancelled = 0;
        self.designations.retain(|d| {
            if kind.map_or(false, |k| d.kind != k) {
                return true;
            }
            for id in &d.nodes {
                if let Some(node) = nodes.get_mut(id.index()) {
                    node.designated = false;
                }
            }
            cancelled += 1;
            false
        });
        info!(cancelled, "Cancelled designations");
        cancelled
    }

    /// Designated nodes still marked for a kind
    pub fn designated_nodes<'a>(
        &'a self,
        kind: DesignationKind,
        nodes: &'a [ResourceNode],
    ) -> impl Iterator<Item = ResourceNodeId> + 'a {
        self.active(Some(kind))
            .flat_map(|d| d.nodes.iter().copied())
            .filter(move |id| nodes.get(id.index()).map(|n| n.designated).unwrap_or(false))
    }

    pub fn len(&self) -> usize {
        self.designations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.designations.is_empty()
    }
}
