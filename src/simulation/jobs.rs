//! Job system - per-citizen work state machines
//!
//! Each tick every citizen first advances along its path, then its task is
//! driven one step:
//!
//! - idle: claim work in priority order (hauling, construction, gathering)
//! - hauling: stockpile -> pick up materials -> building -> deliver, repeat
//! - construction: walk to the site, add work until complete
//! - gathering: walk to the node, harvest, carry the yield to the stockpile
//!
//! Nothing here returns an error. Missing targets clear the task; failed
//! routes leave the citizen standing and are retried next tick.

use ahash::AHashMap;
use tracing::{debug, info, warn};

use crate::city::building::{footprint_obstacles, Building, BuildingState};
use crate::city::construction::{apply_construction_work, calculate_worker_contribution, ContributionResult};
use crate::city::stockpile::Stockpile;
use crate::core::config::JobConfig;
use crate::core::types::{BuildingId, CitizenId, GridPos, ResourceNodeId, Vec2};
use crate::entity::citizen::{Cargo, Citizen, CitizenState, JobType, Task};
use crate::entity::resource_node::ResourceNode;
use crate::simulation::events::{EventLog, GameEvent};
use crate::spatial::grid::TileGrid;
use crate::spatial::pathfinding::{find_path, NavGrid};
use crate::world::tiles::{LocalMap, LocalTile};

/// Where haulers go when no wagon stockpile exists
pub const FALLBACK_STOCKPILE: Vec2 = Vec2 { x: 5.0, y: 5.0 };

/// Perimeter tiles tried when a building's own tile cannot be reached
const MAX_APPROACH_ATTEMPTS: usize = 4;

/// Borrowed world state for one tick
struct JobContext<'a> {
    tiles: &'a TileGrid<LocalTile>,
    buildings: &'a mut [Building],
    nodes: &'a mut [ResourceNode],
    stockpile: &'a mut Stockpile,
    events: &'a mut EventLog,
}

impl JobContext<'_> {
    fn building_index(&self, id: BuildingId) -> Option<usize> {
        self.buildings.iter().position(|b| b.id == id)
    }
}

/// Drives every citizen's task each tick
#[derive(Debug, Clone, Default)]
pub struct JobManager {
    config: JobConfig,
    /// Seconds spent at the current node, per gatherer
    gather_timers: AHashMap<CitizenId, f32>,
}

impl JobManager {
    pub fn new(config: JobConfig) -> Self {
        Self {
            config,
            gather_timers: AHashMap::new(),
        }
    }

    pub fn config(&self) -> &JobConfig {
        &self.config
    }

    pub fn gather_timer(&self, citizen: CitizenId) -> Option<f32> {
        self.gather_timers.get(&citizen).copied()
    }

    /// Advance movement and work for every citizen, in registry order
    pub fn update(
        &mut self,
        citizens: &mut [Citizen],
        buildings: &mut [Building],
        local_map: &mut LocalMap,
        stockpile: &mut Stockpile,
        delta_time: f32,
        events: &mut EventLog,
    ) {
        let LocalMap { tiles, nodes } = local_map;
        let mut ctx = JobContext {
            tiles,
            buildings,
            nodes,
            stockpile,
            events,
        };

        for citizen in citizens.iter_mut() {
            citizen.update(delta_time);

            match citizen.task {
                None => self.assign_work(citizen, &mut ctx),
                Some(Task::Haul(building)) => self.update_hauling(citizen, building, &mut ctx),
                Some(Task::Construct(building)) => {
                    self.update_construction(citizen, building, &mut ctx, delta_time)
                }
                Some(Task::Gather(node)) => self.update_gathering(citizen, node, &mut ctx, delta_time),
            }
        }
    }

    /// Claim the first available job for an idle citizen
    fn assign_work(&mut self, citizen: &mut Citizen, ctx: &mut JobContext<'_>) {
        if citizen.state != CitizenState::Idle {
            citizen.clear_task();
        }

        let task = find_hauling_job(citizen, ctx)
            .or_else(|| find_construction_job(citizen, ctx))
            .or_else(|| claim_gathering_job(citizen, ctx));

        if let Some(task) = task {
            debug!(citizen = citizen.id.0, ?task, "Assigned task");
            citizen.assign_task(task);
            ctx.events.push(GameEvent::CitizenAssigned {
                citizen: citizen.id,
                job: task.job_type(),
            });
        }
    }

    fn update_hauling(&mut self, citizen: &mut Citizen, target: BuildingId, ctx: &mut JobContext<'_>) {
        let Some(idx) = ctx.building_index(target) else {
            drop_stale_task(citizen);
            return;
        };

        match citizen.carrying {
            None => {
                let building = &ctx.buildings[idx];
                if building.state != BuildingState::Planned || building.has_all_materials() {
                    citizen.clear_task();
                    return;
                }

                let (depot, depot_id) = stockpile_location(ctx.buildings);
                if !citizen.has_reached(depot) {
                    self.move_citizen_to(citizen, depot, depot_id, ctx);
                    return;
                }

                // Needs are walked in resource order
                let pick = ctx.buildings[idx]
                    .required_materials()
                    .into_iter()
                    .find(|&(kind, _)| ctx.stockpile.get(kind) > 0);
                let Some((kind, still_needed)) = pick else {
                    debug!(citizen = citizen.id.0, building = target.0, "Stockpile lacks needed materials");
                    citizen.clear_task();
                    return;
                };

                let amount = self
                    .config
                    .haul_batch
                    .min(ctx.stockpile.get(kind))
                    .min(still_needed);
                let taken = ctx.stockpile.take(kind, amount);
                debug!(citizen = citizen.id.0, ?kind, amount = taken, "Picked up materials");
                citizen.carrying = Some(Cargo { kind, amount: taken });
                citizen.clear_movement();
                citizen.state = CitizenState::Carrying;
            }
            Some(cargo) => {
                let site = ctx.buildings[idx].center();
                if !citizen.has_reached(site) {
                    self.move_citizen_to(citizen, site, Some(target), ctx);
                    return;
                }

                citizen.take_cargo();
                let building = &mut ctx.buildings[idx];
                building.deliver_material(cargo.kind, cargo.amount);
                ctx.events.push(GameEvent::MaterialsDelivered {
                    building: target,
                    kind: cargo.kind,
                    amount: cargo.amount,
                });

                if building.has_all_materials() {
                    debug!(building = target.0, "All materials delivered");
                    citizen.clear_task();
                } else {
                    citizen.clear_movement();
                    citizen.state = CitizenState::Walking;
                }
            }
        }
    }

    fn update_construction(
        &mut self,
        citizen: &mut Citizen,
        target: BuildingId,
        ctx: &mut JobContext<'_>,
        delta_time: f32,
    ) {
        let Some(idx) = ctx.building_index(target) else {
            drop_stale_task(citizen);
            return;
        };

        let building = &mut ctx.buildings[idx];
        match building.state {
            BuildingState::Complete => {
                citizen.clear_task();
                return;
            }
            BuildingState::Planned => {
                if !building.start_construction() {
                    citizen.clear_task();
                    return;
                }
                info!(building = target.0, kind = building.building_type.name(), "Construction started");
                ctx.events.push(GameEvent::ConstructionStarted { building: target });
            }
            BuildingState::UnderConstruction => {}
        }

        let site = ctx.buildings[idx].center();
        if !citizen.has_reached(site) {
            self.move_citizen_to(citizen, site, Some(target), ctx);
            return;
        }

        citizen.state = CitizenState::Working;
        let skill = citizen.skill_for(JobType::Construction);
        let work = calculate_worker_contribution(self.config.construction_rate, skill, delta_time);
        let building = &mut ctx.buildings[idx];
        if let ContributionResult::Completed { .. } = apply_construction_work(building, work) {
            info!(building = target.0, kind = building.building_type.name(), "Building completed");
            ctx.events.push(GameEvent::BuildingCompleted {
                building: target,
                building_type: building.building_type,
            });
            citizen.clear_task();
        }
    }

    fn update_gathering(
        &mut self,
        citizen: &mut Citizen,
        target: ResourceNodeId,
        ctx: &mut JobContext<'_>,
        delta_time: f32,
    ) {
        if target.index() >= ctx.nodes.len() {
            self.gather_timers.remove(&citizen.id);
            drop_stale_task(citizen);
            return;
        }

        match citizen.carrying {
            None => {
                let node = &ctx.nodes[target.index()];
                if node.is_depleted {
                    ctx.nodes[target.index()].unassign_citizen();
                    self.gather_timers.remove(&citizen.id);
                    citizen.clear_task();
                    return;
                }

                let spot = node.position.to_vec2();
                if !citizen.has_reached(spot) {
                    self.move_citizen_to(citizen, spot, None, ctx);
                    return;
                }

                citizen.state = CitizenState::Working;
                let timer = self.gather_timers.entry(citizen.id).or_insert(0.0);
                *timer += delta_time;
                if *timer < self.config.gather_time {
                    return;
                }
                self.gather_timers.remove(&citizen.id);

                let node = &mut ctx.nodes[target.index()];
                let harvest = node.gather();
                node.unassign_citizen();

                match harvest {
                    Some((kind, amount)) => {
                        debug!(citizen = citizen.id.0, ?kind, amount, "Harvested");
                        ctx.events.push(GameEvent::ResourceHarvested {
                            citizen: citizen.id,
                            node: target,
                            kind,
                            amount,
                        });
                        citizen.carrying = Some(Cargo { kind, amount });
                        citizen.clear_movement();
                        citizen.state = CitizenState::Carrying;
                    }
                    None => citizen.clear_task(),
                }
            }
            Some(cargo) => {
                let (depot, depot_id) = stockpile_location(ctx.buildings);
                if !citizen.has_reached(depot) {
                    self.move_citizen_to(citizen, depot, depot_id, ctx);
                    return;
                }

                citizen.take_cargo();
                if ctx.stockpile.deposit(cargo.kind, cargo.amount) {
                    debug!(citizen = citizen.id.0, kind = ?cargo.kind, amount = cargo.amount, "Deposited");
                    ctx.events.push(GameEvent::ResourceDeposited {
                        citizen: citizen.id,
                        kind: cargo.kind,
                        amount: cargo.amount,
                    });
                } else {
                    warn!(
                        citizen = citizen.id.0,
                        kind = ?cargo.kind,
                        lost = cargo.amount,
                        used = ctx.stockpile.used(),
                        capacity = ctx.stockpile.capacity(),
                        "Storage full, cargo dropped"
                    );
                    ctx.events.push(GameEvent::StorageFull {
                        citizen: citizen.id,
                        kind: cargo.kind,
                        lost: cargo.amount,
                    });
                }
                citizen.clear_task();
            }
        }
    }

    /// Route toward `target`, keeping the current path while the target is unchanged
    ///
    /// When `footprint` names a building whose own tile is enclosed, the
    /// closest reachable tile around it is used instead; the citizen still
    /// snaps onto `target` at the end of that path.
    fn move_citizen_to(
        &self,
        citizen: &mut Citizen,
        target: Vec2,
        footprint: Option<BuildingId>,
        ctx: &JobContext<'_>,
    ) {
        if citizen.path.is_some() && citizen.target == Some(target) {
            return;
        }

        let start = citizen.tile();
        let goal = GridPos::from_world(target);
        let max_iterations = self.config.pathfinding_max_iterations;
        // The building a citizen stands in never blocks its way out
        let obstacles = footprint_obstacles(ctx.buildings.iter().filter(|b| !b.occupies_tile(start)));

        let path = find_path(ctx.tiles, &obstacles, start, goal, max_iterations).or_else(|| {
            let building = footprint.and_then(|id| ctx.buildings.iter().find(|b| b.id == id))?;
            let mut approaches: Vec<GridPos> = building
                .perimeter()
                .filter(|p| ctx.tiles.is_passable(*p) && !obstacles.contains(p))
                .collect();
            approaches.sort_by_key(|p| p.distance_squared(&start));
            approaches
                .into_iter()
                .take(MAX_APPROACH_ATTEMPTS)
                .find_map(|p| find_path(ctx.tiles, &obstacles, start, p, max_iterations))
        });

        match path {
            Some(path) => citizen.set_target(target, path),
            None => {
                debug!(citizen = citizen.id.0, ?start, ?goal, "No route, retrying next tick");
                citizen.target = Some(target);
                citizen.path = None;
                citizen.path_index = 0;
            }
        }
    }
}

/// Planned building still needing something the stockpile holds
fn find_hauling_job(citizen: &Citizen, ctx: &JobContext<'_>) -> Option<Task> {
    if !citizen.can_do(JobType::Hauling) {
        return None;
    }
    ctx.buildings
        .iter()
        .find(|b| {
            b.state == BuildingState::Planned
                && b.required_materials().keys().any(|&kind| ctx.stockpile.get(kind) > 0)
        })
        .map(|b| Task::Haul(b.id))
}

/// Nearest building ready for or under construction
fn find_construction_job(citizen: &Citizen, ctx: &JobContext<'_>) -> Option<Task> {
    if !citizen.can_do(JobType::Construction) {
        return None;
    }
    ctx.buildings
        .iter()
        .filter(|b| {
            b.state == BuildingState::UnderConstruction
                || (b.state == BuildingState::Planned && b.has_all_materials())
        })
        .map(|b| (b.id, citizen.position.distance_squared(&b.center())))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| Task::Construct(id))
}

/// Nearest designated, unclaimed node; claims it for the citizen
fn claim_gathering_job(citizen: &Citizen, ctx: &mut JobContext<'_>) -> Option<Task> {
    if !citizen.can_do(JobType::Gathering) {
        return None;
    }
    let (index, _) = ctx
        .nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.is_available_for_gathering())
        .map(|(i, n)| (i, citizen.position.distance_squared(&n.position.to_vec2())))
        .min_by(|a, b| a.1.total_cmp(&b.1))?;

    ctx.nodes[index].assign_citizen(citizen.id);
    Some(Task::Gather(ResourceNodeId(index as u32)))
}

/// First wagon's center, or the fixed fallback spot
pub fn stockpile_location(buildings: &[Building]) -> (Vec2, Option<BuildingId>) {
    buildings
        .iter()
        .find(|b| b.is_stockpile())
        .map(|b| (b.center(), Some(b.id)))
        .unwrap_or((FALLBACK_STOCKPILE, None))
}

fn drop_stale_task(citizen: &mut Citizen) {
    if let Some(cargo) = citizen.take_cargo() {
        debug!(citizen = citizen.id.0, kind = ?cargo.kind, amount = cargo.amount, "Dropped cargo of stale task");
    }
    citizen.clear_task();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::city::building::BuildingType;
    use crate::core::types::ResourceKind;
    use crate::entity::citizen::Skills;
    use crate::entity::resource_node::ResourceNodeType;
    use crate::world::terrain::TerrainType;

    const DT: f32 = 0.1;

    struct Fixture {
        manager: JobManager,
        citizens: Vec<Citizen>,
        buildings: Vec<Building>,
        map: LocalMap,
        stockpile: Stockpile,
        events: EventLog,
    }

    impl Fixture {
        /// 20x20 grass with a wagon at (2, 2)
        fn new() -> Self {
            Self {
                manager: JobManager::new(JobConfig::default()),
                citizens: Vec::new(),
                buildings: vec![Building::prebuilt(BuildingId(0), BuildingType::Wagon, GridPos::new(2, 2))],
                map: LocalMap::new(TileGrid::new(20, 20)),
                stockpile: Stockpile::new(500),
                events: EventLog::new(),
            }
        }

        fn add_citizen(&mut self, x: f32, y: f32) -> usize {
            let id = CitizenId(self.citizens.len() as u32);
            self.citizens
                .push(Citizen::new(id, format!("Worker {}", id.0), Vec2::new(x, y), Skills::default()));
            self.citizens.len() - 1
        }

        fn add_tree(&mut self, x: i32, y: i32) -> ResourceNodeId {
            let mut tree = ResourceNode::new(ResourceNodeType::Tree, GridPos::new(x, y));
            tree.designated = true;
            self.map.add_node(tree)
        }

        fn tick(&mut self, n: usize) {
            for _ in 0..n {
                self.manager.update(
                    &mut self.citizens,
                    &mut self.buildings,
                    &mut self.map,
                    &mut self.stockpile,
                    DT,
                    &mut self.events,
                );
            }
        }
    }

    #[test]
    fn test_storage_full_drops_cargo() {
        let mut f = Fixture::new();
        f.add_tree(10, 10);
        f.stockpile.deposit(ResourceKind::Stone, 500);
        let c = f.add_citizen(3.0, 3.0);
        f.citizens[c].task = Some(Task::Gather(ResourceNodeId(0)));
        f.citizens[c].carrying = Some(Cargo {
            kind: ResourceKind::Wood,
            amount: 10,
        });
        f.citizens[c].state = CitizenState::Carrying;

        f.tick(1);

        assert_eq!(f.stockpile.used(), 500);
        assert_eq!(f.stockpile.get(ResourceKind::Wood), 0);
        assert!(f.citizens[c].carrying.is_none());
        assert!(f.citizens[c].task.is_none());
        assert!(f.events.storage_full());
    }

    #[test]
    fn test_gather_cycle_deposits_wood() {
        let mut f = Fixture::new();
        let tree = f.add_tree(10, 10);
        let c = f.add_citizen(3.0, 3.0);

        f.tick(1);
        assert_eq!(f.citizens[c].task, Some(Task::Gather(tree)));
        assert_eq!(f.map.nodes[0].assigned_citizen, Some(CitizenId(0)));

        f.tick(400);

        assert_eq!(f.stockpile.get(ResourceKind::Wood), 4);
        assert!(f.map.nodes[0].is_depleted);
        assert!(f.map.nodes[0].assigned_citizen.is_none());
        assert!(f.citizens[c].task.is_none());
        assert_eq!(f.citizens[c].state, CitizenState::Idle);
        assert!(f.manager.gather_timer(CitizenId(0)).is_none());
    }

    #[test]
    fn test_single_claim_per_node() {
        let mut f = Fixture::new();
        f.add_tree(10, 10);
        f.add_citizen(3.0, 3.0);
        f.add_citizen(4.0, 4.0);

        f.tick(1);

        let gatherers = f
            .citizens
            .iter()
            .filter(|c| matches!(c.task, Some(Task::Gather(_))))
            .count();
        assert_eq!(gatherers, 1);
        assert!(f.map.nodes[0].assigned_citizen.is_some());
    }

    #[test]
    fn test_haul_then_construct_well() {
        let mut f = Fixture::new();
        f.stockpile.deposit(ResourceKind::Stone, 50);
        f.buildings
            .push(Building::new(BuildingId(1), BuildingType::Well, GridPos::new(10, 3)));
        f.add_citizen(3.0, 3.0);

        f.tick(1);
        assert_eq!(f.citizens[0].task, Some(Task::Haul(BuildingId(1))));

        f.tick(3000);

        let well = &f.buildings[1];
        assert_eq!(well.state, BuildingState::Complete);
        assert!(well.is_active);
        assert_eq!(well.materials_delivered.get(&ResourceKind::Stone), Some(&20));
        assert_eq!(f.stockpile.get(ResourceKind::Stone), 30);
        assert!(f
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::BuildingCompleted { building: BuildingId(1), .. })));
    }

    #[test]
    fn test_enclosed_site_reached_from_perimeter() {
        let mut f = Fixture::new();
        let mut house = Building::new(BuildingId(1), BuildingType::House, GridPos::new(10, 10));
        house.deliver_material(ResourceKind::Wood, 20);
        house.deliver_material(ResourceKind::Stone, 10);
        f.buildings.push(house);
        f.add_citizen(3.0, 3.0);

        f.tick(1);
        assert_eq!(f.citizens[0].task, Some(Task::Construct(BuildingId(1))));

        f.tick(1000);
        assert_eq!(f.buildings[1].state, BuildingState::Complete);
        assert!(f.citizens[0].task.is_none());
    }

    #[test]
    fn test_citizen_walks_out_of_own_building() {
        let mut f = Fixture::new();
        f.buildings
            .push(Building::prebuilt(BuildingId(1), BuildingType::House, GridPos::new(10, 10)));
        let tree = f.add_tree(16, 11);
        f.add_citizen(11.0, 11.0);

        f.tick(400);

        assert!(f.map.nodes[tree.index()].is_depleted);
        assert_eq!(f.stockpile.get(ResourceKind::Wood), 4);
        assert!(!f.buildings[1].occupies_tile(f.citizens[0].tile()));
    }

    #[test]
    fn test_stale_task_clears_and_drops_cargo() {
        let mut f = Fixture::new();
        let c = f.add_citizen(3.0, 3.0);
        f.citizens[c].task = Some(Task::Haul(BuildingId(99)));
        f.citizens[c].carrying = Some(Cargo {
            kind: ResourceKind::Wood,
            amount: 5,
        });
        f.citizens[c].state = CitizenState::Carrying;

        f.tick(1);

        assert!(f.citizens[c].task.is_none());
        assert!(f.citizens[c].carrying.is_none());
        assert_eq!(f.citizens[c].state, CitizenState::Idle);
    }

    #[test]
    fn test_work_preferences_respected() {
        let mut f = Fixture::new();
        f.add_tree(10, 10);
        let c = f.add_citizen(3.0, 3.0);
        f.citizens[c].can_gather = false;

        f.tick(5);

        assert!(f.citizens[c].task.is_none());
        assert!(f.map.nodes[0].assigned_citizen.is_none());
    }

    #[test]
    fn test_blocked_route_stands_still() {
        let mut f = Fixture::new();
        // Ring of water around the tree
        for y in 8..=12 {
            for x in 8..=12 {
                if x == 8 || x == 12 || y == 8 || y == 12 {
                    f.map.tiles.set(x, y, LocalTile::new(TerrainType::Water));
                }
            }
        }
        f.add_tree(10, 10);
        let c = f.add_citizen(3.0, 3.0);

        f.tick(20);

        assert_eq!(f.citizens[c].position, Vec2::new(3.0, 3.0));
        assert!(f.citizens[c].path.is_none());
        assert_eq!(f.citizens[c].task, Some(Task::Gather(ResourceNodeId(0))));
    }

    #[test]
    fn test_hauler_without_stock_gives_up() {
        let mut f = Fixture::new();
        f.buildings
            .push(Building::new(BuildingId(1), BuildingType::Well, GridPos::new(10, 3)));
        let c = f.add_citizen(3.0, 3.0);
        f.citizens[c].assign_task(Task::Haul(BuildingId(1)));

        f.tick(1);

        assert!(f.citizens[c].task.is_none());
    }

    #[test]
    fn test_stockpile_location_fallback() {
        assert_eq!(stockpile_location(&[]), (FALLBACK_STOCKPILE, None));
        let wagon = Building::prebuilt(BuildingId(4), BuildingType::Wagon, GridPos::new(50, 50));
        assert_eq!(stockpile_location(&[wagon]), (Vec2::new(51.0, 51.0), Some(BuildingId(4))));
    }
}
