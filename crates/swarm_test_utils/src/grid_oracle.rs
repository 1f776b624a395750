//! An in-memory host simulation.
//!
//! [`GridOracle`] implements the engine's host boundary on a simple grid:
//! greedy pathing, fixed-damage combat, linear build progress. It is not a
//! game; it is just enough world for the engine's decisions to have
//! observable consequences in tests and headless runs.
//!
//! All state lives in `BTreeMap`s so behavior is identical run to run.

use std::collections::{BTreeMap, BTreeSet};

use swarm_core::grid::{Direction, GridPos};
use swarm_core::oracle::{Oracle, PathProgress, StructureKind, UnitId};
use swarm_core::roster::UnitRole;

/// Damage per attack.
pub const ATTACK_DAMAGE: u32 = 10;
/// Build progress added per build action.
pub const BUILD_WORK: u32 = 25;
/// Progress at which a structure counts as built.
pub const BUILD_DONE: u32 = 100;
/// Resource removed per harvest action.
pub const HARVEST_YIELD: u32 = 3;
/// Resource amount a `k` map cell starts with.
pub const ASCII_DEPOSIT_AMOUNT: u32 = 50;
/// Default squared vision radius.
pub const VISION_RADIUS_SQ: u32 = 50;
/// Default squared attack radius.
pub const ATTACK_RADIUS_SQ: u32 = 10;

/// Which side a simulated unit is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Team {
    /// The engine's own team.
    Friendly,
    /// The opposition.
    Enemy,
}

/// What a simulated unit is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimKind {
    /// Economy unit.
    Worker,
    /// Combat unit.
    Attacker,
    /// A structure with build progress.
    Structure {
        /// The structure kind placed.
        kind: StructureKind,
        /// Build progress, done at [`BUILD_DONE`].
        progress: u32,
    },
}

/// One unit in the simulated world.
#[derive(Debug, Clone)]
pub struct SimUnit {
    /// Unit id.
    pub id: UnitId,
    /// Team.
    pub team: Team,
    /// What it is.
    pub kind: SimKind,
    /// Where it stands.
    pub pos: GridPos,
    /// Remaining health.
    pub health: u32,
}

impl SimUnit {
    fn role(&self) -> UnitRole {
        match self.kind {
            SimKind::Worker => UnitRole::Worker,
            SimKind::Attacker => UnitRole::Attacker,
            SimKind::Structure { .. } => UnitRole::Structure,
        }
    }
}

/// The in-memory world.
#[derive(Debug, Clone, Default)]
pub struct GridOracle {
    width: u32,
    height: u32,
    walls: BTreeSet<GridPos>,
    deposits: BTreeMap<GridPos, u32>,
    units: BTreeMap<UnitId, SimUnit>,
    next_id: UnitId,
    /// Total resource harvested by friendly workers, for assertions.
    pub harvested: u32,
}

impl GridOracle {
    /// Create an open map of the given size.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            next_id: 1,
            ..Self::default()
        }
    }

    /// Build a world from an ASCII map.
    ///
    /// Legend: `.` floor, `#` wall, `k` resource deposit, `w` friendly
    /// worker, `a` friendly attacker, `e` enemy attacker. Row 0 of the
    /// string is row 0 of the map.
    ///
    /// # Panics
    ///
    /// Panics on characters outside the legend (test maps are source code).
    #[must_use]
    pub fn from_ascii(map: &str) -> Self {
        let rows: Vec<&str> = map.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        let height = rows.len() as u32;
        let width = rows.first().map_or(0, |r| r.len()) as u32;
        let mut world = Self::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate() {
                let pos = GridPos::new(x as i32, y as i32);
                match ch {
                    '.' => {}
                    '#' => {
                        world.walls.insert(pos);
                    }
                    'k' => {
                        world.set_deposit(pos, ASCII_DEPOSIT_AMOUNT);
                    }
                    'w' => {
                        world.add_worker(pos);
                    }
                    'a' => {
                        world.add_attacker(pos);
                    }
                    'e' => {
                        world.add_enemy(pos);
                    }
                    other => panic!("unknown map character {other:?} at ({x}, {y})"),
                }
            }
        }
        world
    }

    fn add_unit(&mut self, team: Team, kind: SimKind, pos: GridPos, health: u32) -> UnitId {
        let id = self.next_id;
        self.next_id += 1;
        self.units.insert(
            id,
            SimUnit {
                id,
                team,
                kind,
                pos,
                health,
            },
        );
        id
    }

    /// Add a friendly worker.
    pub fn add_worker(&mut self, pos: GridPos) -> UnitId {
        self.add_unit(Team::Friendly, SimKind::Worker, pos, 100)
    }

    /// Add a friendly attacker.
    pub fn add_attacker(&mut self, pos: GridPos) -> UnitId {
        self.add_unit(Team::Friendly, SimKind::Attacker, pos, 100)
    }

    /// Add an enemy attacker with default health.
    pub fn add_enemy(&mut self, pos: GridPos) -> UnitId {
        self.add_enemy_with_health(pos, 100)
    }

    /// Add an enemy attacker with explicit health.
    pub fn add_enemy_with_health(&mut self, pos: GridPos, health: u32) -> UnitId {
        self.add_unit(Team::Enemy, SimKind::Attacker, pos, health)
    }

    /// Add a friendly structure, finished or in progress.
    pub fn add_structure(&mut self, pos: GridPos, kind: StructureKind, built: bool) -> UnitId {
        let progress = if built { BUILD_DONE } else { 0 };
        self.add_unit(
            Team::Friendly,
            SimKind::Structure { kind, progress },
            pos,
            200,
        )
    }

    /// Place a resource deposit.
    pub fn set_deposit(&mut self, pos: GridPos, amount: u32) {
        self.deposits.insert(pos, amount);
    }

    /// Remove a unit outright.
    pub fn kill(&mut self, id: UnitId) {
        self.units.remove(&id);
    }

    /// Reduce a unit's health, removing it at zero.
    pub fn damage(&mut self, id: UnitId, amount: u32) {
        let dead = match self.units.get_mut(&id) {
            Some(unit) => {
                unit.health = unit.health.saturating_sub(amount);
                unit.health == 0
            }
            None => false,
        };
        if dead {
            self.units.remove(&id);
        }
    }

    /// Inspect a simulated unit.
    #[must_use]
    pub fn unit(&self, id: UnitId) -> Option<&SimUnit> {
        self.units.get(&id)
    }

    /// Ids of friendly structures of one kind, sorted.
    #[must_use]
    pub fn structure_ids(&self, want: StructureKind) -> Vec<UnitId> {
        self.units
            .values()
            .filter(|u| matches!(u.kind, SimKind::Structure { kind, .. } if kind == want))
            .filter(|u| u.team == Team::Friendly)
            .map(|u| u.id)
            .collect()
    }

    /// Ids of every enemy unit still alive, sorted.
    #[must_use]
    pub fn enemy_ids(&self) -> Vec<UnitId> {
        self.units
            .values()
            .filter(|u| u.team == Team::Enemy)
            .map(|u| u.id)
            .collect()
    }

    fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as u32) < self.width && (pos.y as u32) < self.height
    }

    fn unit_at(&self, pos: GridPos) -> Option<&SimUnit> {
        self.units.values().find(|u| u.pos == pos)
    }

    fn cell_free(&self, pos: GridPos) -> bool {
        self.is_passable(pos) && self.unit_at(pos).is_none()
    }

    fn try_move(&mut self, id: UnitId, to: GridPos) -> bool {
        if !self.cell_free(to) {
            return false;
        }
        if let Some(unit) = self.units.get_mut(&id) {
            unit.pos = to;
            return true;
        }
        false
    }
}

impl Oracle for GridOracle {
    fn my_units(&self) -> Vec<UnitId> {
        self.units
            .values()
            .filter(|u| u.team == Team::Friendly)
            .map(|u| u.id)
            .collect()
    }

    fn unit_role(&self, id: UnitId) -> Option<UnitRole> {
        let unit = self.units.get(&id)?;
        (unit.team == Team::Friendly).then(|| unit.role())
    }

    fn location(&self, id: UnitId) -> Option<GridPos> {
        self.units.get(&id).map(|u| u.pos)
    }

    fn health(&self, id: UnitId) -> Option<u32> {
        self.units.get(&id).map(|u| u.health)
    }

    fn vision_radius_sq(&self, _id: UnitId) -> u32 {
        VISION_RADIUS_SQ
    }

    fn attack_radius_sq(&self, _id: UnitId) -> u32 {
        ATTACK_RADIUS_SQ
    }

    fn enemies_in_vision(&self, id: UnitId) -> Vec<UnitId> {
        let Some(me) = self.units.get(&id) else {
            return Vec::new();
        };
        self.units
            .values()
            .filter(|u| u.team == Team::Enemy)
            .filter(|u| me.pos.distance_squared(u.pos) <= VISION_RADIUS_SQ)
            .map(|u| u.id)
            .collect()
    }

    fn friendly_combat_units_within(&self, center: GridPos, radius_sq: u32) -> Vec<UnitId> {
        self.units
            .values()
            .filter(|u| u.team == Team::Friendly && u.kind == SimKind::Attacker)
            .filter(|u| center.distance_squared(u.pos) <= radius_sq)
            .map(|u| u.id)
            .collect()
    }

    fn map_width(&self) -> u32 {
        self.width
    }

    fn map_height(&self) -> u32 {
        self.height
    }

    fn is_passable(&self, pos: GridPos) -> bool {
        self.in_bounds(pos) && !self.walls.contains(&pos)
    }

    fn is_occupied(&self, pos: GridPos) -> bool {
        self.unit_at(pos).is_some()
    }

    fn structure_at(&self, pos: GridPos) -> Option<UnitId> {
        self.unit_at(pos)
            .filter(|u| matches!(u.kind, SimKind::Structure { .. }))
            .map(|u| u.id)
    }

    fn structure_is_built(&self, id: UnitId) -> bool {
        matches!(
            self.units.get(&id).map(|u| u.kind),
            Some(SimKind::Structure { progress, .. }) if progress >= BUILD_DONE
        )
    }

    fn deposit_at(&self, pos: GridPos) -> u32 {
        self.deposits.get(&pos).copied().unwrap_or(0)
    }

    /// Greedy single-step pathing: step straight at the target, falling back
    /// to the two 45-degree detours when the direct cell is taken.
    fn step_toward(&mut self, id: UnitId, target: GridPos) -> PathProgress {
        let Some(here) = self.location(id) else {
            return PathProgress::Blocked;
        };
        if here == target || here.is_adjacent(target) {
            return PathProgress::Arrived;
        }
        let Some(direct) = here.direction_to(target) else {
            return PathProgress::Arrived;
        };
        for direction in detour_order(direct) {
            if self.try_move(id, here.step(direction)) {
                return PathProgress::Advanced;
            }
        }
        PathProgress::Blocked
    }

    fn can_attack(&self, id: UnitId, target: UnitId) -> bool {
        let (Some(me), Some(them)) = (self.units.get(&id), self.units.get(&target)) else {
            return false;
        };
        me.kind == SimKind::Attacker
            && me.team != them.team
            && me.pos.distance_squared(them.pos) <= ATTACK_RADIUS_SQ
    }

    fn attack(&mut self, id: UnitId, target: UnitId) {
        debug_assert!(self.can_attack(id, target));
        tracing::debug!(attacker = id, target, "attack resolved");
        self.damage(target, ATTACK_DAMAGE);
    }

    fn can_harvest(&self, id: UnitId, direction: Direction) -> bool {
        let Some(me) = self.units.get(&id) else {
            return false;
        };
        me.kind == SimKind::Worker && self.deposit_at(me.pos.step(direction)) > 0
    }

    fn harvest(&mut self, id: UnitId, direction: Direction) {
        debug_assert!(self.can_harvest(id, direction));
        let Some(cell) = self.location(id).map(|p| p.step(direction)) else {
            return;
        };
        if let Some(amount) = self.deposits.get_mut(&cell) {
            let taken = (*amount).min(HARVEST_YIELD);
            *amount -= taken;
            self.harvested += taken;
        }
    }

    fn can_replicate(&self, id: UnitId, direction: Direction) -> bool {
        let Some(me) = self.units.get(&id) else {
            return false;
        };
        me.kind == SimKind::Worker && self.cell_free(me.pos.step(direction))
    }

    fn replicate(&mut self, id: UnitId, direction: Direction) -> Option<UnitId> {
        debug_assert!(self.can_replicate(id, direction));
        let cell = self.location(id)?.step(direction);
        if !self.cell_free(cell) {
            return None;
        }
        let replica = self.add_worker(cell);
        tracing::debug!(parent = id, replica, "worker replicated");
        Some(replica)
    }

    fn can_blueprint(&self, id: UnitId, _kind: StructureKind, direction: Direction) -> bool {
        let Some(me) = self.units.get(&id) else {
            return false;
        };
        me.kind == SimKind::Worker && self.cell_free(me.pos.step(direction))
    }

    fn blueprint(
        &mut self,
        id: UnitId,
        kind: StructureKind,
        direction: Direction,
    ) -> Option<UnitId> {
        debug_assert!(self.can_blueprint(id, kind, direction));
        let cell = self.location(id)?.step(direction);
        if !self.cell_free(cell) {
            return None;
        }
        let structure = self.add_unit(
            Team::Friendly,
            SimKind::Structure { kind, progress: 0 },
            cell,
            200,
        );
        tracing::debug!(worker = id, structure, ?kind, "blueprint placed");
        Some(structure)
    }

    fn can_build(&self, id: UnitId, structure: UnitId) -> bool {
        let (Some(me), Some(site)) = (self.units.get(&id), self.units.get(&structure)) else {
            return false;
        };
        me.kind == SimKind::Worker
            && matches!(site.kind, SimKind::Structure { progress, .. } if progress < BUILD_DONE)
            && (me.pos.is_adjacent(site.pos) || me.pos == site.pos)
    }

    fn build(&mut self, id: UnitId, structure: UnitId) {
        debug_assert!(self.can_build(id, structure));
        if let Some(site) = self.units.get_mut(&structure) {
            if let SimKind::Structure { progress, .. } = &mut site.kind {
                *progress = (*progress + BUILD_WORK).min(BUILD_DONE);
            }
        }
    }
}

/// The direct direction plus its two 45-degree neighbors, in try order.
fn detour_order(direct: Direction) -> [Direction; 3] {
    let all = Direction::ALL;
    let i = all.iter().position(|d| *d == direct).unwrap_or(0);
    [all[i], all[(i + 1) % 8], all[(i + 7) % 8]]
}
