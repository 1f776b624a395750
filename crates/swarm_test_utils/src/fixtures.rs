//! Fixture scenarios.
//!
//! Small prebuilt worlds used across the integration tests and benches, so
//! every test does not start with twenty lines of setup.

use swarm_core::config::EngineConfig;
use swarm_core::engine::Engine;
use swarm_core::grid::GridPos;
use swarm_core::oracle::UnitId;

use crate::grid_oracle::GridOracle;

/// An engine with a fixed seed and the default config.
#[must_use]
pub fn default_engine() -> Engine {
    Engine::new(EngineConfig {
        rng_seed: 0xD00D,
        ..EngineConfig::default()
    })
}

/// An open 20x20 world with `workers` workers lined up along row 2.
#[must_use]
pub fn worker_camp(workers: usize) -> (GridOracle, Vec<UnitId>) {
    let mut world = GridOracle::new(20, 20);
    let ids = (0..workers)
        .map(|i| world.add_worker(GridPos::new(2 + i as i32, 2)))
        .collect();
    (world, ids)
}

/// An open 30x20 world with friendly attackers on the west edge and enemies
/// on the east edge.
#[must_use]
pub fn skirmish(attackers: usize, enemies: usize) -> (GridOracle, Vec<UnitId>, Vec<UnitId>) {
    let mut world = GridOracle::new(30, 20);
    let ours = (0..attackers)
        .map(|i| world.add_attacker(GridPos::new(2, 2 + i as i32)))
        .collect();
    let theirs = (0..enemies)
        .map(|i| world.add_enemy(GridPos::new(27, 2 + i as i32)))
        .collect();
    (world, ours, theirs)
}

/// Proptest strategies for engine inputs.
pub mod strategies {
    use proptest::prelude::*;
    use swarm_core::grid::GridPos;

    /// A position inside a map of the given size.
    pub fn arb_grid_pos(width: i32, height: i32) -> impl Strategy<Value = GridPos> {
        (0..width, 0..height).prop_map(|(x, y)| GridPos::new(x, y))
    }

    /// An interior position, one cell away from every edge.
    pub fn arb_interior_pos(width: i32, height: i32) -> impl Strategy<Value = GridPos> {
        (1..width - 1, 1..height - 1).prop_map(|(x, y)| GridPos::new(x, y))
    }

    /// A workforce size worth testing.
    pub fn arb_worker_count() -> impl Strategy<Value = usize> {
        1usize..12
    }

    /// An RNG seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_camp_spawns_the_requested_workforce() {
        let (world, ids) = worker_camp(6);
        assert_eq!(ids.len(), 6);
        assert_eq!(swarm_core::oracle::Oracle::my_units(&world).len(), 6);
    }

    #[test]
    fn skirmish_lines_face_each_other() {
        let (world, ours, theirs) = skirmish(3, 2);
        assert_eq!(ours.len(), 3);
        assert_eq!(theirs.len(), 2);
        assert_eq!(world.enemy_ids(), theirs);
    }
}
