mod components;

pub use components::*;

use std::collections::HashMap;

/// Dense, process-local entity identifier. Server-assigned and client-assigned
/// eids are never compared directly; see [`crate::ingest::IdMaps`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Eid(pub u32);

impl Eid {
    pub fn id(self) -> u32 {
        self.0
    }
}

/// Which part of the world a simulation pass is allowed to touch.
///
/// `Full` runs every system against every entity (server, or a standalone
/// demo). `LocalPlayer(eid)` is used during client prediction/replay: systems
/// observing this scope must skip remote entities and spatial-hash rebuilds
/// entirely rather than just ignoring their output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationScope {
    Full,
    LocalPlayer(Eid),
}

/// World state as a set of per-component tables keyed by [`Eid`]. Components
/// attach by presence in their table, not by an enum tag on the entity.
#[derive(Debug, Default)]
pub struct World {
    tick: u32,
    next_eid: u32,
    scope: SimulationScope2,

    pub positions: HashMap<Eid, Position>,
    pub velocities: HashMap<Eid, Velocity>,
    pub z_positions: HashMap<Eid, ZPosition>,
    pub players: HashMap<Eid, Player>,
    pub player_states: HashMap<Eid, PlayerState>,
    pub speeds: HashMap<Eid, Speed>,
    pub colliders: HashMap<Eid, Collider>,
    pub healths: HashMap<Eid, Health>,
    pub cylinders: HashMap<Eid, Cylinder>,
    pub weapons: HashMap<Eid, Weapon>,
    pub melee_weapons: HashMap<Eid, MeleeWeapon>,
    pub bullets: HashMap<Eid, Bullet>,
    pub enemies: HashMap<Eid, Enemy>,
    pub enemy_ais: HashMap<Eid, EnemyAi>,
    pub rolls: HashMap<Eid, Roll>,
    pub jumps: HashMap<Eid, Jump>,
    pub showdowns: HashMap<Eid, Showdown>,
    pub dead: HashMap<Eid, Dead>,
    pub invincible: HashMap<Eid, Invincible>,
    pub knockbacks: HashMap<Eid, Knockback>,

    pub player_characters: HashMap<Eid, u16>,
    pub last_player_hit_dir: HashMap<Eid, (f32, f32)>,
    pub player_inputs: HashMap<Eid, crate::protocol::NetworkInput>,
}

/// Newtype wrapper so `SimulationScope`'s `Default` doesn't need to pick an
/// arbitrary local player; a fresh world always starts in `Full` scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SimulationScope2(SimulationScope);

impl Default for SimulationScope2 {
    fn default() -> Self {
        Self(SimulationScope::Full)
    }
}

impl World {
    pub fn new() -> Self {
        Self {
            next_eid: 1,
            ..Default::default()
        }
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn set_tick(&mut self, tick: u32) {
        self.tick = tick;
    }

    pub fn advance_tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    pub fn scope(&self) -> SimulationScope {
        self.scope.0
    }

    pub fn set_scope(&mut self, scope: SimulationScope) {
        self.scope.0 = scope;
    }

    pub fn is_local(&self, eid: Eid) -> bool {
        matches!(self.scope.0, SimulationScope::LocalPlayer(local) if local == eid)
    }

    pub fn alloc_eid(&mut self) -> Eid {
        let id = self.next_eid;
        self.next_eid += 1;
        Eid(id)
    }

    /// Registers an externally-minted eid (e.g. from a server-eid mapping) so
    /// future allocations never collide with it.
    pub fn reserve_eid(&mut self, eid: Eid) {
        if eid.0 >= self.next_eid {
            self.next_eid = eid.0 + 1;
        }
    }

    pub fn despawn(&mut self, eid: Eid) {
        self.positions.remove(&eid);
        self.velocities.remove(&eid);
        self.z_positions.remove(&eid);
        self.players.remove(&eid);
        self.player_states.remove(&eid);
        self.speeds.remove(&eid);
        self.colliders.remove(&eid);
        self.healths.remove(&eid);
        self.cylinders.remove(&eid);
        self.weapons.remove(&eid);
        self.melee_weapons.remove(&eid);
        self.bullets.remove(&eid);
        self.enemies.remove(&eid);
        self.enemy_ais.remove(&eid);
        self.rolls.remove(&eid);
        self.jumps.remove(&eid);
        self.showdowns.remove(&eid);
        self.dead.remove(&eid);
        self.invincible.remove(&eid);
        self.knockbacks.remove(&eid);
        self.player_characters.remove(&eid);
        self.last_player_hit_dir.remove(&eid);
        self.player_inputs.remove(&eid);
    }

    pub fn bullet_eids(&self) -> Vec<Eid> {
        self.bullets.keys().copied().collect()
    }

    pub fn player_eids(&self) -> Vec<Eid> {
        self.players.keys().copied().collect()
    }

    pub fn enemy_eids(&self) -> Vec<Eid> {
        self.enemies.keys().copied().collect()
    }
}
