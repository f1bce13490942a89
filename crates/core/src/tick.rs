//! Fixed-step tick driver and the named simulation-system registry it drives.
//!
//! The registry and its systems are an external collaborator in spirit
//! (content — movement rules, weapon rules, AI — belongs to the gameplay
//! layer) but the two named sets and the scoped-driver contract are part of
//! this core, since reconciliation correctness depends on them.

use crate::event::GameplayEventSink;
use crate::protocol::{NetworkInput, TICK_S};
use crate::world::{Eid, SimulationScope, World};

pub type SystemFn = fn(&mut World, f32, &mut dyn GameplayEventSink);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemSet {
    Prediction,
    Replay,
}

struct SystemEntry {
    #[allow(dead_code)]
    name: &'static str,
    sets: &'static [SystemSet],
    func: SystemFn,
}

/// Ordered list of named simulation steps. `PREDICTION` is the full
/// player-controlled pipeline; `REPLAY` is the movement-only subset run
/// during reconciliation so presentation events aren't emitted twice.
#[derive(Default)]
pub struct SystemRegistry {
    systems: Vec<SystemEntry>,
}

impl SystemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &'static str, sets: &'static [SystemSet], func: SystemFn) {
        self.systems.push(SystemEntry { name, sets, func });
    }

    pub fn run_set(
        &self,
        set: SystemSet,
        world: &mut World,
        dt: f32,
        sink: &mut dyn GameplayEventSink,
    ) {
        for entry in &self.systems {
            if entry.sets.contains(&set) {
                (entry.func)(world, dt, sink);
            }
        }
    }

    pub fn run_all(&self, world: &mut World, dt: f32, sink: &mut dyn GameplayEventSink) {
        for entry in &self.systems {
            (entry.func)(world, dt, sink);
        }
    }
}

/// Drives the whole world (server, or a standalone single-process demo).
/// Every registered system runs regardless of set membership.
pub struct FullWorldDriver {
    registry: SystemRegistry,
}

impl FullWorldDriver {
    pub fn new(registry: SystemRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SystemRegistry {
        &self.registry
    }

    /// Writes `input` for `eid` then runs every registered system once.
    pub fn step(
        &self,
        world: &mut World,
        eid: Eid,
        input: NetworkInput,
        sink: &mut dyn GameplayEventSink,
    ) {
        world.set_scope(SimulationScope::Full);
        world.player_inputs.insert(eid, input);
        self.registry.run_all(world, TICK_S, sink);
        world.advance_tick();
    }
}

/// Drives only the local player's slice of the world, used for client-side
/// prediction and reconciliation replay.
pub struct LocalPlayerDriver {
    registry: SystemRegistry,
}

impl LocalPlayerDriver {
    pub fn new(registry: SystemRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &SystemRegistry {
        &self.registry
    }

    /// Predicts one tick for `eid` under the `PREDICTION` system set.
    pub fn step(
        &self,
        world: &mut World,
        eid: Eid,
        input: NetworkInput,
        sink: &mut dyn GameplayEventSink,
    ) {
        world.set_scope(SimulationScope::LocalPlayer(eid));
        world.player_inputs.insert(eid, input);
        self.registry
            .run_set(SystemSet::Prediction, world, TICK_S, sink);
        world.advance_tick();
    }

    /// Re-runs the movement-only `REPLAY` set once per pending input, in
    /// ascending `seq` order. Callers pass a [`crate::event::NullSink`] (or
    /// equivalent) so replay never re-emits presentation events.
    pub fn replay(
        &self,
        world: &mut World,
        eid: Eid,
        pending_inputs: &[NetworkInput],
        sink: &mut dyn GameplayEventSink,
    ) {
        world.set_scope(SimulationScope::LocalPlayer(eid));
        for input in pending_inputs {
            world.player_inputs.insert(eid, *input);
            self.registry.run_set(SystemSet::Replay, world, TICK_S, sink);
        }
    }
}

/// Accumulator-based fixed timestep: `accumulate` absorbs variable frame
/// deltas, `consume_tick` drains whole ticks from it one at a time.
pub struct FixedTimestep {
    tick_rate: u32,
    dt: f32,
    accumulator: f32,
}

impl FixedTimestep {
    pub fn new(tick_rate: u32) -> Self {
        Self {
            tick_rate,
            dt: 1.0 / tick_rate as f32,
            accumulator: 0.0,
        }
    }

    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    pub fn dt(&self) -> f32 {
        self.dt
    }

    pub fn accumulate(&mut self, delta: f32) {
        self.accumulator += delta.min(0.25);
    }

    pub fn should_tick(&self) -> bool {
        self.accumulator >= self.dt
    }

    pub fn consume_tick(&mut self) -> bool {
        if self.accumulator >= self.dt {
            self.accumulator -= self.dt;
            true
        } else {
            false
        }
    }

    pub fn alpha(&self) -> f32 {
        self.accumulator / self.dt
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::RecordingSink;
    use crate::protocol::Buttons;
    use crate::world::{Position, Velocity};

    fn movement_system(world: &mut World, dt: f32, _sink: &mut dyn GameplayEventSink) {
        let scope = world.scope();
        let eids: Vec<Eid> = world.player_inputs.keys().copied().collect();
        for eid in eids {
            if let SimulationScope::LocalPlayer(local) = scope {
                if local != eid {
                    continue;
                }
            }
            let input = world.player_inputs[&eid];
            let vx = input.move_x * 100.0;
            let vy = input.move_y * 100.0;
            world.velocities.insert(eid, Velocity { x: vx, y: vy });
            if let Some(pos) = world.positions.get_mut(&eid) {
                pos.prev_x = pos.x;
                pos.prev_y = pos.y;
                pos.x += vx * dt;
                pos.y += vy * dt;
            }
        }
    }

    fn fire_system(world: &mut World, _dt: f32, sink: &mut dyn GameplayEventSink) {
        let scope = world.scope();
        let eids: Vec<Eid> = world.player_inputs.keys().copied().collect();
        for eid in eids {
            if let SimulationScope::LocalPlayer(local) = scope {
                if local != eid {
                    continue;
                }
            }
            let input = world.player_inputs[&eid];
            if input.has(Buttons::SHOOT) {
                sink.push(crate::event::GameEvent::Fire {
                    eid,
                    bullet_eid: eid,
                });
            }
        }
    }

    fn registry() -> SystemRegistry {
        let mut registry = SystemRegistry::new();
        registry.register(
            "movement",
            &[SystemSet::Prediction, SystemSet::Replay],
            movement_system,
        );
        registry.register("fire", &[SystemSet::Prediction], fire_system);
        registry
    }

    fn input(seq: u32, move_y: f32, shoot: bool) -> NetworkInput {
        NetworkInput {
            seq,
            client_tick: seq,
            client_time_ms: 0,
            estimated_server_time_ms: 0.0,
            view_interp_delay_ms: 100,
            shoot_seq: 0,
            buttons: if shoot { Buttons::SHOOT } else { Buttons::empty() },
            aim_angle: 0.0,
            move_x: 0.0,
            move_y,
            cursor_world_x: 0.0,
            cursor_world_y: 0.0,
        }
    }

    #[test]
    fn prediction_moves_and_fires() {
        let mut world = World::new();
        let eid = world.alloc_eid();
        world.positions.insert(eid, Position::at(0.0, 0.0));

        let driver = LocalPlayerDriver::new(registry());
        let mut sink = RecordingSink::default();
        driver.step(&mut world, eid, input(1, 1.0, true), &mut sink);

        let pos = world.positions[&eid];
        assert!(pos.y > 0.0);
        assert_eq!(sink.events.len(), 1);
    }

    #[test]
    fn replay_does_not_refire() {
        let mut world = World::new();
        let eid = world.alloc_eid();
        world.positions.insert(eid, Position::at(0.0, 0.0));

        let driver = LocalPlayerDriver::new(registry());
        let mut null_sink = crate::event::NullSink;
        driver.replay(&mut world, eid, &[input(1, 1.0, true)], &mut null_sink);

        let pos = world.positions[&eid];
        assert!(pos.y > 0.0);
    }

    #[test]
    fn fixed_timestep_accumulation() {
        let mut ts = FixedTimestep::new(60);
        ts.accumulate(1.0 / 30.0);
        assert!(ts.should_tick());
        assert!(ts.consume_tick());
        assert!(ts.consume_tick());
        assert!(!ts.consume_tick());
    }
}
