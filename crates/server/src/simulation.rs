//! Minimal gameplay registry: movement only, since weapon/ability/AI content
//! is out of scope for this crate. Registered in both the `Prediction` and
//! `Replay` sets so client-side reconciliation exercises the same movement
//! rule the server runs, per `ricochet_core::tick`'s contract.

use ricochet_core::world::Velocity;
use ricochet_core::{GameplayEventSink, SimulationScope, SystemRegistry, SystemSet, World};

const MOVE_SPEED: f32 = 180.0;

fn movement_system(world: &mut World, dt: f32, _sink: &mut dyn GameplayEventSink) {
    let scope = world.scope();
    let eids: Vec<_> = world.player_inputs.keys().copied().collect();

    for eid in eids {
        if let SimulationScope::LocalPlayer(local) = scope {
            if local != eid {
                continue;
            }
        }

        let input = world.player_inputs[&eid];
        let vx = input.move_x * MOVE_SPEED;
        let vy = input.move_y * MOVE_SPEED;
        world.velocities.insert(eid, Velocity { x: vx, y: vy });

        if let Some(pos) = world.positions.get_mut(&eid) {
            pos.prev_x = pos.x;
            pos.prev_y = pos.y;
            pos.x += vx * dt;
            pos.y += vy * dt;
        }

        if let Some(player) = world.players.get_mut(&eid) {
            player.aim_angle = input.aim_angle;
        }
    }
}

pub fn build_registry() -> SystemRegistry {
    let mut registry = SystemRegistry::new();
    registry.register(
        "movement",
        &[SystemSet::Prediction, SystemSet::Replay],
        movement_system,
    );
    registry
}
