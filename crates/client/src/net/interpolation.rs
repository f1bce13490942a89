//! Buffers incoming snapshots and writes bracketed-interpolated transforms
//! for every remote entity into the world, each frame.

use ricochet_core::world::Eid;
use ricochet_core::{
    IdMaps, PredictedEntityTracker, RemoteInterpolationApplier, SnapshotBuffer, World,
    WorldSnapshot,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    Player,
    Bullet,
    Enemy,
}

#[derive(Debug, Clone, Copy)]
pub struct RenderEntity {
    pub eid: Eid,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Facing angle in radians, meaningful for [`RenderKind::Player`] only.
    pub aim_angle: f32,
    pub kind: RenderKind,
    pub is_local: bool,
}

pub struct RemoteInterpolation {
    buffer: SnapshotBuffer,
    applier: RemoteInterpolationApplier,
    interpolation_delay_ms: f64,
}

impl RemoteInterpolation {
    pub fn new(interpolation_delay_ms: f64) -> Self {
        Self {
            buffer: SnapshotBuffer::new(),
            applier: RemoteInterpolationApplier::new(),
            interpolation_delay_ms,
        }
    }

    pub fn push(&mut self, snapshot: WorldSnapshot, receive_time_local: f64) {
        self.buffer.push(snapshot, receive_time_local);
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Advances every remote entity's interpolated transform into `world`.
    /// `server_time_now` gates whether the bracket is computed in server
    /// time or local receive time, per clock sync's convergence state.
    pub fn apply(
        &mut self,
        world: &mut World,
        maps: &IdMaps,
        my_client_eid: Option<Eid>,
        tracker: &PredictedEntityTracker,
        now_local: f64,
        server_time_now: Option<f64>,
    ) {
        let Some(state) = self
            .buffer
            .get_interpolation_state(now_local, server_time_now, self.interpolation_delay_ms)
        else {
            return;
        };
        let (Some(from), Some(to)) = (self.buffer.get(state.from_index), self.buffer.get(state.to_index))
        else {
            return;
        };
        self.applier.apply(
            world,
            from,
            to,
            state.alpha,
            maps,
            my_client_eid,
            tracker,
        );
    }
}

/// Collects every currently-known entity for rendering, tagging which one is
/// the local player so the caller can skip or highlight it.
pub fn collect_render_entities(
    world: &World,
    maps: &IdMaps,
    my_client_eid: Option<Eid>,
) -> Vec<RenderEntity> {
    let mut entities = Vec::new();

    for &eid in maps.players.values() {
        if let Some(pos) = world.positions.get(&eid) {
            let z = world.z_positions.get(&eid).map(|z| z.z).unwrap_or(0.0);
            let aim_angle = world.players.get(&eid).map(|p| p.aim_angle).unwrap_or(0.0);
            entities.push(RenderEntity {
                eid,
                x: pos.x,
                y: pos.y,
                z,
                aim_angle,
                kind: RenderKind::Player,
                is_local: Some(eid) == my_client_eid,
            });
        }
    }

    for &eid in maps.enemies.values() {
        if let Some(pos) = world.positions.get(&eid) {
            entities.push(RenderEntity {
                eid,
                x: pos.x,
                y: pos.y,
                z: 0.0,
                aim_angle: 0.0,
                kind: RenderKind::Enemy,
                is_local: false,
            });
        }
    }

    for &eid in maps.bullets.values() {
        if let Some(pos) = world.positions.get(&eid) {
            entities.push(RenderEntity {
                eid,
                x: pos.x,
                y: pos.y,
                z: 0.0,
                aim_angle: 0.0,
                kind: RenderKind::Bullet,
                is_local: false,
            });
        }
    }

    entities
}
