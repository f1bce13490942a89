//! Writes bracketed-interpolated transforms into the world for every remote
//! entity. The local player and local-timeline bullets are never touched
//! here — their render position comes from prediction plus the reconciler's
//! residual error.

use std::collections::HashMap;

use crate::protocol::WorldSnapshot;
use crate::snapshot_buffer::SnapshotEntry;
use crate::tracker::PredictedEntityTracker;
use crate::world::{Eid, World};

#[derive(Default)]
pub struct IdMaps {
    pub players: HashMap<u16, Eid>,
    pub bullets: HashMap<u16, Eid>,
    pub enemies: HashMap<u16, Eid>,
}

#[derive(Default)]
struct RecordIndex {
    players: HashMap<u16, usize>,
    bullets: HashMap<u16, usize>,
    enemies: HashMap<u16, usize>,
}

/// Reused buffers avoid per-call allocation in steady state.
#[derive(Default)]
pub struct RemoteInterpolationApplier {
    index: RecordIndex,
}

impl RemoteInterpolationApplier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(
        &mut self,
        world: &mut World,
        from: &SnapshotEntry,
        to: &SnapshotEntry,
        alpha: f32,
        maps: &IdMaps,
        my_client_eid: Option<Eid>,
        tracker: &PredictedEntityTracker,
    ) -> f32 {
        world.set_tick(round_tick(from.snapshot.tick, to.snapshot.tick, alpha));

        self.rebuild_index(&from.snapshot);

        for p in &to.snapshot.players {
            let Some(&eid) = maps.players.get(&p.eid) else {
                continue;
            };
            if Some(eid) == my_client_eid {
                continue;
            }
            let prev = self
                .index
                .players
                .get(&p.eid)
                .map(|&i| (from.snapshot.players[i].x, from.snapshot.players[i].y))
                .unwrap_or((p.x, p.y));
            if let Some(pos) = world.positions.get_mut(&eid) {
                pos.prev_x = prev.0;
                pos.prev_y = prev.1;
                pos.x = p.x;
                pos.y = p.y;
            }
            let prev_z = self
                .index
                .players
                .get(&p.eid)
                .map(|&i| from.snapshot.players[i].z)
                .unwrap_or(p.z);
            if let Some(z) = world.z_positions.get_mut(&eid) {
                z.z = prev_z + (p.z - prev_z) * alpha;
            }
        }

        for b in &to.snapshot.bullets {
            let Some(&eid) = maps.bullets.get(&b.eid) else {
                continue;
            };
            if tracker.is_local_timeline(eid) {
                continue;
            }
            let prev = self
                .index
                .bullets
                .get(&b.eid)
                .map(|&i| (from.snapshot.bullets[i].x, from.snapshot.bullets[i].y))
                .unwrap_or((b.x, b.y));
            if let Some(pos) = world.positions.get_mut(&eid) {
                pos.prev_x = prev.0;
                pos.prev_y = prev.1;
                pos.x = b.x;
                pos.y = b.y;
            }
        }

        for e in &to.snapshot.enemies {
            let Some(&eid) = maps.enemies.get(&e.eid) else {
                continue;
            };
            let prev = self
                .index
                .enemies
                .get(&e.eid)
                .map(|&i| (from.snapshot.enemies[i].x, from.snapshot.enemies[i].y))
                .unwrap_or((e.x, e.y));
            if let Some(pos) = world.positions.get_mut(&eid) {
                pos.prev_x = prev.0;
                pos.prev_y = prev.1;
                pos.x = e.x;
                pos.y = e.y;
            }
        }

        alpha
    }

    fn rebuild_index(&mut self, snapshot: &WorldSnapshot) {
        self.index.players.clear();
        for (i, p) in snapshot.players.iter().enumerate() {
            self.index.players.insert(p.eid, i);
        }
        self.index.bullets.clear();
        for (i, b) in snapshot.bullets.iter().enumerate() {
            self.index.bullets.insert(b.eid, i);
        }
        self.index.enemies.clear();
        for (i, e) in snapshot.enemies.iter().enumerate() {
            self.index.enemies.insert(e.eid, i);
        }
    }
}

fn round_tick(from_tick: u32, to_tick: u32, alpha: f32) -> u32 {
    let interpolated = from_tick as f64 + (to_tick as f64 - from_tick as f64) * alpha as f64;
    interpolated.round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::PlayerSnapshot;
    use crate::world::Position;

    fn player_snapshot(eid: u16, x: f32, y: f32) -> PlayerSnapshot {
        PlayerSnapshot {
            eid,
            x,
            y,
            z: 0.0,
            z_velocity: 0.0,
            aim_angle: 0.0,
            state: 0,
            hp: 100,
            flags: 0,
            last_processed_seq: 0,
            roll_elapsed_ms: 0,
            roll_duration_ms: 0,
            roll_dir_x: 0.0,
            roll_dir_y: 0.0,
            showdown_active: 0,
            showdown_target_eid: 0,
        }
    }

    #[test]
    fn remote_player_is_interpolated_local_is_not() {
        let mut world = World::new();
        let local_eid = world.alloc_eid();
        let remote_eid = world.alloc_eid();
        world.positions.insert(local_eid, Position::at(5.0, 5.0));
        world.positions.insert(remote_eid, Position::at(0.0, 0.0));

        let mut maps = IdMaps::default();
        maps.players.insert(1, local_eid);
        maps.players.insert(2, remote_eid);

        let mut from_snap = WorldSnapshot::new(1, 1000.0);
        from_snap.players.push(player_snapshot(2, 0.0, 0.0));
        let from = SnapshotEntry {
            snapshot: from_snap,
            receive_time_local: 1000.0,
            server_time: 1000.0,
        };

        let mut to_snap = WorldSnapshot::new(2, 1050.0);
        to_snap.players.push(player_snapshot(2, 10.0, 0.0));
        let to = SnapshotEntry {
            snapshot: to_snap,
            receive_time_local: 1050.0,
            server_time: 1050.0,
        };

        let mut applier = RemoteInterpolationApplier::new();
        let tracker = PredictedEntityTracker::new();
        applier.apply(&mut world, &from, &to, 0.5, &maps, Some(local_eid), &tracker);

        let local_pos = world.positions[&local_eid];
        assert_eq!((local_pos.x, local_pos.y), (5.0, 5.0));

        let remote_pos = world.positions[&remote_eid];
        assert_eq!(remote_pos.x, 10.0);
        assert_eq!(remote_pos.prev_x, 0.0);
    }
}
