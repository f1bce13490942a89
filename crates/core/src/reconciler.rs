//! Rewind-and-replay reconciliation of the local player against authoritative
//! snapshots, plus the exponential decay that turns small corrections into a
//! smooth visual nudge instead of a pop.

use crate::event::GameplayEventSink;
use crate::input_buffer::InputBuffer;
use crate::protocol::PlayerSnapshot;
use crate::tick::LocalPlayerDriver;
use crate::world::{Eid, Jump, PlayerStateKind, Roll, Showdown, World};

pub const DEFAULT_EPSILON: f32 = 0.5;
pub const DEFAULT_SNAP_THRESHOLD: f32 = 96.0;
pub const DEFAULT_CORRECTION_SPEED: f32 = 15.0;
/// How long the `Landing` pose holds once entered from a fresh snapshot read.
/// Not specified numerically upstream; chosen to read as a brief recovery
/// beat rather than an instant return to `Idle`.
pub const JUMP_LANDING_DURATION: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReconcileSample {
    pub had_correction: bool,
    pub correction_magnitude: f32,
    pub snapped: bool,
}

#[derive(Debug)]
pub struct Reconciler {
    previous_hp: Option<i32>,
    error_x: f32,
    error_y: f32,
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl Reconciler {
    pub fn new() -> Self {
        Self {
            previous_hp: None,
            error_x: 0.0,
            error_y: 0.0,
        }
    }

    pub fn error(&self) -> (f32, f32) {
        (self.error_x, self.error_y)
    }

    /// Exponentially decays the residual visual error toward zero, snapping
    /// components below 0.1 px to exactly zero so it never lingers forever.
    pub fn decay_error(&mut self, raw_dt: f32, correction_speed: f32) {
        let factor = 1.0 - (-correction_speed * raw_dt.min(0.1)).exp();
        self.error_x -= self.error_x * factor;
        self.error_y -= self.error_y * factor;
        if self.error_x.abs() < 0.1 {
            self.error_x = 0.0;
        }
        if self.error_y.abs() < 0.1 {
            self.error_y = 0.0;
        }
    }

    /// Rewinds the local player to the snapshot's authoritative state, replays
    /// pending inputs, and folds the resulting misprediction into the
    /// residual error vector (or discards it as a snap if too large).
    #[allow(clippy::too_many_arguments)]
    pub fn reconcile(
        &mut self,
        snapshot_players: &[PlayerSnapshot],
        world: &mut World,
        input_buffer: &mut InputBuffer,
        replay_driver: &LocalPlayerDriver,
        my_server_eid: u16,
        my_client_eid: Eid,
        epsilon: f32,
        snap_threshold: f32,
        sink: &mut dyn GameplayEventSink,
    ) -> ReconcileSample {
        let Some(record) = snapshot_players.iter().find(|p| p.eid == my_server_eid) else {
            return ReconcileSample::default();
        };

        let hp = record.hp as i32;
        if let Some(prev_hp) = self.previous_hp {
            if hp < prev_hp {
                let (dx, dy) = world
                    .last_player_hit_dir
                    .get(&my_client_eid)
                    .copied()
                    .unwrap_or((0.0, 0.0));
                sink.push(crate::event::GameEvent::PlayerHit {
                    eid: my_client_eid,
                    dir_x: dx,
                    dir_y: dy,
                });
                if let Some(health) = world.healths.get_mut(&my_client_eid) {
                    health.iframes = health.iframe_duration;
                }
            }
        }
        self.previous_hp = Some(hp);

        let old = world
            .positions
            .get(&my_client_eid)
            .map(|p| (p.x, p.y))
            .unwrap_or((0.0, 0.0));

        // State excluded from replay: weapon/ability edge state and
        // fire-cooldown must survive reconciliation untouched, since replay
        // only runs movement systems and must not re-trigger these.
        let saved_fire_cooldown = world.cylinders.get(&my_client_eid).map(|c| c.fire_cooldown);
        let saved_shoot_edge = world.players.get(&my_client_eid).map(|p| p.shoot_was_down);
        let saved_ability_edge = world.players.get(&my_client_eid).map(|p| p.ability_was_down);
        let saved_showdown = world.showdowns.get(&my_client_eid).copied();

        self.rewind(world, my_client_eid, record);

        input_buffer.acknowledge_up_to(record.last_processed_seq);
        let pending: Vec<_> = input_buffer.pending().to_vec();
        let mut null_sink = crate::event::NullSink;
        replay_driver.replay(world, my_client_eid, &pending, &mut null_sink);
        let _ = &mut null_sink;

        if let Some(cooldown) = saved_fire_cooldown {
            if let Some(c) = world.cylinders.get_mut(&my_client_eid) {
                c.fire_cooldown = cooldown;
            }
        }
        if let Some(edge) = saved_shoot_edge {
            if let Some(p) = world.players.get_mut(&my_client_eid) {
                p.shoot_was_down = edge;
            }
        }
        if let Some(edge) = saved_ability_edge {
            if let Some(p) = world.players.get_mut(&my_client_eid) {
                p.ability_was_down = edge;
            }
        }
        if let Some(showdown) = saved_showdown {
            world.showdowns.insert(my_client_eid, showdown);
        } else {
            world.showdowns.remove(&my_client_eid);
        }

        let new = world
            .positions
            .get(&my_client_eid)
            .map(|p| (p.x, p.y))
            .unwrap_or((0.0, 0.0));

        let dx = old.0 - new.0;
        let dy = old.1 - new.1;
        let magnitude = (dx * dx + dy * dy).sqrt();
        let had_correction = magnitude > epsilon;

        let mut snapped = false;
        if had_correction {
            let candidate_x = self.error_x + dx;
            let candidate_y = self.error_y + dy;
            let candidate_mag = (candidate_x * candidate_x + candidate_y * candidate_y).sqrt();
            if candidate_mag > snap_threshold {
                self.error_x = 0.0;
                self.error_y = 0.0;
                snapped = true;
            } else {
                self.error_x = candidate_x;
                self.error_y = candidate_y;
            }
        }

        ReconcileSample {
            had_correction,
            correction_magnitude: magnitude,
            snapped,
        }
    }

    fn rewind(&self, world: &mut World, eid: Eid, record: &PlayerSnapshot) {
        if let Some(pos) = world.positions.get_mut(&eid) {
            pos.prev_x = record.x;
            pos.prev_y = record.y;
            pos.x = record.x;
            pos.y = record.y;
        }
        world.velocities.insert(eid, Default::default());
        world.z_positions.insert(
            eid,
            crate::world::ZPosition {
                z: record.z,
                z_velocity: record.z_velocity,
            },
        );

        let kind = match record.state {
            1 => PlayerStateKind::Moving,
            2 => PlayerStateKind::Rolling,
            3 => PlayerStateKind::Jumping,
            4 => PlayerStateKind::Landing,
            _ => PlayerStateKind::Idle,
        };
        world
            .player_states
            .insert(eid, crate::world::PlayerState { kind });

        if kind == PlayerStateKind::Rolling {
            let (dir_x, dir_y) = if record.roll_dir_x == 0.0 && record.roll_dir_y == 0.0 {
                let aim = world.players.get(&eid).map(|p| p.aim_angle).unwrap_or(0.0);
                (aim.cos(), aim.sin())
            } else {
                (record.roll_dir_x, record.roll_dir_y)
            };
            world.rolls.insert(
                eid,
                Roll {
                    duration_ms: record.roll_duration_ms,
                    elapsed_ms: record.roll_elapsed_ms,
                    dir_x,
                    dir_y,
                },
            );
        } else {
            world.rolls.remove(&eid);
        }

        let was_landing = world
            .jumps
            .get(&eid)
            .is_some_and(|j| j.landing_timer > 0.0);
        if kind == PlayerStateKind::Landing {
            let landing_timer = if was_landing {
                world.jumps[&eid].landing_timer
            } else {
                JUMP_LANDING_DURATION
            };
            world.jumps.insert(
                eid,
                Jump {
                    landed: true,
                    landing_timer,
                    buffer_timer: 0.0,
                },
            );
        } else {
            world.jumps.remove(&eid);
            if let Some(z) = world.z_positions.get_mut(&eid) {
                z.z = 0.0;
                z.z_velocity = 0.0;
            }
        }

        if let Some(player) = world.players.get_mut(&eid) {
            player.aim_angle = record.aim_angle;
            player.roll_button_was_down = record.flag(PlayerSnapshot::FLAG_ROLL_EDGE);
            player.jump_button_was_down = record.flag(PlayerSnapshot::FLAG_JUMP_EDGE);
        }

        if record.showdown_active != 0 {
            world.showdowns.insert(
                eid,
                Showdown {
                    active: true,
                    target_eid: None,
                    duration: 0.0,
                    cooldown: 0.0,
                },
            );
        }

        if record.flag(PlayerSnapshot::FLAG_DEAD) {
            world.dead.insert(eid, crate::world::Dead);
        } else {
            world.dead.remove(&eid);
        }
        if record.flag(PlayerSnapshot::FLAG_INVINCIBLE) {
            world.invincible.insert(eid, crate::world::Invincible);
        } else {
            world.invincible.remove(&eid);
        }

        if let Some(health) = world.healths.get_mut(&eid) {
            health.current = record.hp as i32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::NullSink;
    use crate::tick::{LocalPlayerDriver, SystemRegistry};
    use crate::world::Position;

    fn snapshot(eid: u16, x: f32, y: f32, last_processed_seq: u32) -> PlayerSnapshot {
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
            last_processed_seq,
            roll_elapsed_ms: 0,
            roll_duration_ms: 0,
            roll_dir_x: 0.0,
            roll_dir_y: 0.0,
            showdown_active: 0,
            showdown_target_eid: 0,
        }
    }

    #[test]
    fn small_misprediction_accumulates_and_decays() {
        let mut world = World::new();
        let eid = world.alloc_eid();
        world.positions.insert(eid, Position::at(200.0, 200.0));
        world
            .healths
            .insert(eid, crate::world::Health { current: 100, max: 100, iframes: 0.0, iframe_duration: 0.0 });

        let mut reconciler = Reconciler::new();
        let mut buffer = InputBuffer::new();
        let driver = LocalPlayerDriver::new(SystemRegistry::new());
        let mut sink = NullSink;

        let sample = reconciler.reconcile(
            &[snapshot(1, 190.0, 200.0, 0)],
            &mut world,
            &mut buffer,
            &driver,
            1,
            eid,
            DEFAULT_EPSILON,
            DEFAULT_SNAP_THRESHOLD,
            &mut sink,
        );

        assert!(sample.had_correction);
        assert!(!sample.snapped);
        assert!((sample.correction_magnitude - 10.0).abs() < 1e-3);

        for _ in 0..10 {
            reconciler.decay_error(0.1, DEFAULT_CORRECTION_SPEED);
        }
        let (ex, ey) = reconciler.error();
        assert!(ex.abs() < 0.1);
        assert_eq!(ey, 0.0);
    }

    #[test]
    fn large_misprediction_snaps() {
        let mut world = World::new();
        let eid = world.alloc_eid();
        world.positions.insert(eid, Position::at(200.0, 200.0));

        let mut reconciler = Reconciler::new();
        let mut buffer = InputBuffer::new();
        let driver = LocalPlayerDriver::new(SystemRegistry::new());
        let mut sink = NullSink;

        let sample = reconciler.reconcile(
            &[snapshot(1, 50.0, 200.0, 0)],
            &mut world,
            &mut buffer,
            &driver,
            1,
            eid,
            DEFAULT_EPSILON,
            DEFAULT_SNAP_THRESHOLD,
            &mut sink,
        );

        assert!(sample.snapped);
        assert_eq!(reconciler.error(), (0.0, 0.0));
    }

    #[test]
    fn missing_local_player_is_a_no_op() {
        let mut world = World::new();
        let eid = world.alloc_eid();
        world.positions.insert(eid, Position::at(0.0, 0.0));

        let mut reconciler = Reconciler::new();
        let mut buffer = InputBuffer::new();
        let driver = LocalPlayerDriver::new(SystemRegistry::new());
        let mut sink = NullSink;

        let sample = reconciler.reconcile(
            &[],
            &mut world,
            &mut buffer,
            &driver,
            1,
            eid,
            DEFAULT_EPSILON,
            DEFAULT_SNAP_THRESHOLD,
            &mut sink,
        );
        assert_eq!(sample, ReconcileSample::default());
    }
}
