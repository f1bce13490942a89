//! Predicted-bullet lifecycle: local spawns are tentatively tracked until a
//! matching server bullet adopts their eid, or they time out.

use std::collections::{HashMap, HashSet};

use crate::protocol::BulletSnapshot;
use crate::world::{CollisionLayer, Eid, World};

/// Reference speed used to scale the adoption tolerance by half-RTT travel
/// distance; matches the slowest hitscan-adjacent projectile in the game.
pub const PISTOL_BULLET_SPEED: f32 = 900.0;
pub const PREDICTED_BULLET_TIMEOUT_TICKS: u32 = 30;
const BASE_TOLERANCE_PX: f32 = 40.0;
const MAX_RTT_TOLERANCE_PX: f32 = 120.0;
const FALLBACK_TOLERANCE_PX: f32 = 180.0;

#[derive(Debug, Default)]
pub struct PredictedEntityTracker {
    predicted_bullets: HashSet<Eid>,
    spawn_tick: HashMap<Eid, u32>,
    local_timeline_bullets: HashSet<Eid>,
    server_bullet_client_eids: HashSet<Eid>,
}

impl PredictedEntityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_predicted(&self, eid: Eid) -> bool {
        self.predicted_bullets.contains(&eid)
    }

    pub fn is_local_timeline(&self, eid: Eid) -> bool {
        self.local_timeline_bullets.contains(&eid)
    }

    pub fn mark_server_bullet(&mut self, eid: Eid) {
        self.server_bullet_client_eids.insert(eid);
    }

    /// Marks `eid` local-timeline independent of the adoption path — the
    /// local player's own bullets always render at present time, even one
    /// the ingestor created fresh (no matching prediction was found) rather
    /// than adopted from an existing predicted entity.
    pub fn mark_local_timeline(&mut self, eid: Eid) {
        self.local_timeline_bullets.insert(eid);
    }

    /// Scans all bullets for ones freshly spawned by local prediction and not
    /// already tracked. Returns the number newly tracked.
    pub fn detect_new_predicted_bullets(
        &mut self,
        world: &World,
        my_client_eid: Eid,
        prediction_tick: u32,
    ) -> usize {
        let mut added = 0;
        for (&eid, bullet) in world.bullets.iter() {
            if bullet.owner_id != Some(my_client_eid) {
                continue;
            }
            let Some(collider) = world.colliders.get(&eid) else {
                continue;
            };
            if collider.layer != CollisionLayer::PlayerBullet {
                continue;
            }
            if self.predicted_bullets.contains(&eid) || self.server_bullet_client_eids.contains(&eid) {
                continue;
            }
            self.predicted_bullets.insert(eid);
            self.spawn_tick.insert(eid, prediction_tick);
            self.local_timeline_bullets.insert(eid);
            added += 1;
        }
        added
    }

    /// `rtt_ms` scales the primary tolerance: faster round-trips mean less
    /// drift between prediction and authoritative arrival, so the window can
    /// be tighter.
    pub fn find_matching_predicted_bullet(
        &self,
        world: &World,
        b: &BulletSnapshot,
        rtt_ms: f32,
    ) -> Option<Eid> {
        let primary_tolerance = BASE_TOLERANCE_PX
            + (rtt_ms / 2.0 * PISTOL_BULLET_SPEED / 1000.0).min(MAX_RTT_TOLERANCE_PX);

        let mut best: Option<(Eid, f32)> = None;
        for &eid in &self.predicted_bullets {
            let Some(pos) = world.positions.get(&eid) else {
                continue;
            };
            let dx = pos.x - b.x;
            let dy = pos.y - b.y;
            let dist = (dx * dx + dy * dy).sqrt();
            if best.is_none_or(|(_, best_dist)| dist < best_dist) {
                best = Some((eid, dist));
            }
        }

        let (eid, dist) = best?;
        if dist <= primary_tolerance || dist <= FALLBACK_TOLERANCE_PX {
            Some(eid)
        } else {
            None
        }
    }

    pub fn adopt_matched_predicted_bullet(&mut self, eid: Eid) {
        self.predicted_bullets.remove(&eid);
        self.spawn_tick.remove(&eid);
        self.local_timeline_bullets.insert(eid);
    }

    /// Destroys predicted bullets that have gone unmatched past the timeout.
    /// Returns the number removed.
    pub fn cleanup_predicted_bullets(&mut self, world: &mut World, prediction_tick: u32) -> usize {
        let expired: Vec<Eid> = self
            .spawn_tick
            .iter()
            .filter(|(_, &spawn)| prediction_tick.wrapping_sub(spawn) > PREDICTED_BULLET_TIMEOUT_TICKS)
            .map(|(&eid, _)| eid)
            .collect();

        for &eid in &expired {
            self.predicted_bullets.remove(&eid);
            self.spawn_tick.remove(&eid);
            self.local_timeline_bullets.remove(&eid);
            world.despawn(eid);
        }
        expired.len()
    }

    pub fn clear(&mut self, world: &mut World) {
        for &eid in self.predicted_bullets.iter() {
            world.despawn(eid);
        }
        self.predicted_bullets.clear();
        self.spawn_tick.clear();
        self.local_timeline_bullets.clear();
        self.server_bullet_client_eids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Bullet, Collider, Position};

    fn spawn_predicted(world: &mut World, owner: Eid, x: f32, y: f32) -> Eid {
        let eid = world.alloc_eid();
        world.positions.insert(eid, Position::at(x, y));
        world.bullets.insert(
            eid,
            Bullet {
                owner_id: Some(owner),
                ..Default::default()
            },
        );
        world.colliders.insert(
            eid,
            Collider {
                radius: 2,
                layer: CollisionLayer::PlayerBullet,
            },
        );
        eid
    }

    #[test]
    fn detects_and_matches_predicted_bullet() {
        let mut world = World::new();
        let my_eid = world.alloc_eid();
        let bullet_eid = spawn_predicted(&mut world, my_eid, 100.0, 100.0);

        let mut tracker = PredictedEntityTracker::new();
        let added = tracker.detect_new_predicted_bullets(&world, my_eid, 0);
        assert_eq!(added, 1);
        assert!(tracker.is_predicted(bullet_eid));

        let snap = BulletSnapshot {
            eid: 1,
            owner_eid: 1,
            x: 104.0,
            y: 98.0,
            vx: 0.0,
            vy: 0.0,
            layer: 1,
        };
        let matched = tracker.find_matching_predicted_bullet(&world, &snap, 100.0);
        assert_eq!(matched, Some(bullet_eid));

        tracker.adopt_matched_predicted_bullet(bullet_eid);
        assert!(!tracker.is_predicted(bullet_eid));
        assert!(tracker.is_local_timeline(bullet_eid));
    }

    #[test]
    fn mark_local_timeline_applies_without_adoption() {
        let mut tracker = PredictedEntityTracker::new();
        let eid = Eid(5);
        assert!(!tracker.is_local_timeline(eid));
        tracker.mark_local_timeline(eid);
        assert!(tracker.is_local_timeline(eid));
    }

    #[test]
    fn unmatched_bullet_expires_after_timeout() {
        let mut world = World::new();
        let my_eid = world.alloc_eid();
        let bullet_eid = spawn_predicted(&mut world, my_eid, 0.0, 0.0);

        let mut tracker = PredictedEntityTracker::new();
        tracker.detect_new_predicted_bullets(&world, my_eid, 0);

        let removed = tracker.cleanup_predicted_bullets(&mut world, 30);
        assert_eq!(removed, 0);
        assert!(world.bullets.contains_key(&bullet_eid));

        let removed = tracker.cleanup_predicted_bullets(&mut world, 31);
        assert_eq!(removed, 1);
        assert!(!world.bullets.contains_key(&bullet_eid));
    }

    #[test]
    fn distant_bullet_does_not_match() {
        let mut world = World::new();
        let my_eid = world.alloc_eid();
        spawn_predicted(&mut world, my_eid, 0.0, 0.0);

        let mut tracker = PredictedEntityTracker::new();
        tracker.detect_new_predicted_bullets(&world, my_eid, 0);

        let snap = BulletSnapshot {
            eid: 1,
            owner_eid: 1,
            x: 1000.0,
            y: 1000.0,
            vx: 0.0,
            vy: 0.0,
            layer: 1,
        };
        assert_eq!(tracker.find_matching_predicted_bullet(&world, &snap, 0.0), None);
    }
}
