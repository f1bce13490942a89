//! Applies an authoritative [`WorldSnapshot`] onto the local ECS world:
//! server→client eid mapping, entity birth/update/death, and predicted-bullet
//! adoption. This is the seam where the two eid spaces meet.

use crate::event::GameplayEventSink;
use crate::interpolation::IdMaps;
use crate::protocol::{BulletSnapshot, EnemySnapshot, PlayerSnapshot, WorldSnapshot};
use crate::tracker::PredictedEntityTracker;
use crate::world::{
    Collider, CollisionLayer, Cylinder, Dead, Enemy, EnemyAi, Health, Invincible, MeleeWeapon,
    Player, PlayerState, PlayerStateKind, Position, Showdown, Velocity, Weapon, World, ZPosition,
};
use crate::world::Eid;

/// Resolves which character a remote player is using. Falls back to the
/// last-known id (or a default) when a player appears in a snapshot before
/// the roster message names their character — see the open question this
/// resolves in the design notes.
pub type CharacterResolver = fn(&RosterTable, u16) -> u16;

pub const DEFAULT_CHARACTER_ID: u16 = 0;

#[derive(Debug, Default)]
pub struct RosterTable {
    entries: std::collections::HashMap<u16, u16>,
}

impl RosterTable {
    pub fn set(&mut self, server_eid: u16, character_id: u16) {
        self.entries.insert(server_eid, character_id);
    }

    pub fn get(&self, server_eid: u16) -> Option<u16> {
        self.entries.get(&server_eid).copied()
    }
}

pub fn default_character_resolver(roster: &RosterTable, server_eid: u16) -> u16 {
    roster.get(server_eid).unwrap_or(DEFAULT_CHARACTER_ID)
}

/// Which component set a character's first-sight attachment uses. Content
/// (which character ids are ranged vs. melee) is external per spec.md §1's
/// Non-goals; this closed enum plus the resolver function type below is the
/// seam a gameplay layer wires a real character table through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterClass {
    Ranged,
    Melee,
}

pub type CharacterClassResolver = fn(u16) -> CharacterClass;

/// Default resolver used until a gameplay layer supplies character content:
/// every character is ranged.
pub fn default_character_class_resolver(_character_id: u16) -> CharacterClass {
    CharacterClass::Ranged
}

/// Per-run multiplier/bonus applied when seeding the local player's weapon
/// and health stats at first sight, per spec.md §4.4 step 1's "seed stats
/// from the local upgrade state". Upgrade trees themselves are content
/// (spec.md §1 Non-goals); this trait is only the seam the core reads.
pub trait LocalUpgradeState {
    fn max_health_bonus(&self) -> i32 {
        0
    }
    fn bullet_damage_multiplier(&self) -> f32 {
        1.0
    }
    fn max_rounds_bonus(&self) -> u8 {
        0
    }
}

/// No upgrades applied — the default until a gameplay layer supplies a real
/// upgrade-tree implementation.
#[derive(Debug, Default)]
pub struct NoUpgrades;

impl LocalUpgradeState for NoUpgrades {}

const DEFAULT_CYLINDER_ROUNDS: u8 = 6;
const DEFAULT_RELOAD_TIME: f32 = 1.5;
const DEFAULT_BULLET_SPEED: f32 = crate::tracker::PISTOL_BULLET_SPEED;
const DEFAULT_BULLET_DAMAGE: f32 = 10.0;
const DEFAULT_BULLET_RANGE: f32 = 600.0;
const DEFAULT_FIRE_RATE: f32 = 3.0;
const DEFAULT_MELEE_DAMAGE: f32 = 25.0;
const DEFAULT_MELEE_RANGE: f32 = 48.0;
const DEFAULT_MELEE_SWING_RATE: f32 = 1.5;

/// Counters the ingestor's caller folds into [`crate::telemetry::MultiplayerTelemetry`]:
/// entities overwritten by an already-mapped snapshot record, and predicted
/// bullets matched/timed-out this call, per spec.md §4.10.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub entity_overwrites: u64,
    pub bullets_matched: u64,
    pub bullets_timed_out: u64,
}

/// Per-entity-kind bidirectional server↔client eid maps, the local identity,
/// and everything else the ingestor needs across calls.
pub struct IngestContext<'a> {
    pub world: &'a mut World,
    pub maps: &'a mut IdMaps,
    pub reverse_players: &'a mut std::collections::HashMap<Eid, u16>,
    pub reverse_bullets: &'a mut std::collections::HashMap<Eid, u16>,
    pub reverse_enemies: &'a mut std::collections::HashMap<Eid, u16>,
    pub tracker: &'a mut PredictedEntityTracker,
    pub my_server_eid: u16,
    pub my_client_eid: &'a mut Option<Eid>,
    pub roster: &'a RosterTable,
    pub local_character_id: u16,
    pub character_resolver: CharacterResolver,
    pub character_class_resolver: CharacterClassResolver,
    pub local_upgrade_state: &'a dyn LocalUpgradeState,
    pub current_rtt_ms: f32,
    /// Most recent server-reported HP per client eid, for the optimistic
    /// enemy-damage rule.
    pub last_enemy_server_hp: &'a mut std::collections::HashMap<Eid, u16>,
    pub last_enemy_server_time: &'a mut std::collections::HashMap<Eid, f64>,
}

#[derive(Debug, Default)]
pub struct SnapshotIngestor;

impl SnapshotIngestor {
    pub fn new() -> Self {
        Self
    }

    pub fn apply(
        &self,
        snapshot: &WorldSnapshot,
        ctx: &mut IngestContext,
        sink: &mut dyn GameplayEventSink,
    ) -> IngestStats {
        let mut stats = IngestStats::default();
        self.apply_players(snapshot, ctx, sink, &mut stats);
        self.apply_bullets(snapshot, ctx, &mut stats);
        self.apply_enemies(snapshot, ctx, &mut stats);
        self.apply_derived(snapshot, ctx);

        let timed_out = ctx
            .tracker
            .cleanup_predicted_bullets(ctx.world, snapshot.tick);
        stats.bullets_timed_out += timed_out as u64;
        stats
    }

    fn apply_players(
        &self,
        snapshot: &WorldSnapshot,
        ctx: &mut IngestContext,
        sink: &mut dyn GameplayEventSink,
        stats: &mut IngestStats,
    ) {
        let mut seen = std::collections::HashSet::new();

        for p in &snapshot.players {
            seen.insert(p.eid);
            let is_local = p.eid == ctx.my_server_eid;

            let mut just_created = false;
            let client_eid = match ctx.maps.players.get(&p.eid).copied() {
                Some(eid) => {
                    stats.entity_overwrites += 1;
                    eid
                }
                None => {
                    just_created = true;
                    let eid = ctx.world.alloc_eid();
                    ctx.world.positions.insert(eid, Position::at(p.x, p.y));
                    ctx.world.velocities.insert(eid, Velocity::default());
                    ctx.world.players.insert(eid, Player::default());
                    ctx.world
                        .player_states
                        .insert(eid, PlayerState::default());
                    ctx.world.colliders.insert(
                        eid,
                        Collider {
                            radius: 16,
                            layer: CollisionLayer::Player,
                        },
                    );
                    ctx.world.healths.insert(
                        eid,
                        Health {
                            current: p.hp as i32,
                            max: p.hp as i32,
                            iframes: 0.0,
                            iframe_duration: 0.5,
                        },
                    );
                    ctx.maps.players.insert(p.eid, eid);
                    ctx.reverse_players.insert(eid, p.eid);

                    if is_local {
                        *ctx.my_client_eid = Some(eid);
                    }
                    eid
                }
            };

            let character_id = if is_local {
                ctx.local_character_id
            } else {
                (ctx.character_resolver)(ctx.roster, p.eid)
            };
            ctx.world.player_characters.insert(client_eid, character_id);

            if is_local && just_created {
                attach_local_character_components(ctx, client_eid, character_id);
            }

            if !is_local {
                if let Some(player) = ctx.world.players.get_mut(&client_eid) {
                    player.aim_angle = p.aim_angle;
                }
                let kind = player_state_kind_from_u8(p.state);
                ctx.world
                    .player_states
                    .insert(client_eid, PlayerState { kind });
                ctx.world.z_positions.insert(
                    client_eid,
                    ZPosition {
                        z: p.z,
                        z_velocity: p.z_velocity,
                    },
                );
                if p.showdown_active != 0 {
                    let target = ctx.maps.players.get(&p.showdown_target_eid).copied();
                    ctx.world.showdowns.insert(
                        client_eid,
                        Showdown {
                            active: true,
                            target_eid: target,
                            duration: 0.0,
                            cooldown: 0.0,
                        },
                    );
                } else {
                    ctx.world.showdowns.remove(&client_eid);
                }
            }

            if let Some(health) = ctx.world.healths.get_mut(&client_eid) {
                if (p.hp as i32) < health.current {
                    health.iframes = health.iframe_duration;
                }
                health.current = p.hp as i32;
            }

            if p.flag(PlayerSnapshot::FLAG_DEAD) {
                ctx.world.dead.insert(client_eid, Dead);
            } else {
                ctx.world.dead.remove(&client_eid);
            }
            if p.flag(PlayerSnapshot::FLAG_INVINCIBLE) {
                ctx.world.invincible.insert(client_eid, Invincible);
            } else {
                ctx.world.invincible.remove(&client_eid);
            }
        }

        let stale: Vec<u16> = ctx
            .maps
            .players
            .keys()
            .filter(|server_eid| !seen.contains(server_eid))
            .copied()
            .collect();
        for server_eid in stale {
            if let Some(eid) = ctx.maps.players.remove(&server_eid) {
                ctx.reverse_players.remove(&eid);
                ctx.world.despawn(eid);
                if *ctx.my_client_eid == Some(eid) {
                    *ctx.my_client_eid = None;
                    ctx.tracker.clear(ctx.world);
                    sink.push(crate::event::GameEvent::Disconnect);
                }
            }
        }
    }

    fn apply_bullets(&self, snapshot: &WorldSnapshot, ctx: &mut IngestContext, stats: &mut IngestStats) {
        let mut seen = std::collections::HashSet::new();

        for b in &snapshot.bullets {
            seen.insert(b.eid);
            let owner_client_eid = resolve_owner(b, ctx);

            let client_eid = match ctx.maps.bullets.get(&b.eid).copied() {
                Some(eid) => {
                    stats.entity_overwrites += 1;
                    eid
                }
                None => {
                    let layer = CollisionLayer::from_u8(b.layer);
                    let adopted = if layer == CollisionLayer::PlayerBullet {
                        ctx.tracker
                            .find_matching_predicted_bullet(ctx.world, b, ctx.current_rtt_ms)
                    } else {
                        None
                    };

                    let eid = if let Some(adopted_eid) = adopted {
                        ctx.tracker.adopt_matched_predicted_bullet(adopted_eid);
                        stats.bullets_matched += 1;
                        adopted_eid
                    } else {
                        let eid = ctx.world.alloc_eid();
                        ctx.world.positions.insert(eid, Position::at(b.x, b.y));
                        ctx.world.bullets.insert(eid, crate::world::Bullet::default());
                        ctx.world.colliders.insert(
                            eid,
                            Collider {
                                radius: 3,
                                layer,
                            },
                        );
                        eid
                    };
                    ctx.tracker.mark_server_bullet(eid);
                    ctx.maps.bullets.insert(b.eid, eid);
                    ctx.reverse_bullets.insert(eid, b.eid);
                    eid
                }
            };

            if let Some(collider) = ctx.world.colliders.get_mut(&client_eid) {
                collider.layer = CollisionLayer::from_u8(b.layer);
            }
            if let Some(bullet) = ctx.world.bullets.get_mut(&client_eid) {
                bullet.owner_id = owner_client_eid;
            }
            if owner_client_eid.is_some() && owner_client_eid == *ctx.my_client_eid {
                ctx.tracker.mark_local_timeline(client_eid);
            }
            ctx.world
                .velocities
                .insert(client_eid, Velocity { x: b.vx, y: b.vy });
        }

        let stale: Vec<u16> = ctx
            .maps
            .bullets
            .keys()
            .filter(|server_eid| !seen.contains(server_eid))
            .copied()
            .collect();
        for server_eid in stale {
            if let Some(eid) = ctx.maps.bullets.remove(&server_eid) {
                ctx.reverse_bullets.remove(&eid);
                ctx.world.despawn(eid);
            }
        }
    }

    fn apply_enemies(&self, snapshot: &WorldSnapshot, ctx: &mut IngestContext, stats: &mut IngestStats) {
        let mut seen = std::collections::HashSet::new();

        for e in &snapshot.enemies {
            seen.insert(e.eid);
            let kind = crate::world::EnemyKind::from_u8(e.kind);

            let client_eid = match ctx.maps.enemies.get(&e.eid).copied() {
                Some(eid) => {
                    stats.entity_overwrites += 1;
                    eid
                }
                None => {
                    let eid = ctx.world.alloc_eid();
                    ctx.world.positions.insert(eid, Position::at(e.x, e.y));
                    ctx.world.velocities.insert(eid, Velocity::default());
                    ctx.world.enemies.insert(
                        eid,
                        Enemy {
                            kind,
                            tier: kind.default_tier(),
                        },
                    );
                    ctx.world.colliders.insert(
                        eid,
                        Collider {
                            radius: kind.default_radius(),
                            layer: CollisionLayer::Enemy,
                        },
                    );
                    ctx.world.healths.insert(
                        eid,
                        Health {
                            current: (e.hp as i32).max(1),
                            max: (e.hp as i32).max(1),
                            iframes: 0.0,
                            iframe_duration: 0.0,
                        },
                    );
                    ctx.maps.enemies.insert(e.eid, eid);
                    ctx.reverse_enemies.insert(eid, e.eid);
                    eid
                }
            };

            if let Some(pos) = ctx.world.positions.get(&client_eid).copied() {
                if let Some(prev_time) = ctx.last_enemy_server_time.get(&client_eid).copied() {
                    let dt = snapshot.server_time - prev_time;
                    if dt > 0.0 {
                        let vx = ((e.x - pos.x) / dt as f32).clamp(-4000.0, 4000.0);
                        let vy = ((e.y - pos.y) / dt as f32).clamp(-4000.0, 4000.0);
                        ctx.world
                            .velocities
                            .insert(client_eid, Velocity { x: vx, y: vy });
                    }
                }
            }
            if let Some(pos) = ctx.world.positions.get_mut(&client_eid) {
                pos.prev_x = pos.x;
                pos.prev_y = pos.y;
                pos.x = e.x;
                pos.y = e.y;
            }
            ctx.last_enemy_server_time
                .insert(client_eid, snapshot.server_time);

            let target = if e.target_eid == 0 {
                None
            } else {
                ctx.maps.players.get(&e.target_eid).copied()
            };
            ctx.world.enemy_ais.insert(
                client_eid,
                EnemyAi {
                    state: e.ai_state,
                    target_eid: target,
                    state_timer: ctx
                        .world
                        .enemy_ais
                        .get(&client_eid)
                        .map(|ai| ai.state_timer)
                        .unwrap_or(0.0),
                    initial_delay: ctx
                        .world
                        .enemy_ais
                        .get(&client_eid)
                        .map(|ai| ai.initial_delay)
                        .unwrap_or(0.0),
                },
            );

            let prev_server_hp = ctx.last_enemy_server_hp.get(&client_eid).copied();
            let local_hp = ctx
                .world
                .healths
                .get(&client_eid)
                .map(|h| h.current)
                .unwrap_or(e.hp as i32);
            let keep_local = prev_server_hp == Some(e.hp) && local_hp < e.hp as i32;
            if let Some(health) = ctx.world.healths.get_mut(&client_eid) {
                if !keep_local {
                    health.current = e.hp as i32;
                }
            }
            ctx.last_enemy_server_hp.insert(client_eid, e.hp);
        }

        let stale: Vec<u16> = ctx
            .maps
            .enemies
            .keys()
            .filter(|server_eid| !seen.contains(server_eid))
            .copied()
            .collect();
        for server_eid in stale {
            if let Some(eid) = ctx.maps.enemies.remove(&server_eid) {
                ctx.reverse_enemies.remove(&eid);
                ctx.last_enemy_server_hp.remove(&eid);
                ctx.last_enemy_server_time.remove(&eid);
                ctx.world.despawn(eid);
            }
        }
    }

    /// Zones/dynamites aren't tracked by persistent eid maps here: locally
    /// owned entries (owned by the local player, already predicted) are left
    /// alone, everything else is informational and owned by callers that
    /// read the snapshot directly rather than by ECS components.
    fn apply_derived(&self, _snapshot: &WorldSnapshot, _ctx: &mut IngestContext) {}
}

fn player_state_kind_from_u8(state: u8) -> PlayerStateKind {
    match state {
        1 => PlayerStateKind::Moving,
        2 => PlayerStateKind::Rolling,
        3 => PlayerStateKind::Jumping,
        4 => PlayerStateKind::Landing,
        _ => PlayerStateKind::Idle,
    }
}

/// Attaches the local player's weapon (and, for melee characters, the
/// health bump upgrades give) the first time their entity is created.
/// Remote players don't get these components: the core never simulates
/// their weapons locally, it only renders server-reported bullets/hits.
fn attach_local_character_components(ctx: &mut IngestContext, eid: Eid, character_id: u16) {
    let upgrades = ctx.local_upgrade_state;
    match (ctx.character_class_resolver)(character_id) {
        CharacterClass::Ranged => {
            ctx.world.cylinders.insert(
                eid,
                Cylinder {
                    rounds: DEFAULT_CYLINDER_ROUNDS + upgrades.max_rounds_bonus(),
                    max_rounds: DEFAULT_CYLINDER_ROUNDS + upgrades.max_rounds_bonus(),
                    reload_timer: 0.0,
                    reload_time: DEFAULT_RELOAD_TIME,
                    fire_cooldown: 0.0,
                    reloading: false,
                    first_shot_after_reload: false,
                },
            );
            ctx.world.weapons.insert(
                eid,
                Weapon {
                    bullet_speed: DEFAULT_BULLET_SPEED,
                    bullet_damage: DEFAULT_BULLET_DAMAGE * upgrades.bullet_damage_multiplier(),
                    range: DEFAULT_BULLET_RANGE,
                    fire_rate: DEFAULT_FIRE_RATE,
                    cooldown: 0.0,
                },
            );
        }
        CharacterClass::Melee => {
            ctx.world.melee_weapons.insert(
                eid,
                MeleeWeapon {
                    damage: DEFAULT_MELEE_DAMAGE * upgrades.bullet_damage_multiplier(),
                    range: DEFAULT_MELEE_RANGE,
                    swing_rate: DEFAULT_MELEE_SWING_RATE,
                    cooldown: 0.0,
                },
            );
        }
    }

    let bonus = upgrades.max_health_bonus();
    if bonus != 0 {
        if let Some(health) = ctx.world.healths.get_mut(&eid) {
            health.max += bonus;
            health.current += bonus;
        }
    }
}

fn resolve_owner(b: &BulletSnapshot, ctx: &IngestContext) -> Option<Eid> {
    if b.owner_eid == 0 {
        return None;
    }
    ctx.maps
        .players
        .get(&b.owner_eid)
        .or_else(|| ctx.maps.enemies.get(&b.owner_eid))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::NullSink;

    fn base_snapshot() -> WorldSnapshot {
        WorldSnapshot::new(1, 1000.0)
    }

    fn player(eid: u16, x: f32, y: f32, hp: u16) -> PlayerSnapshot {
        PlayerSnapshot {
            eid,
            x,
            y,
            z: 0.0,
            z_velocity: 0.0,
            aim_angle: 0.0,
            state: 0,
            hp,
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
    fn first_sight_of_local_player_establishes_identity() {
        let mut world = World::new();
        let mut maps = IdMaps::default();
        let mut reverse_players = std::collections::HashMap::new();
        let mut reverse_bullets = std::collections::HashMap::new();
        let mut reverse_enemies = std::collections::HashMap::new();
        let mut tracker = PredictedEntityTracker::new();
        let mut my_client_eid = None;
        let roster = RosterTable::default();
        let mut last_hp = std::collections::HashMap::new();
        let mut last_time = std::collections::HashMap::new();

        let mut snapshot = base_snapshot();
        snapshot.players.push(player(7, 1.0, 2.0, 100));

        let mut ctx = IngestContext {
            world: &mut world,
            maps: &mut maps,
            reverse_players: &mut reverse_players,
            reverse_bullets: &mut reverse_bullets,
            reverse_enemies: &mut reverse_enemies,
            tracker: &mut tracker,
            my_server_eid: 7,
            my_client_eid: &mut my_client_eid,
            roster: &roster,
            local_character_id: 3,
            character_resolver: default_character_resolver,
            character_class_resolver: default_character_class_resolver,
            local_upgrade_state: &NoUpgrades,
            current_rtt_ms: 50.0,
            last_enemy_server_hp: &mut last_hp,
            last_enemy_server_time: &mut last_time,
        };

        let ingestor = SnapshotIngestor::new();
        let mut sink = NullSink;
        ingestor.apply(&snapshot, &mut ctx, &mut sink);

        assert!(my_client_eid.is_some());
        let eid = my_client_eid.unwrap();
        assert_eq!(world.player_characters.get(&eid), Some(&3));
        assert_eq!(world.positions.get(&eid).unwrap().x, 1.0);
        assert!(world.weapons.contains_key(&eid));
        assert!(world.cylinders.contains_key(&eid));
        assert!(!world.melee_weapons.contains_key(&eid));
    }

    #[test]
    fn absent_player_is_despawned() {
        let mut world = World::new();
        let mut maps = IdMaps::default();
        let mut reverse_players = std::collections::HashMap::new();
        let mut reverse_bullets = std::collections::HashMap::new();
        let mut reverse_enemies = std::collections::HashMap::new();
        let mut tracker = PredictedEntityTracker::new();
        let mut my_client_eid = None;
        let roster = RosterTable::default();
        let mut last_hp = std::collections::HashMap::new();
        let mut last_time = std::collections::HashMap::new();
        let ingestor = SnapshotIngestor::new();
        let mut sink = NullSink;

        {
            let mut snapshot = base_snapshot();
            snapshot.players.push(player(2, 0.0, 0.0, 100));
            let mut ctx = IngestContext {
                world: &mut world,
                maps: &mut maps,
                reverse_players: &mut reverse_players,
                reverse_bullets: &mut reverse_bullets,
                reverse_enemies: &mut reverse_enemies,
                tracker: &mut tracker,
                my_server_eid: 7,
                my_client_eid: &mut my_client_eid,
                roster: &roster,
                local_character_id: 0,
                character_resolver: default_character_resolver,
                character_class_resolver: default_character_class_resolver,
                local_upgrade_state: &NoUpgrades,
                current_rtt_ms: 50.0,
                last_enemy_server_hp: &mut last_hp,
                last_enemy_server_time: &mut last_time,
            };
            ingestor.apply(&snapshot, &mut ctx, &mut sink);
        }
        assert_eq!(maps.players.len(), 1);

        {
            let snapshot = WorldSnapshot::new(2, 1016.0);
            let mut ctx = IngestContext {
                world: &mut world,
                maps: &mut maps,
                reverse_players: &mut reverse_players,
                reverse_bullets: &mut reverse_bullets,
                reverse_enemies: &mut reverse_enemies,
                tracker: &mut tracker,
                my_server_eid: 7,
                my_client_eid: &mut my_client_eid,
                roster: &roster,
                local_character_id: 0,
                character_resolver: default_character_resolver,
                character_class_resolver: default_character_class_resolver,
                local_upgrade_state: &NoUpgrades,
                current_rtt_ms: 50.0,
                last_enemy_server_hp: &mut last_hp,
                last_enemy_server_time: &mut last_time,
            };
            ingestor.apply(&snapshot, &mut ctx, &mut sink);
        }
        assert!(maps.players.is_empty());
    }

    fn melee_class_resolver(_character_id: u16) -> CharacterClass {
        CharacterClass::Melee
    }

    #[test]
    fn melee_character_gets_melee_weapon_not_cylinder() {
        let mut world = World::new();
        let mut maps = IdMaps::default();
        let mut reverse_players = std::collections::HashMap::new();
        let mut reverse_bullets = std::collections::HashMap::new();
        let mut reverse_enemies = std::collections::HashMap::new();
        let mut tracker = PredictedEntityTracker::new();
        let mut my_client_eid = None;
        let roster = RosterTable::default();
        let mut last_hp = std::collections::HashMap::new();
        let mut last_time = std::collections::HashMap::new();

        let mut snapshot = base_snapshot();
        snapshot.players.push(player(7, 1.0, 2.0, 100));

        let mut ctx = IngestContext {
            world: &mut world,
            maps: &mut maps,
            reverse_players: &mut reverse_players,
            reverse_bullets: &mut reverse_bullets,
            reverse_enemies: &mut reverse_enemies,
            tracker: &mut tracker,
            my_server_eid: 7,
            my_client_eid: &mut my_client_eid,
            roster: &roster,
            local_character_id: 9,
            character_resolver: default_character_resolver,
            character_class_resolver: melee_class_resolver,
            local_upgrade_state: &NoUpgrades,
            current_rtt_ms: 50.0,
            last_enemy_server_hp: &mut last_hp,
            last_enemy_server_time: &mut last_time,
        };

        let ingestor = SnapshotIngestor::new();
        let mut sink = NullSink;
        ingestor.apply(&snapshot, &mut ctx, &mut sink);

        let eid = my_client_eid.unwrap();
        assert!(world.melee_weapons.contains_key(&eid));
        assert!(!world.weapons.contains_key(&eid));
        assert!(!world.cylinders.contains_key(&eid));
    }

    #[test]
    fn apply_reports_overwrite_and_timeout_stats() {
        let mut world = World::new();
        let mut maps = IdMaps::default();
        let mut reverse_players = std::collections::HashMap::new();
        let mut reverse_bullets = std::collections::HashMap::new();
        let mut reverse_enemies = std::collections::HashMap::new();
        let mut tracker = PredictedEntityTracker::new();
        let mut my_client_eid = None;
        let roster = RosterTable::default();
        let mut last_hp = std::collections::HashMap::new();
        let mut last_time = std::collections::HashMap::new();
        let ingestor = SnapshotIngestor::new();
        let mut sink = NullSink;

        let mut snapshot = base_snapshot();
        snapshot.players.push(player(7, 0.0, 0.0, 100));
        let mut ctx = IngestContext {
            world: &mut world,
            maps: &mut maps,
            reverse_players: &mut reverse_players,
            reverse_bullets: &mut reverse_bullets,
            reverse_enemies: &mut reverse_enemies,
            tracker: &mut tracker,
            my_server_eid: 7,
            my_client_eid: &mut my_client_eid,
            roster: &roster,
            local_character_id: 0,
            character_resolver: default_character_resolver,
            character_class_resolver: default_character_class_resolver,
            local_upgrade_state: &NoUpgrades,
            current_rtt_ms: 50.0,
            last_enemy_server_hp: &mut last_hp,
            last_enemy_server_time: &mut last_time,
        };
        let first = ingestor.apply(&snapshot, &mut ctx, &mut sink);
        assert_eq!(first.entity_overwrites, 0);

        let mut ctx = IngestContext {
            world: &mut world,
            maps: &mut maps,
            reverse_players: &mut reverse_players,
            reverse_bullets: &mut reverse_bullets,
            reverse_enemies: &mut reverse_enemies,
            tracker: &mut tracker,
            my_server_eid: 7,
            my_client_eid: &mut my_client_eid,
            roster: &roster,
            local_character_id: 0,
            character_resolver: default_character_resolver,
            character_class_resolver: default_character_class_resolver,
            local_upgrade_state: &NoUpgrades,
            current_rtt_ms: 50.0,
            last_enemy_server_hp: &mut last_hp,
            last_enemy_server_time: &mut last_time,
        };
        let second = ingestor.apply(&snapshot, &mut ctx, &mut sink);
        assert_eq!(second.entity_overwrites, 1);
    }
}
