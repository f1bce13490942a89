//! Component definitions. A component attaches to an entity by being present
//! in the matching `World` table; there is no entity struct with optional
//! fields.

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub prev_x: f32,
    pub prev_y: f32,
}

impl Position {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            prev_x: x,
            prev_y: y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ZPosition {
    pub z: f32,
    pub z_velocity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Player {
    pub aim_angle: f32,
    pub slot: u8,
    pub shoot_was_down: bool,
    pub roll_button_was_down: bool,
    pub jump_button_was_down: bool,
    pub ability_was_down: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerStateKind {
    #[default]
    Idle,
    Moving,
    Rolling,
    Jumping,
    Landing,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PlayerState {
    pub kind: PlayerStateKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Speed {
    pub current: f32,
    pub max: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Collider {
    pub radius: u16,
    pub layer: CollisionLayer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionLayer {
    #[default]
    None,
    PlayerBullet,
    EnemyBullet,
    Player,
    Enemy,
}

impl CollisionLayer {
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::PlayerBullet,
            2 => Self::EnemyBullet,
            3 => Self::Player,
            4 => Self::Enemy,
            _ => Self::None,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::None => 0,
            Self::PlayerBullet => 1,
            Self::EnemyBullet => 2,
            Self::Player => 3,
            Self::Enemy => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Health {
    pub current: i32,
    pub max: i32,
    pub iframes: f32,
    pub iframe_duration: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Cylinder {
    pub rounds: u8,
    pub max_rounds: u8,
    pub reload_timer: f32,
    pub reload_time: f32,
    pub fire_cooldown: f32,
    pub reloading: bool,
    pub first_shot_after_reload: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Weapon {
    pub bullet_speed: f32,
    pub bullet_damage: f32,
    pub range: f32,
    pub fire_rate: f32,
    pub cooldown: f32,
}

/// The melee counterpart to `Weapon`+`Cylinder`, attached instead of them for
/// a melee character at local-player first sight.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MeleeWeapon {
    pub damage: f32,
    pub range: f32,
    pub swing_rate: f32,
    pub cooldown: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bullet {
    pub owner_id: Option<super::Eid>,
    pub damage: f32,
    pub lifetime: f32,
    pub distance_traveled: f32,
    pub range: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub tier: EnemyTier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnemyKind {
    #[default]
    Unknown,
    Shambler,
    Lurker,
    Brute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnemyTier {
    #[default]
    Fodder,
    Elite,
    Boss,
}

impl EnemyKind {
    pub fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Shambler,
            2 => Self::Lurker,
            3 => Self::Brute,
            _ => Self::Unknown,
        }
    }

    /// Conservative defaults for a type the client hasn't seen content
    /// definitions for; never panics on an unrecognised wire value.
    pub fn default_radius(self) -> u16 {
        match self {
            Self::Shambler => 14,
            Self::Lurker => 10,
            Self::Brute => 20,
            Self::Unknown => 10,
        }
    }

    pub fn default_tier(self) -> EnemyTier {
        match self {
            Self::Brute => EnemyTier::Elite,
            _ => EnemyTier::Fodder,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnemyAi {
    pub state: u8,
    pub target_eid: Option<super::Eid>,
    pub state_timer: f32,
    pub initial_delay: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Roll {
    pub duration_ms: u16,
    pub elapsed_ms: u16,
    pub dir_x: f32,
    pub dir_y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Jump {
    pub landed: bool,
    pub landing_timer: f32,
    pub buffer_timer: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Showdown {
    pub active: bool,
    pub target_eid: Option<super::Eid>,
    pub duration: f32,
    pub cooldown: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Dead;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Invincible;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Knockback {
    pub vx: f32,
    pub vy: f32,
    pub duration: f32,
}
