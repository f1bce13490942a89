//! Wire protocol: packet framing, the client→server input message, and the
//! binary `WorldSnapshot` the server broadcasts. Framing follows the same
//! sequence/ack-bitfield shape used elsewhere in this codebase's netcode;
//! the payloads themselves are specific to this game's entities.

use bitflags::bitflags;
use rkyv::{Archive, Deserialize, Serialize, rancor::Error as RancorError};
use thiserror::Error;

pub const PROTOCOL_MAGIC: u32 = 0x52434854; // "RCHT"
pub const PROTOCOL_VERSION: u8 = 1;
pub const DEFAULT_PORT: u16 = 2567;
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:2567";
pub const TICK_RATE: u32 = 60;
pub const TICK_S: f32 = 1.0 / TICK_RATE as f32;
pub const MAX_PACKET_SIZE: usize = 1400;

/// Wraparound-safe sequence comparison: is `s1` ahead of `s2`?
pub fn sequence_greater_than(s1: u32, s2: u32) -> bool {
    ((s1 > s2) && (s1 - s2 <= u32::MAX / 2)) || ((s1 < s2) && (s2 - s1 > u32::MAX / 2))
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
    #[rkyv(derive(Debug, PartialEq))]
    pub struct Buttons: u16 {
        const MOVE_UP     = 1 << 0;
        const MOVE_DOWN   = 1 << 1;
        const MOVE_LEFT   = 1 << 2;
        const MOVE_RIGHT  = 1 << 3;
        const SHOOT       = 1 << 4;
        const ROLL        = 1 << 5;
        const RELOAD      = 1 << 6;
        const ABILITY     = 1 << 7;
        const JUMP        = 1 << 8;
        const DEBUG_SPAWN = 1 << 9;
    }
}

/// A single frame of player input, tagged with everything the reconciler and
/// clock sync need to relate it back to a tick and a point in wall time.
#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct NetworkInput {
    pub seq: u32,
    pub client_tick: u32,
    pub client_time_ms: u64,
    pub estimated_server_time_ms: f64,
    pub view_interp_delay_ms: u32,
    pub shoot_seq: u32,
    pub buttons: Buttons,
    pub aim_angle: f32,
    pub move_x: f32,
    pub move_y: f32,
    pub cursor_world_x: f32,
    pub cursor_world_y: f32,
}

impl NetworkInput {
    pub fn has(&self, button: Buttons) -> bool {
        self.buttons.contains(button)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct PlayerSnapshot {
    pub eid: u16,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub z_velocity: f32,
    pub aim_angle: f32,
    pub state: u8,
    pub hp: u16,
    pub flags: u8,
    pub last_processed_seq: u32,
    pub roll_elapsed_ms: u16,
    pub roll_duration_ms: u16,
    pub roll_dir_x: f32,
    pub roll_dir_y: f32,
    pub showdown_active: u8,
    pub showdown_target_eid: u16,
}

impl PlayerSnapshot {
    pub const FLAG_DEAD: u8 = 1 << 0;
    pub const FLAG_INVINCIBLE: u8 = 1 << 1;
    pub const FLAG_ROLL_EDGE: u8 = 1 << 2;
    pub const FLAG_JUMP_EDGE: u8 = 1 << 3;

    pub fn flag(&self, bit: u8) -> bool {
        self.flags & bit != 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct BulletSnapshot {
    pub eid: u16,
    pub owner_eid: u16,
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub layer: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct EnemySnapshot {
    pub eid: u16,
    pub x: f32,
    pub y: f32,
    pub kind: u8,
    pub hp: u16,
    pub ai_state: u8,
    pub target_eid: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct LastRitesZoneSnapshot {
    pub owner_eid: u16,
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct DynamiteSnapshot {
    pub owner_eid: u16,
    pub x: f32,
    pub y: f32,
    pub fuse_remaining: f32,
    pub radius: f32,
}

/// The authoritative, binary-encoded world state broadcast by the server.
/// Decoding is gated by a leading protocol-version byte handled by the
/// transport layer (see [`Packet`]); `tick`/`server_time` here are the
/// values used downstream by the snapshot buffer's bracketed interpolation.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct WorldSnapshot {
    pub tick: u32,
    pub server_time: f64,
    pub last_command_ack: u32,
    pub players: Vec<PlayerSnapshot>,
    pub bullets: Vec<BulletSnapshot>,
    pub enemies: Vec<EnemySnapshot>,
    pub last_rites_zones: Vec<LastRitesZoneSnapshot>,
    pub dynamites: Vec<DynamiteSnapshot>,
}

impl WorldSnapshot {
    pub fn new(tick: u32, server_time: f64) -> Self {
        Self {
            tick,
            server_time,
            last_command_ack: 0,
            players: Vec::new(),
            bullets: Vec::new(),
            enemies: Vec::new(),
            last_rites_zones: Vec::new(),
            dynamites: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub magic: u32,
    pub sequence: u32,
    pub ack: u32,
    pub ack_bitfield: u32,
}

impl PacketHeader {
    pub fn new(sequence: u32, ack: u32, ack_bitfield: u32) -> Self {
        Self {
            magic: PROTOCOL_MAGIC,
            sequence,
            ack,
            ack_bitfield,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == PROTOCOL_MAGIC
    }
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum ClientMessage {
    Input(NetworkInput),
    Ping { client_time_ms: u64 },
    SelectNode { node_id: u32 },
    RequestGameConfig,
    CampReady { ready: bool },
    JoinRequest { character_id: u16, protocol_version: u8 },
    ResumeRequest { token: u64, protocol_version: u8 },
    Leave,
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct GameConfig {
    pub seed: u64,
    pub session_id: u64,
    pub player_eid: u16,
    pub character_id: u16,
    pub reconnect_token: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct PlayerRosterEntry {
    pub eid: u16,
    pub character_id: u16,
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct HudState {
    pub level: u16,
    pub pending_points: u16,
    pub xp: u32,
    pub stage_number: u16,
    pub wave_number: u16,
    pub cylinder_rounds: u8,
    pub cylinder_max_rounds: u8,
    pub is_reloading: bool,
    pub reload_progress: f32,
    pub ability_ready: bool,
    pub ability_cooldown: f32,
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum ServerMessage {
    GameConfig(GameConfig),
    PlayerRoster(Vec<PlayerRosterEntry>),
    /// The version byte has already been validated by the transport by the
    /// time this variant is constructed; see [`decode_snapshot`].
    Snapshot(WorldSnapshot),
    Hud(HudState),
    Pong { client_time_ms: u64, server_time_ms: f64 },
    SelectNodeResult { node_id: u32, success: bool },
    IncompatibleProtocol { reason: String },
    Disconnect,
}

#[derive(Debug, Error)]
pub enum PacketError {
    #[error("rkyv serialize failed: {0}")]
    Serialize(String),
    #[error("rkyv deserialize failed: {0}")]
    Deserialize(String),
    #[error("packet exceeds MTU ({0} > {MAX_PACKET_SIZE})")]
    TooLarge(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Packet {
    pub header: PacketHeader,
    pub message: ClientOrServerMessage,
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum ClientOrServerMessage {
    Client(ClientMessage),
    Server(ServerMessage),
}

const HEADER_LEN: usize = 16;

impl Packet {
    pub fn client(header: PacketHeader, message: ClientMessage) -> Self {
        Self {
            header,
            message: ClientOrServerMessage::Client(message),
        }
    }

    pub fn server(header: PacketHeader, message: ServerMessage) -> Self {
        Self {
            header,
            message: ClientOrServerMessage::Server(message),
        }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, PacketError> {
        let body = rkyv::to_bytes::<RancorError>(&self.message)
            .map_err(|e| PacketError::Serialize(e.to_string()))?;

        let mut out = Vec::with_capacity(HEADER_LEN + body.len());
        out.extend_from_slice(&self.header.magic.to_le_bytes());
        out.extend_from_slice(&self.header.sequence.to_le_bytes());
        out.extend_from_slice(&self.header.ack.to_le_bytes());
        out.extend_from_slice(&self.header.ack_bitfield.to_le_bytes());
        out.extend_from_slice(&body);

        if out.len() > MAX_PACKET_SIZE {
            return Err(PacketError::TooLarge(out.len()));
        }
        Ok(out)
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Self, PacketError> {
        if bytes.len() < HEADER_LEN {
            return Err(PacketError::Deserialize("packet shorter than header".into()));
        }

        let magic = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        let sequence = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        let ack = u32::from_le_bytes(bytes[8..12].try_into().unwrap());
        let ack_bitfield = u32::from_le_bytes(bytes[12..16].try_into().unwrap());
        let header = PacketHeader {
            magic,
            sequence,
            ack,
            ack_bitfield,
        };

        let message = rkyv::from_bytes::<ClientOrServerMessage, RancorError>(&bytes[HEADER_LEN..])
            .map_err(|e| PacketError::Deserialize(e.to_string()))?;

        Ok(Self { header, message })
    }
}

/// Decodes a binary snapshot payload that begins with a protocol-version
/// byte, per §6's mismatch policy: any byte other than [`PROTOCOL_VERSION`]
/// is a terminal [`PacketError`] the session must treat as
/// `incompatible-protocol` + `disconnect`, never a silently-dropped decode
/// error.
pub fn decode_snapshot(bytes: &[u8]) -> Result<WorldSnapshot, SnapshotDecodeError> {
    let Some((&version, body)) = bytes.split_first() else {
        return Err(SnapshotDecodeError::Empty);
    };

    if version != PROTOCOL_VERSION {
        return Err(SnapshotDecodeError::VersionMismatch {
            expected: PROTOCOL_VERSION,
            got: version,
        });
    }

    rkyv::from_bytes::<WorldSnapshot, RancorError>(body)
        .map_err(|e| SnapshotDecodeError::Malformed(e.to_string()))
}

pub fn encode_snapshot(snapshot: &WorldSnapshot) -> Result<Vec<u8>, PacketError> {
    let body = rkyv::to_bytes::<RancorError>(snapshot)
        .map_err(|e| PacketError::Serialize(e.to_string()))?;
    let mut out = Vec::with_capacity(body.len() + 1);
    out.push(PROTOCOL_VERSION);
    out.extend_from_slice(&body);
    Ok(out)
}

#[derive(Debug, Error)]
pub enum SnapshotDecodeError {
    #[error("empty snapshot payload")]
    Empty,
    #[error("snapshot version mismatch: expected {expected}, got {got}")]
    VersionMismatch { expected: u8, got: u8 },
    #[error("malformed snapshot payload: {0}")]
    Malformed(String),
}

impl SnapshotDecodeError {
    pub fn is_version_mismatch(&self) -> bool {
        matches!(self, SnapshotDecodeError::VersionMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_comparison_wraps() {
        assert!(sequence_greater_than(1, 0));
        assert!(sequence_greater_than(0, u32::MAX));
        assert!(!sequence_greater_than(u32::MAX, 0));
    }

    #[test]
    fn snapshot_roundtrips_through_rkyv() {
        let mut snapshot = WorldSnapshot::new(42, 123.456);
        snapshot.last_command_ack = 7;
        snapshot.players.push(PlayerSnapshot {
            eid: 1,
            x: 10.0,
            y: 20.0,
            z: 0.0,
            z_velocity: 0.0,
            aim_angle: 1.5,
            state: 0,
            hp: 100,
            flags: 0,
            last_processed_seq: 5,
            roll_elapsed_ms: 0,
            roll_duration_ms: 0,
            roll_dir_x: 0.0,
            roll_dir_y: 0.0,
            showdown_active: 0,
            showdown_target_eid: 0,
        });

        let encoded = encode_snapshot(&snapshot).unwrap();
        assert_eq!(encoded[0], PROTOCOL_VERSION);

        let decoded = decode_snapshot(&encoded).unwrap();
        assert_eq!(decoded.tick, 42);
        assert_eq!(decoded.last_command_ack, 7);
        assert_eq!(decoded.players.len(), 1);
        assert_eq!(decoded.players[0].eid, 1);
    }

    #[test]
    fn version_mismatch_is_reported_distinctly() {
        let mut snapshot = WorldSnapshot::new(1, 0.0);
        snapshot.players.clear();
        let mut encoded = encode_snapshot(&snapshot).unwrap();
        encoded[0] = 0x63;

        let err = decode_snapshot(&encoded).unwrap_err();
        assert!(err.is_version_mismatch());
    }

    #[test]
    fn packet_roundtrips_header_and_message() {
        let header = PacketHeader::new(5, 4, 0b1011);
        let packet = Packet::client(header, ClientMessage::Ping { client_time_ms: 42 });

        let bytes = packet.serialize().unwrap();
        let decoded = Packet::deserialize(&bytes).unwrap();

        assert_eq!(decoded.header, header);
        assert!(decoded.header.is_valid());
        match decoded.message {
            ClientOrServerMessage::Client(ClientMessage::Ping { client_time_ms }) => {
                assert_eq!(client_time_ms, 42)
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn button_flags_round_trip() {
        let input = NetworkInput {
            seq: 1,
            client_tick: 1,
            client_time_ms: 0,
            estimated_server_time_ms: 0.0,
            view_interp_delay_ms: 100,
            shoot_seq: 0,
            buttons: Buttons::SHOOT | Buttons::MOVE_UP,
            aim_angle: 0.0,
            move_x: 0.0,
            move_y: 1.0,
            cursor_world_x: 0.0,
            cursor_world_y: 0.0,
        };
        assert!(input.has(Buttons::SHOOT));
        assert!(!input.has(Buttons::ROLL));
    }
}
