//! Netcode core for the client-authoritative-prediction /
//! server-authoritative-state twin-stick shooter: the tick driver and
//! system registry, the input/snapshot buffers, the snapshot ingestor and
//! predicted-bullet tracker, the remote-interpolation applier, the
//! reconciler, clock sync, and the network session state machine. Content
//! systems (movement rules, weapons, AI, rendering) are external
//! collaborators this crate calls into, never implements.

pub mod clock_sync;
pub mod error;
pub mod event;
pub mod ingestor;
pub mod input_buffer;
pub mod interpolation;
pub mod net;
pub mod protocol;
pub mod reconciler;
pub mod session;
pub mod snapshot_buffer;
pub mod spatial_hash;
pub mod telemetry;
pub mod tick;
pub mod tracker;
pub mod world;

pub use clock_sync::ClockSync;
pub use error::NetError;
pub use event::{GameEvent, GameplayEventSink, NullSink, RecordingSink};
pub use ingestor::{
    default_character_class_resolver, default_character_resolver, CharacterClass,
    CharacterClassResolver, CharacterResolver, IngestContext, IngestStats, LocalUpgradeState,
    NoUpgrades, RosterTable, SnapshotIngestor, DEFAULT_CHARACTER_ID,
};
pub use input_buffer::InputBuffer;
pub use interpolation::{IdMaps, RemoteInterpolationApplier};
pub use net::{Datagram, NetworkEndpoint, NetworkStats, PacketLossSimulation};
pub use protocol::{
    decode_snapshot, encode_snapshot, sequence_greater_than, Buttons, BulletSnapshot,
    ClientMessage, ClientOrServerMessage, DynamiteSnapshot, EnemySnapshot, GameConfig, HudState,
    LastRitesZoneSnapshot, NetworkInput, Packet, PacketError, PacketHeader, PlayerRosterEntry,
    PlayerSnapshot, ServerMessage, SnapshotDecodeError, WorldSnapshot, DEFAULT_ENDPOINT,
    DEFAULT_PORT, MAX_PACKET_SIZE, PROTOCOL_VERSION, TICK_RATE, TICK_S,
};
pub use reconciler::{ReconcileSample, Reconciler};
pub use session::{
    JoinOptions, NullTokenStore, ReconnectTokenStore, Session, SessionEvent, SessionState,
};
pub use snapshot_buffer::{InterpolationState, SnapshotBuffer, SnapshotEntry};
pub use spatial_hash::{NullSpatialHash, SpatialHash};
pub use telemetry::MultiplayerTelemetry;
pub use tick::{FixedTimestep, FullWorldDriver, LocalPlayerDriver, SystemFn, SystemRegistry, SystemSet};
pub use tracker::PredictedEntityTracker;
pub use world::{Eid, SimulationScope, World};
