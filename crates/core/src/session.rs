//! Client-side connection/session state machine: join (with token-based
//! resume), typed message routing, snapshot backpressure, and auto-reconnect
//! with exponential backoff. This is the "NetworkClient" of §4.9 — the one
//! place in the core allowed to suspend (waiting on a socket during `join`),
//! everything else here is synchronous bookkeeping driven by `update`.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use crate::error::NetError;
use crate::net::{Datagram, NetworkEndpoint};
use crate::protocol::{
    decode_snapshot, ClientMessage, GameConfig, HudState, Packet, PacketHeader,
    PlayerRosterEntry, ServerMessage, WorldSnapshot, PROTOCOL_VERSION,
};

const JOIN_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_BASE_MS: u64 = 500;
const RECONNECT_MAX_MS: u64 = 8000;
const PENDING_SNAPSHOT_CAP: usize = 6;
const MAX_APPLIED_PER_UPDATE: usize = 4;

/// Persists the room-issued reconnection token across process restarts.
/// The teacher's client kept this in a storage key (`hn-reconnect-token`
/// upstream); the core only needs the trait seam, not a concrete backend —
/// binaries provide a file-backed or platform-storage implementation.
pub trait ReconnectTokenStore {
    fn load(&self) -> Option<u64>;
    fn save(&mut self, token: u64);
    fn clear(&mut self);
}

/// No-op store, used by tests and by callers that don't want resume.
#[derive(Debug, Default)]
pub struct NullTokenStore;

impl ReconnectTokenStore for NullTokenStore {
    fn load(&self) -> Option<u64> {
        None
    }
    fn save(&mut self, _token: u64) {}
    fn clear(&mut self) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Ready,
    Reconnecting,
    Closed,
}

#[derive(Debug, Clone, Copy)]
pub struct JoinOptions {
    pub character_id: u16,
}

/// Typed events the session routes to the caller; mirrors §4.9's message
/// callbacks plus the two terminal lifecycle events the core itself emits
/// through [`crate::event::GameplayEventSink`].
#[derive(Debug, Clone)]
pub enum SessionEvent {
    GameConfig(GameConfig),
    PlayerRoster(Vec<PlayerRosterEntry>),
    Snapshot(WorldSnapshot),
    Hud(HudState),
    Pong { client_time_ms: u64, server_time_ms: f64 },
    SelectNodeResult { node_id: u32, success: bool },
    IncompatibleProtocol { reason: String },
    Disconnect,
}

/// `min(500*2^n, 8000)` ms, per §4.9's auto-reconnect backoff.
fn backoff_ms(attempt: u32) -> u64 {
    RECONNECT_BASE_MS
        .saturating_mul(1u64 << attempt.min(31))
        .min(RECONNECT_MAX_MS)
}

pub struct Session {
    endpoint: NetworkEndpoint,
    server_addr: SocketAddr,
    state: SessionState,
    send_seq: u32,
    last_ack: u32,
    join_options: JoinOptions,
    reconnect_token: Option<u64>,
    reconnect_attempt: u32,
    reconnect_deadline: Option<Instant>,
    pending_snapshots: VecDeque<WorldSnapshot>,
    pub snapshots_dropped: u64,
}

impl Session {
    pub fn new(endpoint: NetworkEndpoint, server_addr: SocketAddr) -> Self {
        Self {
            endpoint,
            server_addr,
            state: SessionState::Idle,
            send_seq: 0,
            last_ack: 0,
            join_options: JoinOptions { character_id: 0 },
            reconnect_token: None,
            reconnect_attempt: 0,
            reconnect_deadline: None,
            pending_snapshots: VecDeque::with_capacity(PENDING_SNAPSHOT_CAP),
            snapshots_dropped: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Attempts a resume using `token_store`'s persisted token; falls back to
    /// a fresh join with `options` if no token is stored or the resume is
    /// rejected as stale. Blocks (the one suspension point in this core)
    /// until `game-config` arrives or [`JOIN_TIMEOUT`] elapses.
    pub fn join(
        &mut self,
        options: JoinOptions,
        token_store: &mut dyn ReconnectTokenStore,
    ) -> Result<GameConfig, NetError> {
        self.join_options = options;
        self.state = SessionState::Connecting;

        if let Some(token) = token_store.load() {
            self.send_client(ClientMessage::ResumeRequest {
                token,
                protocol_version: PROTOCOL_VERSION,
            });
        } else {
            self.send_join_request();
        }

        let deadline = Instant::now() + JOIN_TIMEOUT;
        loop {
            for (datagram, _addr) in self.endpoint.receive().map_err(|_| NetError::ConnectTimeout)? {
                if let Datagram::Control(packet) = datagram {
                    if let Packet {
                        message: crate::protocol::ClientOrServerMessage::Server(msg),
                        ..
                    } = packet
                    {
                        match msg {
                            ServerMessage::GameConfig(cfg) => {
                                self.state = SessionState::Ready;
                                self.reconnect_token = Some(cfg.reconnect_token);
                                self.reconnect_attempt = 0;
                                token_store.save(cfg.reconnect_token);
                                return Ok(cfg);
                            }
                            ServerMessage::Disconnect => {
                                // Stale/rejected resume: clear the token and
                                // fall through to a fresh join attempt.
                                token_store.clear();
                                self.reconnect_token = None;
                                self.send_join_request();
                            }
                            ServerMessage::IncompatibleProtocol { .. } => {
                                self.state = SessionState::Closed;
                                return Err(NetError::ProtocolMismatch {
                                    expected: PROTOCOL_VERSION,
                                    got: 0,
                                });
                            }
                            _ => {}
                        }
                    }
                }
            }

            if Instant::now() >= deadline {
                self.state = SessionState::Closed;
                return Err(NetError::ConnectTimeout);
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    fn send_join_request(&mut self) {
        self.send_client(ClientMessage::JoinRequest {
            character_id: self.join_options.character_id,
            protocol_version: PROTOCOL_VERSION,
        });
    }

    /// Drains the socket, routes every control message, decodes pending
    /// snapshots (dropping oldest on overflow), applies the reconnect
    /// backoff clock, and returns at most [`MAX_APPLIED_PER_UPDATE`]
    /// snapshots for this tick, per §5's fixed per-tick ordering.
    pub fn update(&mut self, now: Instant, token_store: &mut dyn ReconnectTokenStore) -> Vec<SessionEvent> {
        let mut events = Vec::new();

        if self.state == SessionState::Closed {
            return events;
        }

        if let Ok(datagrams) = self.endpoint.receive() {
            for (datagram, _addr) in datagrams {
                match datagram {
                    Datagram::Control(packet) => {
                        if let crate::protocol::ClientOrServerMessage::Server(msg) = packet.message
                        {
                            self.route_control(msg, token_store, &mut events);
                        }
                    }
                    Datagram::SnapshotBytes(bytes) => {
                        self.ingest_snapshot_bytes(&bytes, &mut events);
                    }
                }
            }
        }

        if self.state == SessionState::Reconnecting {
            self.drive_reconnect(now, &mut events);
        }

        for _ in 0..MAX_APPLIED_PER_UPDATE {
            match self.pending_snapshots.pop_front() {
                Some(snapshot) => events.push(SessionEvent::Snapshot(snapshot)),
                None => break,
            }
        }

        events
    }

    fn ingest_snapshot_bytes(&mut self, bytes: &[u8], events: &mut Vec<SessionEvent>) {
        match decode_snapshot(bytes) {
            Ok(snapshot) => {
                if self.pending_snapshots.len() == PENDING_SNAPSHOT_CAP {
                    self.pending_snapshots.pop_front();
                    self.snapshots_dropped += 1;
                }
                self.pending_snapshots.push_back(snapshot);
            }
            Err(e) if e.is_version_mismatch() => {
                self.terminal_protocol_mismatch(e.to_string(), events);
            }
            Err(_) => {
                // Non-version decode error: log and drop, continue.
            }
        }
    }

    fn route_control(
        &mut self,
        msg: ServerMessage,
        token_store: &mut dyn ReconnectTokenStore,
        events: &mut Vec<SessionEvent>,
    ) {
        match msg {
            ServerMessage::GameConfig(cfg) => events.push(SessionEvent::GameConfig(cfg)),
            ServerMessage::PlayerRoster(roster) => events.push(SessionEvent::PlayerRoster(roster)),
            ServerMessage::Snapshot(snapshot) => {
                if self.pending_snapshots.len() == PENDING_SNAPSHOT_CAP {
                    self.pending_snapshots.pop_front();
                    self.snapshots_dropped += 1;
                }
                self.pending_snapshots.push_back(snapshot);
            }
            ServerMessage::Hud(hud) => events.push(SessionEvent::Hud(hud)),
            ServerMessage::Pong {
                client_time_ms,
                server_time_ms,
            } => events.push(SessionEvent::Pong {
                client_time_ms,
                server_time_ms,
            }),
            ServerMessage::SelectNodeResult { node_id, success } => {
                events.push(SessionEvent::SelectNodeResult { node_id, success })
            }
            ServerMessage::IncompatibleProtocol { reason } => {
                self.terminal_protocol_mismatch(reason, events);
            }
            ServerMessage::Disconnect => {
                if self.state == SessionState::Ready {
                    self.begin_reconnect(events);
                }
            }
        }
    }

    fn terminal_protocol_mismatch(&mut self, reason: String, events: &mut Vec<SessionEvent>) {
        self.state = SessionState::Closed;
        self.reconnect_token = None;
        events.push(SessionEvent::IncompatibleProtocol { reason });
        events.push(SessionEvent::Disconnect);
    }

    fn begin_reconnect(&mut self, events: &mut Vec<SessionEvent>) {
        self.state = SessionState::Reconnecting;
        self.reconnect_attempt = 0;
        self.reconnect_deadline = Some(Instant::now());
        let _ = events;
    }

    fn drive_reconnect(&mut self, now: Instant, events: &mut Vec<SessionEvent>) {
        let Some(deadline) = self.reconnect_deadline else {
            return;
        };
        if now < deadline {
            return;
        }

        if self.reconnect_attempt >= MAX_RECONNECT_ATTEMPTS {
            self.state = SessionState::Closed;
            self.reconnect_token = None;
            events.push(SessionEvent::Disconnect);
            return;
        }

        if let Some(token) = self.reconnect_token {
            self.send_client(ClientMessage::ResumeRequest {
                token,
                protocol_version: PROTOCOL_VERSION,
            });
        } else {
            self.send_join_request();
        }
        self.reconnect_attempt += 1;
        self.reconnect_deadline = Some(now + Duration::from_millis(backoff_ms(self.reconnect_attempt)));
    }

    /// Cancels any in-flight reconnect, clears the persisted token, and
    /// leaves the room. The terminal state is the same `Closed` a failed
    /// join or protocol mismatch reaches, but this path never re-attempts.
    pub fn leave(&mut self, token_store: &mut dyn ReconnectTokenStore) {
        if self.state != SessionState::Closed {
            self.send_client(ClientMessage::Leave);
        }
        self.state = SessionState::Closed;
        self.reconnect_token = None;
        self.reconnect_deadline = None;
        token_store.clear();
    }

    pub fn send_input(&mut self, input: crate::protocol::NetworkInput) {
        self.send_client(ClientMessage::Input(input));
    }

    pub fn send_ping(&mut self, client_time_ms: u64) {
        self.send_client(ClientMessage::Ping { client_time_ms });
    }

    pub fn send_select_node(&mut self, node_id: u32) {
        self.send_client(ClientMessage::SelectNode { node_id });
    }

    pub fn request_game_config(&mut self) {
        self.send_client(ClientMessage::RequestGameConfig);
    }

    pub fn send_camp_ready(&mut self, ready: bool) {
        self.send_client(ClientMessage::CampReady { ready });
    }

    fn send_client(&mut self, message: ClientMessage) {
        let header = PacketHeader::new(self.send_seq, self.last_ack, 0);
        self.send_seq = self.send_seq.wrapping_add(1);
        let packet = Packet::client(header, message);
        let _ = self.endpoint.send_to(&packet, self.server_addr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_caps_at_max() {
        assert_eq!(backoff_ms(0), 500);
        assert_eq!(backoff_ms(1), 1000);
        assert_eq!(backoff_ms(2), 2000);
        assert_eq!(backoff_ms(4), 8000);
        assert_eq!(backoff_ms(10), 8000);
    }

    fn session_pair() -> (Session, Session, SocketAddr, SocketAddr) {
        let client_ep = NetworkEndpoint::bind("127.0.0.1:0").unwrap();
        let server_ep = NetworkEndpoint::bind("127.0.0.1:0").unwrap();
        let client_addr = client_ep.local_addr();
        let server_addr = server_ep.local_addr();
        let client = Session::new(client_ep, server_addr);
        let server = Session::new(server_ep, client_addr);
        (client, server, client_addr, server_addr)
    }

    #[test]
    fn protocol_mismatch_closes_session_and_clears_token() {
        let (mut client, _server, _c, _s) = session_pair();
        let mut token_store = NullTokenStore;
        client.reconnect_token = Some(42);
        client.state = SessionState::Ready;

        let mut events = Vec::new();
        client.terminal_protocol_mismatch("Snapshot version mismatch".into(), &mut events);

        assert_eq!(client.state(), SessionState::Closed);
        assert!(client.reconnect_token.is_none());
        assert!(matches!(events[0], SessionEvent::IncompatibleProtocol { .. }));
        assert!(matches!(events[1], SessionEvent::Disconnect));
        let _ = token_store.load();
    }

    #[test]
    fn unintentional_disconnect_starts_reconnect_not_close() {
        let (mut client, _server, _c, _s) = session_pair();
        client.state = SessionState::Ready;

        let mut events = Vec::new();
        client.route_control(ServerMessage::Disconnect, &mut NullTokenStore, &mut events);

        assert_eq!(client.state(), SessionState::Reconnecting);
        assert!(events.is_empty());
    }

    #[test]
    fn reconnect_exhaustion_closes_and_drops_token() {
        let (mut client, _server, _c, _s) = session_pair();
        client.state = SessionState::Reconnecting;
        client.reconnect_attempt = MAX_RECONNECT_ATTEMPTS;
        client.reconnect_deadline = Some(Instant::now());
        client.reconnect_token = Some(7);

        let mut events = Vec::new();
        client.drive_reconnect(Instant::now(), &mut events);

        assert_eq!(client.state(), SessionState::Closed);
        assert!(client.reconnect_token.is_none());
        assert!(matches!(events[0], SessionEvent::Disconnect));
    }

    #[test]
    fn snapshot_backpressure_drops_oldest_and_caps_applied_per_update() {
        let (mut client, _server, _c, _s) = session_pair();
        let mut events = Vec::new();
        for tick in 0..(PENDING_SNAPSHOT_CAP as u32 + 3) {
            client.route_control(
                ServerMessage::Snapshot(WorldSnapshot::new(tick, tick as f64)),
                &mut NullTokenStore,
                &mut events,
            );
        }
        assert_eq!(client.snapshots_dropped, 3);
        assert_eq!(client.pending_snapshots.len(), PENDING_SNAPSHOT_CAP);
        // Oldest (ticks 0,1,2) were dropped; the buffer keeps ticks 3..=8.
        assert_eq!(client.pending_snapshots.front().unwrap().tick, 3);

        let applied = client.update(Instant::now(), &mut NullTokenStore);
        let snapshot_events: Vec<_> = applied
            .iter()
            .filter(|e| matches!(e, SessionEvent::Snapshot(_)))
            .collect();
        assert_eq!(snapshot_events.len(), MAX_APPLIED_PER_UPDATE);
        assert_eq!(client.pending_snapshots.len(), PENDING_SNAPSHOT_CAP - MAX_APPLIED_PER_UPDATE);
    }

    #[test]
    fn leave_clears_token_and_closes() {
        let (mut client, _server, _c, _s) = session_pair();
        client.state = SessionState::Ready;
        client.reconnect_token = Some(99);
        let mut store = InMemoryTokenStore { token: Some(99) };

        client.leave(&mut store);

        assert_eq!(client.state(), SessionState::Closed);
        assert!(store.token.is_none());
    }

    struct InMemoryTokenStore {
        token: Option<u64>,
    }

    impl ReconnectTokenStore for InMemoryTokenStore {
        fn load(&self) -> Option<u64> {
            self.token
        }
        fn save(&mut self, token: u64) {
            self.token = Some(token);
        }
        fn clear(&mut self) {
            self.token = None;
        }
    }
}
