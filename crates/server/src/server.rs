use std::collections::{HashMap, VecDeque};
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ricochet_core::net::rand_u64;
use ricochet_core::world::{Health, Player, Position};
use ricochet_core::{
    encode_snapshot, ClientMessage, ClientOrServerMessage, Datagram, Eid, GameConfig,
    GameplayEventSink, NetworkEndpoint, NetworkInput, NetworkStats, Packet, PacketHeader,
    PacketLossSimulation, PlayerRosterEntry, PlayerSnapshot, ServerMessage, SimulationScope,
    SystemRegistry, World, WorldSnapshot, PROTOCOL_VERSION, TICK_S,
};

use crate::config::ServerConfig;
use crate::connection::ClientConnection;
use crate::events::{DisconnectReason, ServerEvent};
use crate::simulation;

struct DiscardSink;

impl GameplayEventSink for DiscardSink {
    fn push(&mut self, _event: ricochet_core::GameEvent) {}
}

pub struct GameServer {
    endpoint: NetworkEndpoint,
    registry: SystemRegistry,
    world: World,
    config: ServerConfig,
    connections: HashMap<u32, ClientConnection>,
    addr_to_client: HashMap<SocketAddr, u32>,
    token_to_client: HashMap<u64, u32>,
    next_client_id: u32,
    tick_duration: Duration,
    last_tick_time: Instant,
    accumulator: Duration,
    running: Arc<AtomicBool>,
    start_time: Instant,
    pending_events: VecDeque<ServerEvent>,
    session_id: u64,
}

impl GameServer {
    pub fn new(bind_addr: &str, config: ServerConfig) -> io::Result<Self> {
        let endpoint = NetworkEndpoint::bind(bind_addr)?;
        let tick_duration = Duration::from_secs_f64(1.0 / config.tick_rate as f64);

        Ok(Self {
            endpoint,
            registry: simulation::build_registry(),
            world: World::new(),
            connections: HashMap::new(),
            addr_to_client: HashMap::new(),
            token_to_client: HashMap::new(),
            next_client_id: 1,
            tick_duration,
            last_tick_time: Instant::now(),
            accumulator: Duration::ZERO,
            running: Arc::new(AtomicBool::new(true)),
            start_time: Instant::now(),
            pending_events: VecDeque::new(),
            session_id: rand_u64(),
            config,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.endpoint.local_addr()
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn drain_events(&mut self) -> impl Iterator<Item = ServerEvent> + '_ {
        self.pending_events.drain(..)
    }

    pub fn run(&mut self) {
        while self.running.load(Ordering::SeqCst) {
            self.tick_once();
            std::thread::sleep(Duration::from_millis(1));
        }
        self.shutdown_connections();
    }

    pub fn shutdown_connections(&mut self) {
        let client_ids: Vec<u32> = self.connections.keys().copied().collect();
        for client_id in client_ids {
            self.kick_client(client_id);
        }
    }

    pub fn kick_client(&mut self, client_id: u32) {
        let Some(conn) = self.connections.get(&client_id) else {
            return;
        };
        let header = PacketHeader::new(conn.send_seq, 0, 0);
        let packet = Packet::server(header, ServerMessage::Disconnect);
        let _ = self.endpoint.send_to(&packet, conn.addr);
        self.remove_connection(client_id, DisconnectReason::Kicked);
    }

    fn remove_connection(&mut self, client_id: u32, reason: DisconnectReason) {
        if let Some(conn) = self.connections.remove(&client_id) {
            self.addr_to_client.remove(&conn.addr);
            self.token_to_client.remove(&conn.reconnect_token);
            self.world.despawn(conn.eid);
            self.pending_events
                .push_back(ServerEvent::ClientDisconnected { client_id, reason });
            self.broadcast_roster();
        }
    }

    pub fn tick_once(&mut self) {
        let now = Instant::now();
        let delta = now - self.last_tick_time;
        self.last_tick_time = now;
        self.accumulator += delta;

        if let Err(e) = self.process_network() {
            self.pending_events.push_back(ServerEvent::Error {
                message: format!("network error: {e}"),
            });
        }

        while self.accumulator >= self.tick_duration {
            self.accumulator -= self.tick_duration;
            self.tick();
        }
    }

    fn tick(&mut self) {
        self.process_inputs();
        self.world.advance_tick();
        self.broadcast_snapshots();
        self.timeout_stale_connections();
    }

    fn process_inputs(&mut self) {
        let client_ids: Vec<u32> = self.connections.keys().copied().collect();
        for client_id in client_ids {
            let (eid, inputs) = {
                let conn = self.connections.get_mut(&client_id).unwrap();
                let inputs: Vec<NetworkInput> = conn.inbox.drain(..).collect();
                (conn.eid, inputs)
            };

            for input in &inputs {
                self.world.set_scope(SimulationScope::Full);
                self.world.player_inputs.insert(eid, *input);
                self.registry
                    .run_all(&mut self.world, TICK_S, &mut DiscardSink);
            }

            if let Some(last) = inputs.last() {
                self.connections.get_mut(&client_id).unwrap().last_processed_seq = last.seq;
            }
        }
    }

    fn timeout_stale_connections(&mut self) {
        let timeout = Duration::from_secs(30);
        let stale: Vec<u32> = self
            .connections
            .iter()
            .filter(|(_, c)| c.last_receive_time.elapsed() > timeout)
            .map(|(id, _)| *id)
            .collect();
        for client_id in stale {
            self.remove_connection(client_id, DisconnectReason::Timeout);
        }
    }

    fn broadcast_snapshots(&mut self) {
        let acks: HashMap<Eid, u32> = self
            .connections
            .values()
            .map(|c| (c.eid, c.last_processed_seq))
            .collect();
        let snapshot = build_snapshot(&self.world, self.server_time_ms(), &acks);

        let bytes = match encode_snapshot(&snapshot) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.pending_events.push_back(ServerEvent::Error {
                    message: format!("failed to encode snapshot: {e}"),
                });
                return;
            }
        };

        let drop_for_testing = self
            .config
            .global_packet_loss
            .as_ref()
            .is_some_and(PacketLossSimulation::should_drop);

        let addrs: Vec<SocketAddr> = self.connections.values().map(|c| c.addr).collect();
        for addr in addrs {
            if drop_for_testing {
                continue;
            }
            if let Err(e) = self.endpoint.send_snapshot_to(&bytes, addr) {
                self.pending_events.push_back(ServerEvent::Error {
                    message: format!("failed to send snapshot to {addr}: {e}"),
                });
            }
        }
    }

    fn process_network(&mut self) -> io::Result<()> {
        let datagrams = self.endpoint.receive()?;
        for (datagram, addr) in datagrams {
            if let Datagram::Control(packet) = datagram {
                if let ClientOrServerMessage::Client(message) = packet.message {
                    self.handle_message(addr, message)?;
                }
            }
        }
        Ok(())
    }

    fn handle_message(&mut self, addr: SocketAddr, message: ClientMessage) -> io::Result<()> {
        if let Some(&client_id) = self.addr_to_client.get(&addr) {
            if let Some(conn) = self.connections.get_mut(&client_id) {
                conn.touch();
            }
        }

        match message {
            ClientMessage::JoinRequest {
                character_id,
                protocol_version,
            } => self.handle_join(addr, character_id, protocol_version)?,
            ClientMessage::ResumeRequest {
                token,
                protocol_version,
            } => self.handle_resume(addr, token, protocol_version)?,
            ClientMessage::Input(input) => self.handle_input(addr, input),
            ClientMessage::Ping { client_time_ms } => self.handle_ping(addr, client_time_ms)?,
            ClientMessage::RequestGameConfig => self.handle_request_game_config(addr)?,
            ClientMessage::SelectNode { node_id } => self.handle_select_node(addr, node_id)?,
            ClientMessage::CampReady { ready: _ } => {}
            ClientMessage::Leave => self.handle_leave(addr),
        }
        Ok(())
    }

    fn handle_join(
        &mut self,
        addr: SocketAddr,
        character_id: u16,
        protocol_version: u8,
    ) -> io::Result<()> {
        self.pending_events
            .push_back(ServerEvent::ClientConnecting { addr });

        if protocol_version != PROTOCOL_VERSION {
            return self.reject_protocol_mismatch(addr);
        }

        if self.connections.len() >= self.config.max_clients {
            let reason = "server full".to_string();
            let header = PacketHeader::new(0, 0, 0);
            let packet = Packet::server(
                header,
                ServerMessage::Disconnect,
            );
            self.endpoint.send_to(&packet, addr)?;
            self.pending_events
                .push_back(ServerEvent::ConnectionDenied { addr, reason });
            return Ok(());
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        let eid = self.world.alloc_eid();
        self.world.positions.insert(eid, Position::at(0.0, 0.0));
        self.world.players.insert(eid, Player::default());
        self.world.healths.insert(
            eid,
            Health {
                current: 100,
                max: 100,
                iframes: 0.0,
                iframe_duration: 0.5,
            },
        );
        self.world.player_characters.insert(eid, character_id);

        let reconnect_token = rand_u64();
        let conn = ClientConnection::new(client_id, addr, eid, character_id, reconnect_token);
        self.connections.insert(client_id, conn);
        self.addr_to_client.insert(addr, client_id);
        self.token_to_client.insert(reconnect_token, client_id);

        self.pending_events.push_back(ServerEvent::ClientConnected {
            client_id,
            addr,
            entity_id: eid.id(),
        });

        self.send_game_config(addr, eid, character_id, reconnect_token)?;
        self.broadcast_roster();
        Ok(())
    }

    fn handle_resume(
        &mut self,
        addr: SocketAddr,
        token: u64,
        protocol_version: u8,
    ) -> io::Result<()> {
        if protocol_version != PROTOCOL_VERSION {
            return self.reject_protocol_mismatch(addr);
        }

        let Some(&client_id) = self.token_to_client.get(&token) else {
            // Unknown/stale token: tell the client core to clear it and
            // retry as a fresh join (see `Session::join`'s resume handling).
            let header = PacketHeader::new(0, 0, 0);
            let packet = Packet::server(header, ServerMessage::Disconnect);
            self.endpoint.send_to(&packet, addr)?;
            return Ok(());
        };

        let (eid, character_id) = {
            let conn = self.connections.get_mut(&client_id).unwrap();
            self.addr_to_client.remove(&conn.addr);
            conn.addr = addr;
            (conn.eid, conn.character_id)
        };
        self.addr_to_client.insert(addr, client_id);

        self.pending_events.push_back(ServerEvent::ClientConnected {
            client_id,
            addr,
            entity_id: eid.id(),
        });

        self.send_game_config(addr, eid, character_id, token)?;
        self.broadcast_roster();
        Ok(())
    }

    fn reject_protocol_mismatch(&mut self, addr: SocketAddr) -> io::Result<()> {
        let header = PacketHeader::new(0, 0, 0);
        let packet = Packet::server(
            header,
            ServerMessage::IncompatibleProtocol {
                reason: format!("server runs protocol version {PROTOCOL_VERSION}"),
            },
        );
        self.endpoint.send_to(&packet, addr)?;
        let packet = Packet::server(PacketHeader::new(1, 0, 0), ServerMessage::Disconnect);
        self.endpoint.send_to(&packet, addr)?;
        self.pending_events.push_back(ServerEvent::ConnectionDenied {
            addr,
            reason: "protocol version mismatch".to_string(),
        });
        Ok(())
    }

    fn send_game_config(
        &mut self,
        addr: SocketAddr,
        eid: Eid,
        character_id: u16,
        reconnect_token: u64,
    ) -> io::Result<()> {
        let config = GameConfig {
            seed: self.session_id,
            session_id: self.session_id,
            player_eid: eid.id() as u16,
            character_id,
            reconnect_token,
        };
        let header = PacketHeader::new(0, 0, 0);
        let packet = Packet::server(header, ServerMessage::GameConfig(config));
        self.endpoint.send_to(&packet, addr)
    }

    fn broadcast_roster(&mut self) {
        let roster: Vec<PlayerRosterEntry> = self
            .connections
            .values()
            .map(|c| PlayerRosterEntry {
                eid: c.eid.id() as u16,
                character_id: c.character_id,
            })
            .collect();

        let addrs: Vec<SocketAddr> = self.connections.values().map(|c| c.addr).collect();
        for addr in addrs {
            let header = PacketHeader::new(0, 0, 0);
            let packet = Packet::server(header, ServerMessage::PlayerRoster(roster.clone()));
            let _ = self.endpoint.send_to(&packet, addr);
        }
    }

    fn handle_input(&mut self, addr: SocketAddr, input: NetworkInput) {
        if let Some(&client_id) = self.addr_to_client.get(&addr) {
            if let Some(conn) = self.connections.get_mut(&client_id) {
                conn.push_input(input);
            }
        }
    }

    fn handle_ping(&mut self, addr: SocketAddr, client_time_ms: u64) -> io::Result<()> {
        let header = PacketHeader::new(0, 0, 0);
        let packet = Packet::server(
            header,
            ServerMessage::Pong {
                client_time_ms,
                server_time_ms: self.server_time_ms(),
            },
        );
        self.endpoint.send_to(&packet, addr)
    }

    fn handle_request_game_config(&mut self, addr: SocketAddr) -> io::Result<()> {
        let Some(&client_id) = self.addr_to_client.get(&addr) else {
            return Ok(());
        };
        let Some(conn) = self.connections.get(&client_id) else {
            return Ok(());
        };
        let (eid, character_id, token) = (conn.eid, conn.character_id, conn.reconnect_token);
        self.send_game_config(addr, eid, character_id, token)
    }

    fn handle_select_node(&mut self, addr: SocketAddr, node_id: u32) -> io::Result<()> {
        let header = PacketHeader::new(0, 0, 0);
        let packet = Packet::server(
            header,
            ServerMessage::SelectNodeResult {
                node_id,
                success: true,
            },
        );
        self.endpoint.send_to(&packet, addr)
    }

    fn handle_leave(&mut self, addr: SocketAddr) {
        if let Some(&client_id) = self.addr_to_client.get(&addr) {
            self.remove_connection(client_id, DisconnectReason::Graceful);
        }
    }

    fn server_time_ms(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64() * 1000.0
    }

    pub fn stats(&self) -> ServerStats {
        ServerStats {
            tick: self.world.tick(),
            client_count: self.connections.len(),
            max_clients: self.config.max_clients,
            entity_count: self.world.player_eids().len()
                + self.world.bullet_eids().len()
                + self.world.enemy_eids().len(),
            uptime_secs: self.start_time.elapsed().as_secs(),
            network_stats: self.endpoint.stats().clone(),
        }
    }

    pub fn client_infos(&self) -> Vec<ClientInfo> {
        self.connections
            .values()
            .map(|c| ClientInfo {
                client_id: c.client_id,
                addr: c.addr.to_string(),
                entity_id: c.eid.id(),
                connected_secs: c.last_receive_time.elapsed().as_secs(),
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ServerStats {
    pub tick: u32,
    pub client_count: usize,
    pub max_clients: usize,
    pub entity_count: usize,
    pub uptime_secs: u64,
    pub network_stats: NetworkStats,
}

#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub client_id: u32,
    pub addr: String,
    pub entity_id: u32,
    pub connected_secs: u64,
}

/// Reads the movement-only slice of world state into the wire snapshot.
/// Weapon/AI/zone content has no system wired up in this minimal registry,
/// so bullets/enemies/zones are always empty here — the fields exist in
/// `WorldSnapshot` for when gameplay content lands on top of this core.
fn build_snapshot(world: &World, server_time: f64, acks: &HashMap<Eid, u32>) -> WorldSnapshot {
    let mut snapshot = WorldSnapshot::new(world.tick(), server_time);

    for eid in world.player_eids() {
        let pos = world.positions.get(&eid).copied().unwrap_or_default();
        let player = world.players.get(&eid).copied().unwrap_or_default();
        let health = world.healths.get(&eid).copied().unwrap_or_default();
        let z = world.z_positions.get(&eid).copied().unwrap_or_default();

        let mut flags = 0u8;
        if world.dead.contains_key(&eid) {
            flags |= PlayerSnapshot::FLAG_DEAD;
        }
        if world.invincible.contains_key(&eid) {
            flags |= PlayerSnapshot::FLAG_INVINCIBLE;
        }

        snapshot.players.push(PlayerSnapshot {
            eid: eid.id() as u16,
            x: pos.x,
            y: pos.y,
            z: z.z,
            z_velocity: z.z_velocity,
            aim_angle: player.aim_angle,
            state: 0,
            hp: health.current.max(0) as u16,
            flags,
            last_processed_seq: acks.get(&eid).copied().unwrap_or(0),
            roll_elapsed_ms: 0,
            roll_duration_ms: 0,
            roll_dir_x: 0.0,
            roll_dir_y: 0.0,
            showdown_active: 0,
            showdown_target_eid: 0,
        });
    }

    snapshot
}
