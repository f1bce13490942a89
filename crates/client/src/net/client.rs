use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use glam::Vec3;

use ricochet_core::world::Eid;
use ricochet_core::{
    default_character_class_resolver, default_character_resolver, ClockSync, GameEvent, HudState,
    IdMaps, IngestContext, JoinOptions, MultiplayerTelemetry, NetworkEndpoint, NetworkInput,
    NoUpgrades, NullSpatialHash, NullTokenStore, PredictedEntityTracker, RecordingSink,
    RosterTable, Session, SessionEvent, SessionState, SnapshotIngestor, SpatialHash, World,
    WorldSnapshot,
};

use super::config::ClientConfig;
use super::input::InputState;
use super::interpolation::{collect_render_entities, RemoteInterpolation, RenderEntity};
use super::prediction::ClientPrediction;

/// Owns one player's connection to a server: the `Session` handshake and
/// keepalive, the locally-simulated world, and the collaborators that turn
/// raw snapshots into a render-ready, reconciled scene. `NetworkClient::new`
/// only prepares configuration; `connect` performs the (blocking) join.
pub struct NetworkClient {
    config: ClientConfig,
    session: Option<Session>,
    token_store: NullTokenStore,
    clock_sync: ClockSync,

    world: World,
    maps: IdMaps,
    reverse_players: HashMap<Eid, u16>,
    reverse_bullets: HashMap<Eid, u16>,
    reverse_enemies: HashMap<Eid, u16>,
    last_enemy_server_hp: HashMap<Eid, u16>,
    last_enemy_server_time: HashMap<Eid, f64>,
    tracker: PredictedEntityTracker,
    roster: RosterTable,
    ingestor: SnapshotIngestor,
    spatial_hash: Box<dyn SpatialHash>,

    prediction: ClientPrediction,
    remote_interp: RemoteInterpolation,

    my_server_eid: u16,
    my_client_eid: Option<Eid>,
    local_character_id: u16,

    next_seq: u32,
    start_time: Instant,
    last_ping_sent_ms: f64,
    latest_hud: Option<HudState>,

    telemetry: MultiplayerTelemetry,
    telemetry_elapsed: Duration,
    pending_events: Vec<GameEvent>,
    running: bool,
}

impl NetworkClient {
    pub fn new(config: ClientConfig) -> std::io::Result<Self> {
        let interpolation_delay_ms = config.interpolation_delay_ms;
        Ok(Self {
            config,
            session: None,
            token_store: NullTokenStore,
            clock_sync: ClockSync::new(),
            world: World::new(),
            maps: IdMaps::default(),
            reverse_players: HashMap::new(),
            reverse_bullets: HashMap::new(),
            reverse_enemies: HashMap::new(),
            last_enemy_server_hp: HashMap::new(),
            last_enemy_server_time: HashMap::new(),
            tracker: PredictedEntityTracker::new(),
            roster: RosterTable::default(),
            ingestor: SnapshotIngestor::new(),
            spatial_hash: Box::new(NullSpatialHash),
            prediction: ClientPrediction::new(),
            remote_interp: RemoteInterpolation::new(interpolation_delay_ms),
            my_server_eid: 0,
            my_client_eid: None,
            local_character_id: 0,
            next_seq: 0,
            start_time: Instant::now(),
            last_ping_sent_ms: 0.0,
            latest_hud: None,
            telemetry: MultiplayerTelemetry::new(),
            telemetry_elapsed: Duration::ZERO,
            pending_events: Vec::new(),
            running: false,
        })
    }

    /// Binds an ephemeral socket and blocks until the join/resume handshake
    /// resolves or times out.
    pub fn connect(&mut self, server_addr: SocketAddr) -> std::io::Result<()> {
        let endpoint = NetworkEndpoint::bind("0.0.0.0:0")?;
        let mut session = Session::new(endpoint, server_addr);

        let cfg = session
            .join(
                JoinOptions {
                    character_id: self.config.character_id,
                },
                &mut self.token_store,
            )
            .map_err(|e| std::io::Error::other(format!("join failed: {e}")))?;

        self.my_server_eid = cfg.player_eid;
        self.local_character_id = cfg.character_id;
        self.session = Some(session);
        self.start_time = Instant::now();
        self.running = true;
        Ok(())
    }

    pub fn disconnect(&mut self) -> std::io::Result<()> {
        self.shutdown();
        Ok(())
    }

    pub fn state(&self) -> SessionState {
        self.session.as_ref().map_or(SessionState::Idle, |s| s.state())
    }

    pub fn is_connected(&self) -> bool {
        self.state() == SessionState::Ready
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn entity_id(&self) -> Option<Eid> {
        self.my_client_eid
    }

    pub fn hud(&self) -> Option<&HudState> {
        self.latest_hud.as_ref()
    }

    pub fn telemetry_text(&self) -> String {
        self.telemetry.overlay_text()
    }

    pub fn rtt_ms(&self) -> f32 {
        self.clock_sync.get_rtt_ms() as f32
    }

    /// Drains presentation events raised since the last call: fire cues, hit
    /// flashes, level-ups, and the terminal lifecycle events.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// World-space render position: the predicted local position plus the
    /// reconciler's residual visual error, so a correction settles in
    /// smoothly instead of popping. Mapped into the demo camera's Y-up
    /// convention with a fixed eye height.
    pub fn predicted_position(&self) -> Vec3 {
        let Some(eid) = self.my_client_eid else {
            return Vec3::new(0.0, 1.0, 0.0);
        };
        let (err_x, err_y) = self.prediction.error();
        match self.world.positions.get(&eid) {
            Some(pos) => {
                let z = self.world.z_positions.get(&eid).map(|z| z.z).unwrap_or(0.0);
                Vec3::new(pos.x + err_x, 1.0 + z, pos.y + err_y)
            }
            None => Vec3::new(0.0, 1.0, 0.0),
        }
    }

    pub fn entities(&self) -> Vec<RenderEntity> {
        collect_render_entities(&self.world, &self.maps, self.my_client_eid)
    }

    pub fn shutdown(&mut self) {
        if let Some(session) = &mut self.session {
            session.leave(&mut self.token_store);
        }
        self.session = None;
        self.running = false;
    }

    /// Drains the session, applies snapshots and reconciliation, predicts
    /// the local player one tick if `input` is given, and advances remote
    /// interpolation. Call once per frame, connected or not.
    pub fn update(&mut self, dt: f32, input: Option<&InputState>) -> anyhow::Result<()> {
        let Some(mut session) = self.session.take() else {
            return Ok(());
        };

        let now = Instant::now();
        let now_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;

        let events = session.update(now, &mut self.token_store);
        for event in events {
            self.handle_session_event(event, now_ms);
        }

        self.prediction.decay_error(dt);

        let ping_interval_ms = self.config.ping_interval_secs as f64 * 1000.0;
        if now_ms - self.last_ping_sent_ms >= ping_interval_ms {
            session.send_ping(now_ms as u64);
            self.last_ping_sent_ms = now_ms;
        }

        if let (Some(input), Some(my_eid)) = (input, self.my_client_eid) {
            self.predict_local_tick(&mut session, input, my_eid, now_ms);
        }

        let server_time_now = self
            .clock_sync
            .is_converged()
            .then(|| self.clock_sync.get_server_time(now_ms));
        self.remote_interp.apply(
            &mut self.world,
            &self.maps,
            self.my_client_eid,
            &self.tracker,
            now_ms,
            server_time_now,
        );

        self.telemetry
            .maybe_log(&mut self.telemetry_elapsed, Duration::from_secs_f32(dt));

        self.session = Some(session);
        if self.state() == SessionState::Closed {
            self.running = false;
        }
        Ok(())
    }

    fn predict_local_tick(
        &mut self,
        session: &mut Session,
        input: &InputState,
        my_eid: Eid,
        now_ms: f64,
    ) {
        let net_input = NetworkInput {
            seq: self.next_seq,
            client_tick: self.prediction.tick(),
            client_time_ms: now_ms as u64,
            estimated_server_time_ms: self.clock_sync.get_server_time(now_ms),
            view_interp_delay_ms: self.config.interpolation_delay_ms as u32,
            shoot_seq: self.next_seq,
            buttons: input.buttons(),
            aim_angle: input.aim_angle,
            move_x: input.move_x,
            move_y: input.move_y,
            cursor_world_x: input.cursor_world_x,
            cursor_world_y: input.cursor_world_y,
        };
        self.next_seq = self.next_seq.wrapping_add(1);
        session.send_input(net_input);

        let mut sink = RecordingSink::default();
        self.prediction
            .predict_tick(&mut self.world, my_eid, net_input, &mut sink);
        self.pending_events.extend(sink.events);

        let spawned =
            self.tracker
                .detect_new_predicted_bullets(&self.world, my_eid, net_input.client_tick);
        self.telemetry.predicted_bullets_spawned += spawned as u64;
    }

    fn handle_session_event(&mut self, event: SessionEvent, now_ms: f64) {
        match event {
            SessionEvent::GameConfig(cfg) => {
                self.my_server_eid = cfg.player_eid;
                self.local_character_id = cfg.character_id;
            }
            SessionEvent::PlayerRoster(entries) => {
                for entry in entries {
                    self.roster.set(entry.eid, entry.character_id);
                }
            }
            SessionEvent::Snapshot(snapshot) => self.handle_snapshot(snapshot, now_ms),
            SessionEvent::Hud(hud) => self.latest_hud = Some(hud),
            SessionEvent::Pong {
                client_time_ms,
                server_time_ms,
            } => {
                self.clock_sync
                    .on_pong(client_time_ms as f64, now_ms, server_time_ms);
            }
            SessionEvent::SelectNodeResult { .. } => {}
            SessionEvent::IncompatibleProtocol { reason } => {
                log::error!("server rejected protocol: {reason}");
                self.pending_events.push(GameEvent::IncompatibleProtocol);
            }
            SessionEvent::Disconnect => {
                log::info!("disconnected from server");
                self.pending_events.push(GameEvent::Disconnect);
            }
        }
    }

    fn handle_snapshot(&mut self, snapshot: WorldSnapshot, now_ms: f64) {
        self.telemetry.snapshots_received += 1;
        self.remote_interp.push(snapshot.clone(), now_ms);

        let mut sink = RecordingSink::default();
        {
            let mut ctx = IngestContext {
                world: &mut self.world,
                maps: &mut self.maps,
                reverse_players: &mut self.reverse_players,
                reverse_bullets: &mut self.reverse_bullets,
                reverse_enemies: &mut self.reverse_enemies,
                tracker: &mut self.tracker,
                my_server_eid: self.my_server_eid,
                my_client_eid: &mut self.my_client_eid,
                roster: &self.roster,
                local_character_id: self.local_character_id,
                character_resolver: default_character_resolver,
                character_class_resolver: default_character_class_resolver,
                local_upgrade_state: &NoUpgrades,
                current_rtt_ms: self.clock_sync.get_rtt_ms() as f32,
                last_enemy_server_hp: &mut self.last_enemy_server_hp,
                last_enemy_server_time: &mut self.last_enemy_server_time,
            };
            let stats = self.ingestor.apply(&snapshot, &mut ctx, &mut sink);
            self.telemetry.entity_overwrites += stats.entity_overwrites;
            self.telemetry.predicted_bullets_matched += stats.bullets_matched;
            self.telemetry.predicted_bullets_timed_out += stats.bullets_timed_out;
        }
        self.telemetry.snapshots_applied += 1;

        let positions: Vec<(Eid, f32, f32)> = self
            .world
            .positions
            .iter()
            .map(|(&eid, pos)| (eid, pos.x, pos.y))
            .collect();
        self.spatial_hash.rebuild(&positions);

        if let Some(my_eid) = self.my_client_eid {
            let sample = self.prediction.reconcile(
                &mut self.world,
                &snapshot.players,
                self.my_server_eid,
                my_eid,
                &mut sink,
            );
            if sample.snapped {
                self.telemetry.reconciliation_snaps += 1;
            } else if sample.had_correction {
                self.telemetry.reconciliation_corrections += 1;
            }
        }

        self.pending_events.extend(sink.events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_client_is_idle_until_connected() {
        let config = ClientConfig::default();
        let client = NetworkClient::new(config);
        assert!(client.is_ok());

        let client = client.unwrap();
        assert_eq!(client.state(), SessionState::Idle);
        assert!(!client.is_connected());
    }
}
