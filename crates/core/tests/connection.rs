//! End-to-end session tests over real UDP loopback sockets: join/resume,
//! protocol-mismatch rejection, and ping/pong round trips through
//! [`ricochet_core::Session`] against a hand-rolled stand-in server that
//! only speaks enough of the protocol to drive the client state machine.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use ricochet_core::{
    ClientOrServerMessage, Datagram, GameConfig, JoinOptions, NetError, NetworkEndpoint,
    NullTokenStore, Packet, PacketHeader, ReconnectTokenStore, ServerMessage, Session,
    SessionState, PROTOCOL_VERSION,
};

static PORT_COUNTER: AtomicU16 = AtomicU16::new(41000);

fn next_port() -> u16 {
    PORT_COUNTER.fetch_add(10, Ordering::SeqCst)
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

fn wait_for_control(
    endpoint: &mut NetworkEndpoint,
    timeout_ms: u64,
) -> Option<(Packet, SocketAddr)> {
    let start = Instant::now();
    while start.elapsed() < Duration::from_millis(timeout_ms) {
        for (datagram, addr) in endpoint.receive().unwrap() {
            if let Datagram::Control(packet) = datagram {
                return Some((packet, addr));
            }
        }
        thread::sleep(Duration::from_millis(1));
    }
    None
}

fn send_server_message(
    endpoint: &mut NetworkEndpoint,
    to: SocketAddr,
    msg: ServerMessage,
) {
    let header = PacketHeader::new(0, 0, 0);
    let packet = Packet::server(header, msg);
    endpoint.send_to(&packet, to).unwrap();
}

fn game_config(player_eid: u16, reconnect_token: u64) -> GameConfig {
    GameConfig {
        seed: 7,
        session_id: 1,
        player_eid,
        character_id: 3,
        reconnect_token,
    }
}

#[test]
fn join_resolves_on_game_config() {
    let port = next_port();
    let server_addr: SocketAddr = format!("127.0.0.1:{port}").parse().unwrap();
    let client_addr: SocketAddr = format!("127.0.0.1:{}", port + 1).parse().unwrap();

    let mut server_endpoint = NetworkEndpoint::bind(server_addr).unwrap();
    let client_endpoint = NetworkEndpoint::bind(client_addr).unwrap();

    let server_thread = thread::spawn(move || {
        let (packet, from) = wait_for_control(&mut server_endpoint, 500).expect("no join request");
        assert!(matches!(
            packet.message,
            ClientOrServerMessage::Client(ricochet_core::ClientMessage::JoinRequest {
                protocol_version: PROTOCOL_VERSION,
                ..
            })
        ));
        send_server_message(&mut server_endpoint, from, ServerMessage::GameConfig(game_config(9, 42)));
    });

    let mut session = Session::new(client_endpoint, server_addr);
    let mut token_store = NullTokenStore;
    let cfg = session
        .join(JoinOptions { character_id: 3 }, &mut token_store)
        .expect("join should succeed");

    assert_eq!(cfg.player_eid, 9);
    assert_eq!(cfg.reconnect_token, 42);
    assert_eq!(session.state(), SessionState::Ready);
    server_thread.join().unwrap();
}

#[test]
fn stale_resume_falls_back_to_fresh_join() {
    let port = next_port();
    let server_addr: SocketAddr = format!("127.0.0.1:{port}").parse().unwrap();
    let client_addr: SocketAddr = format!("127.0.0.1:{}", port + 1).parse().unwrap();

    let mut server_endpoint = NetworkEndpoint::bind(server_addr).unwrap();
    let client_endpoint = NetworkEndpoint::bind(client_addr).unwrap();

    let server_thread = thread::spawn(move || {
        let (packet, from) = wait_for_control(&mut server_endpoint, 500).expect("no resume request");
        assert!(matches!(
            packet.message,
            ClientOrServerMessage::Client(ricochet_core::ClientMessage::ResumeRequest { token: 77, .. })
        ));
        // Server rejects the stale resume...
        send_server_message(&mut server_endpoint, from, ServerMessage::Disconnect);

        let (packet, from) = wait_for_control(&mut server_endpoint, 500).expect("no fresh join request");
        assert!(matches!(
            packet.message,
            ClientOrServerMessage::Client(ricochet_core::ClientMessage::JoinRequest { .. })
        ));
        // ...and accepts the fresh join that follows.
        send_server_message(&mut server_endpoint, from, ServerMessage::GameConfig(game_config(5, 100)));
    });

    let mut session = Session::new(client_endpoint, server_addr);
    let mut token_store = InMemoryTokenStore { token: Some(77) };
    let cfg = session
        .join(JoinOptions { character_id: 0 }, &mut token_store)
        .expect("join should succeed after stale resume");

    assert_eq!(cfg.player_eid, 5);
    // The fresh join's token replaces the stale one.
    assert_eq!(token_store.load(), Some(100));
    server_thread.join().unwrap();
}

#[test]
fn protocol_mismatch_during_join_is_a_terminal_error() {
    let port = next_port();
    let server_addr: SocketAddr = format!("127.0.0.1:{port}").parse().unwrap();
    let client_addr: SocketAddr = format!("127.0.0.1:{}", port + 1).parse().unwrap();

    let mut server_endpoint = NetworkEndpoint::bind(server_addr).unwrap();
    let client_endpoint = NetworkEndpoint::bind(client_addr).unwrap();

    let server_thread = thread::spawn(move || {
        let (_packet, from) = wait_for_control(&mut server_endpoint, 500).expect("no join request");
        send_server_message(
            &mut server_endpoint,
            from,
            ServerMessage::IncompatibleProtocol {
                reason: "server is on a newer protocol".into(),
            },
        );
    });

    let mut session = Session::new(client_endpoint, server_addr);
    let mut token_store = NullTokenStore;
    let err = session
        .join(JoinOptions { character_id: 0 }, &mut token_store)
        .expect_err("join must fail on protocol mismatch");

    assert!(matches!(err, NetError::ProtocolMismatch { .. }));
    assert_eq!(session.state(), SessionState::Closed);
    server_thread.join().unwrap();
}

#[test]
fn ping_pong_round_trip_resolves_as_a_session_event() {
    let port = next_port();
    let server_addr: SocketAddr = format!("127.0.0.1:{port}").parse().unwrap();
    let client_addr: SocketAddr = format!("127.0.0.1:{}", port + 1).parse().unwrap();

    let mut server_endpoint = NetworkEndpoint::bind(server_addr).unwrap();
    let client_endpoint = NetworkEndpoint::bind(client_addr).unwrap();

    let mut session = Session::new(client_endpoint, server_addr);
    session.send_ping(1234);

    let (packet, from) = wait_for_control(&mut server_endpoint, 500).expect("no ping received");
    assert!(matches!(
        packet.message,
        ClientOrServerMessage::Client(ricochet_core::ClientMessage::Ping { client_time_ms: 1234 })
    ));
    send_server_message(
        &mut server_endpoint,
        from,
        ServerMessage::Pong {
            client_time_ms: 1234,
            server_time_ms: 5000.0,
        },
    );

    // Give the datagram time to land before `update` drains the socket.
    thread::sleep(Duration::from_millis(20));
    let events = session.update(Instant::now(), &mut NullTokenStore);
    assert!(events.iter().any(|e| matches!(
        e,
        ricochet_core::SessionEvent::Pong { client_time_ms: 1234, server_time_ms } if *server_time_ms == 5000.0
    )));
}

#[test]
fn multiple_sessions_can_join_the_same_server_address_independently() {
    // Exercises that `Session` state is per-instance: three independent
    // client sessions join against three independent stand-in servers
    // without sharing reconnect/backoff state.
    for _ in 0..3 {
        let port = next_port();
        let server_addr: SocketAddr = format!("127.0.0.1:{port}").parse().unwrap();
        let client_addr: SocketAddr = format!("127.0.0.1:{}", port + 1).parse().unwrap();

        let mut server_endpoint = NetworkEndpoint::bind(server_addr).unwrap();
        let client_endpoint = NetworkEndpoint::bind(client_addr).unwrap();

        let server_thread = thread::spawn(move || {
            let (_packet, from) =
                wait_for_control(&mut server_endpoint, 500).expect("no join request");
            send_server_message(
                &mut server_endpoint,
                from,
                ServerMessage::GameConfig(game_config(1, 1)),
            );
        });

        let mut session = Session::new(client_endpoint, server_addr);
        let mut token_store = NullTokenStore;
        session
            .join(JoinOptions { character_id: 0 }, &mut token_store)
            .expect("independent join should succeed");
        assert_eq!(session.state(), SessionState::Ready);
        server_thread.join().unwrap();
    }
}
