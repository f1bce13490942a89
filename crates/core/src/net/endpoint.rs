use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::net::stats::NetworkStats;
use crate::protocol::{Packet, MAX_PACKET_SIZE};

const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Every UDP datagram is tagged with one leading byte so a receiver can
/// demux the rkyv-framed [`Packet`] control channel from the high-frequency
/// raw-bytes snapshot channel without guessing from content. The snapshot
/// channel exists because `WorldSnapshot` carries its own leading
/// protocol-version byte (see [`crate::protocol::decode_snapshot`]) and is
/// sent far more often than control messages, so it skips the generic
/// [`PacketHeader`](crate::protocol::PacketHeader) entirely.
const DATAGRAM_CONTROL: u8 = 0;
const DATAGRAM_SNAPSHOT: u8 = 1;

/// A demuxed inbound datagram, tagged by which channel it arrived on.
#[derive(Debug, Clone)]
pub enum Datagram {
    Control(Packet),
    /// Raw bytes for [`crate::protocol::decode_snapshot`], still carrying
    /// their own leading protocol-version byte.
    SnapshotBytes(Vec<u8>),
}

/// Thin non-blocking UDP wrapper. Connection lifecycle (join/resume/
/// reconnect) is owned by [`crate::session`], not by this type.
pub struct NetworkEndpoint {
    socket: UdpSocket,
    local_addr: SocketAddr,
    remote_addr: Option<SocketAddr>,
    stats: NetworkStats,
    recv_buffer: [u8; MAX_PACKET_SIZE],
    timeout: Duration,
    last_receive_time: Instant,
    running: Arc<AtomicBool>,
}

impl NetworkEndpoint {
    pub fn bind<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;

        let local_addr = socket.local_addr()?;

        Ok(Self {
            socket,
            local_addr,
            remote_addr: None,
            stats: NetworkStats::default(),
            recv_buffer: [0u8; MAX_PACKET_SIZE],
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            last_receive_time: Instant::now(),
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    pub fn set_remote(&mut self, addr: SocketAddr) {
        self.remote_addr = Some(addr);
    }

    pub fn stats(&self) -> &NetworkStats {
        &self.stats
    }

    pub fn send_to(&mut self, packet: &Packet, addr: SocketAddr) -> io::Result<usize> {
        let body = packet
            .serialize()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        self.send_tagged(DATAGRAM_CONTROL, &body, addr)
    }

    pub fn send(&mut self, packet: &Packet) -> io::Result<usize> {
        let addr = self.remote()?;
        self.send_to(packet, addr)
    }

    /// Sends an already-encoded, version-prefixed snapshot payload (see
    /// [`crate::protocol::encode_snapshot`]) on the raw snapshot channel.
    pub fn send_snapshot_to(&mut self, bytes: &[u8], addr: SocketAddr) -> io::Result<usize> {
        self.send_tagged(DATAGRAM_SNAPSHOT, bytes, addr)
    }

    pub fn send_snapshot(&mut self, bytes: &[u8]) -> io::Result<usize> {
        let addr = self.remote()?;
        self.send_snapshot_to(bytes, addr)
    }

    fn remote(&self) -> io::Result<SocketAddr> {
        self.remote_addr
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "no remote address set"))
    }

    fn send_tagged(&mut self, tag: u8, body: &[u8], addr: SocketAddr) -> io::Result<usize> {
        if body.len() + 1 > MAX_PACKET_SIZE {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("datagram exceeds MTU ({} > {MAX_PACKET_SIZE})", body.len() + 1),
            ));
        }
        let mut out = Vec::with_capacity(body.len() + 1);
        out.push(tag);
        out.extend_from_slice(body);

        let bytes = self.socket.send_to(&out, addr)?;
        self.stats.packets_sent += 1;
        self.stats.bytes_sent += bytes as u64;
        Ok(bytes)
    }

    pub fn receive(&mut self) -> io::Result<Vec<(Datagram, SocketAddr)>> {
        let mut datagrams = Vec::new();

        loop {
            match self.socket.recv_from(&mut self.recv_buffer) {
                Ok((size, addr)) => {
                    if size < 1 {
                        continue;
                    }
                    let tag = self.recv_buffer[0];
                    let body = &self.recv_buffer[1..size];

                    let datagram = match tag {
                        DATAGRAM_CONTROL => {
                            if body.len() < 16 {
                                continue;
                            }
                            match Packet::deserialize(body) {
                                Ok(packet) if packet.header.is_valid() => Datagram::Control(packet),
                                _ => continue,
                            }
                        }
                        DATAGRAM_SNAPSHOT => Datagram::SnapshotBytes(body.to_vec()),
                        _ => continue,
                    };

                    self.stats.packets_received += 1;
                    self.stats.bytes_received += size as u64;
                    self.last_receive_time = Instant::now();
                    datagrams.push((datagram, addr));
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e),
            }
        }

        Ok(datagrams)
    }

    pub fn is_timed_out(&self) -> bool {
        self.last_receive_time.elapsed() > self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn reset(&mut self) {
        self.stats = NetworkStats::default();
        self.last_receive_time = Instant::now();
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}
