use std::collections::VecDeque;
use std::net::SocketAddr;
use std::time::Instant;

use ricochet_core::{Eid, NetworkInput};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    Disconnecting,
}

/// Server-side record of one joined client. Unlike [`ricochet_core::Session`]
/// (the client's state machine), the server never suspends or reconnects on
/// a client's behalf — it just tracks the bookkeeping needed to answer
/// resume requests and keep per-tick send/ack state.
pub struct ClientConnection {
    pub client_id: u32,
    pub addr: SocketAddr,
    pub eid: Eid,
    pub character_id: u16,
    pub reconnect_token: u64,
    pub state: ConnectionState,
    pub send_seq: u32,
    pub last_ack_sent: u32,
    pub last_processed_seq: u32,
    pub highest_enqueued_seq: Option<u32>,
    pub last_receive_time: Instant,
    pub inbox: VecDeque<NetworkInput>,
}

impl ClientConnection {
    pub fn new(
        client_id: u32,
        addr: SocketAddr,
        eid: Eid,
        character_id: u16,
        reconnect_token: u64,
    ) -> Self {
        Self {
            client_id,
            addr,
            eid,
            character_id,
            reconnect_token,
            state: ConnectionState::Connected,
            send_seq: 0,
            last_ack_sent: 0,
            last_processed_seq: 0,
            highest_enqueued_seq: None,
            last_receive_time: Instant::now(),
            inbox: VecDeque::new(),
        }
    }

    pub fn touch(&mut self) {
        self.last_receive_time = Instant::now();
    }

    /// Queues `input` if it is newer than anything already seen from this
    /// client, using wraparound-safe sequence comparison; stale retransmits
    /// and duplicates are dropped.
    pub fn push_input(&mut self, input: NetworkInput) {
        let is_new = match self.highest_enqueued_seq {
            Some(highest) => ricochet_core::sequence_greater_than(input.seq, highest),
            None => true,
        };
        if is_new {
            self.highest_enqueued_seq = Some(input.seq);
            self.inbox.push_back(input);
        }
    }
}
