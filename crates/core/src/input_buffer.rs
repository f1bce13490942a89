//! Client-side ring of unacknowledged inputs, replayed during reconciliation
//! and re-sent until the server acknowledges them.

use crate::protocol::{sequence_greater_than, NetworkInput};

const DEFAULT_CAPACITY: usize = 128;

/// Strictly-increasing-`seq` buffer of pending inputs. Acknowledgement drops
/// everything up to and including the acked sequence via a single binary
/// search rather than a linear scan.
#[derive(Debug)]
pub struct InputBuffer {
    capacity: usize,
    entries: Vec<NetworkInput>,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Appends `input`. Panics in debug builds if `seq` does not strictly
    /// increase, since the reconciler's replay assumes sorted order.
    pub fn push(&mut self, input: NetworkInput) {
        debug_assert!(
            self.entries.last().is_none_or(|last| input.seq > last.seq),
            "input seq must strictly increase"
        );
        if self.entries.len() == self.capacity {
            self.entries.remove(0);
        }
        self.entries.push(input);
    }

    /// Drops every entry whose `seq` is `<= acked_seq`, using binary search
    /// since entries are sorted by `seq`.
    pub fn acknowledge_up_to(&mut self, acked_seq: u32) {
        let cut = self
            .entries
            .partition_point(|input| !sequence_greater_than(input.seq, acked_seq));
        self.entries.drain(..cut);
    }

    pub fn pending(&self) -> &[NetworkInput] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn latest(&self) -> Option<&NetworkInput> {
        self.entries.last()
    }
}

impl Default for InputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::Buttons;

    fn input(seq: u32) -> NetworkInput {
        NetworkInput {
            seq,
            client_tick: seq,
            client_time_ms: seq as u64 * 16,
            estimated_server_time_ms: 0.0,
            view_interp_delay_ms: 100,
            shoot_seq: 0,
            buttons: Buttons::empty(),
            aim_angle: 0.0,
            move_x: 0.0,
            move_y: 0.0,
            cursor_world_x: 0.0,
            cursor_world_y: 0.0,
        }
    }

    #[test]
    fn acknowledge_drops_only_up_to_and_including() {
        let mut buf = InputBuffer::new();
        for seq in 1..=5 {
            buf.push(input(seq));
        }
        buf.acknowledge_up_to(3);
        let remaining: Vec<u32> = buf.pending().iter().map(|i| i.seq).collect();
        assert_eq!(remaining, vec![4, 5]);
    }

    #[test]
    fn acknowledge_handles_wraparound() {
        let mut buf = InputBuffer::new();
        buf.push(input(u32::MAX - 1));
        buf.push(input(u32::MAX));
        buf.push(input(0));
        buf.push(input(1));
        buf.acknowledge_up_to(u32::MAX);
        let remaining: Vec<u32> = buf.pending().iter().map(|i| i.seq).collect();
        assert_eq!(remaining, vec![0, 1]);
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut buf = InputBuffer::with_capacity(3);
        for seq in 1..=5 {
            buf.push(input(seq));
        }
        let remaining: Vec<u32> = buf.pending().iter().map(|i| i.seq).collect();
        assert_eq!(remaining, vec![3, 4, 5]);
    }
}
