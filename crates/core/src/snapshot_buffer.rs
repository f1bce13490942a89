//! Bounded timestamped buffer feeding bracketed interpolation. Entries carry
//! both the server's own timestamp and the local receive time, since
//! interpolation runs in whichever domain clock sync currently supports.

use crate::protocol::WorldSnapshot;

pub const CAPACITY: usize = 5;
pub const DEFAULT_INTERPOLATION_DELAY_MS: f64 = 100.0;

#[derive(Debug, Clone)]
pub struct SnapshotEntry {
    pub snapshot: WorldSnapshot,
    pub receive_time_local: f64,
    pub server_time: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolationState {
    pub from_index: usize,
    pub to_index: usize,
    pub alpha: f32,
}

#[derive(Debug, Default)]
pub struct SnapshotBuffer {
    entries: std::collections::VecDeque<SnapshotEntry>,
}

impl SnapshotBuffer {
    pub fn new() -> Self {
        Self {
            entries: std::collections::VecDeque::with_capacity(CAPACITY),
        }
    }

    pub fn push(&mut self, snapshot: WorldSnapshot, receive_time_local: f64) {
        let server_time = snapshot.server_time;
        if self.entries.len() == CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(SnapshotEntry {
            snapshot,
            receive_time_local,
            server_time,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&SnapshotEntry> {
        self.entries.back()
    }

    pub fn get(&self, index: usize) -> Option<&SnapshotEntry> {
        self.entries.get(index)
    }

    /// `server_time_now` is `Some` iff clock sync has converged; the two
    /// domains are never mixed within a single bracket computation.
    pub fn get_interpolation_state(
        &self,
        now_local: f64,
        server_time_now: Option<f64>,
        interpolation_delay_ms: f64,
    ) -> Option<InterpolationState> {
        if self.entries.len() < 2 {
            return None;
        }

        let use_server_time = server_time_now.is_some();
        let render_time = server_time_now.unwrap_or(now_local) - interpolation_delay_ms;

        let timestamp = |e: &SnapshotEntry| -> f64 {
            if use_server_time {
                e.server_time
            } else {
                e.receive_time_local
            }
        };

        let n = self.entries.len();
        let last_idx = self
            .entries
            .iter()
            .enumerate()
            .rev()
            .find(|(_, e)| timestamp(e) <= render_time)
            .map(|(i, _)| i);

        let Some(last_idx) = last_idx else {
            return Some(InterpolationState {
                from_index: 0,
                to_index: 1,
                alpha: 0.0,
            });
        };

        if last_idx == n - 1 {
            return Some(InterpolationState {
                from_index: n - 2,
                to_index: n - 1,
                alpha: 1.0,
            });
        }

        let from = &self.entries[last_idx];
        let to = &self.entries[last_idx + 1];
        let from_t = timestamp(from);
        let to_t = timestamp(to);

        let alpha = if to_t == from_t {
            1.0
        } else {
            (((render_time - from_t) / (to_t - from_t)) as f32).clamp(0.0, 1.0)
        };

        Some(InterpolationState {
            from_index: last_idx,
            to_index: last_idx + 1,
            alpha,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(tick: u32, server_time: f64) -> WorldSnapshot {
        WorldSnapshot::new(tick, server_time)
    }

    #[test]
    fn mid_bracket_interpolation() {
        let mut buf = SnapshotBuffer::new();
        buf.push(snap(1, 1000.0), 1000.0);
        buf.push(snap(2, 1050.0), 1050.0);
        buf.push(snap(3, 1100.0), 1100.0);

        let state = buf
            .get_interpolation_state(1075.0, Some(1075.0), 0.0)
            .unwrap();
        assert_eq!(buf.get(state.from_index).unwrap().snapshot.tick, 2);
        assert_eq!(buf.get(state.to_index).unwrap().snapshot.tick, 3);
        assert!((state.alpha - 0.5).abs() < 1e-4);
    }

    #[test]
    fn eviction_keeps_last_n() {
        let mut buf = SnapshotBuffer::new();
        for tick in 0..=6u32 {
            buf.push(snap(tick, 1000.0 + 50.0 * tick as f64), 1000.0 + 50.0 * tick as f64);
        }
        assert_eq!(buf.len(), CAPACITY);
        assert_eq!(buf.latest().unwrap().snapshot.tick, 6);

        let state = buf
            .get_interpolation_state(1250.0, Some(1250.0), 0.0)
            .unwrap();
        assert!(buf.get(state.from_index).unwrap().snapshot.tick >= 2);
    }

    #[test]
    fn equal_timestamps_produce_alpha_one() {
        let mut buf = SnapshotBuffer::new();
        buf.push(snap(1, 1000.0), 1000.0);
        buf.push(snap(2, 1000.0), 1000.0);

        let state = buf
            .get_interpolation_state(1000.0, Some(1000.0), 0.0)
            .unwrap();
        assert_eq!(state.alpha, 1.0);
    }

    #[test]
    fn fewer_than_two_entries_returns_none() {
        let mut buf = SnapshotBuffer::new();
        assert!(buf.get_interpolation_state(0.0, Some(0.0), 0.0).is_none());
        buf.push(snap(1, 1000.0), 1000.0);
        assert!(buf.get_interpolation_state(1000.0, Some(1000.0), 0.0).is_none());
    }

    #[test]
    fn monotonic_alpha_within_bracket() {
        let mut buf = SnapshotBuffer::new();
        buf.push(snap(1, 1000.0), 1000.0);
        buf.push(snap(2, 1100.0), 1100.0);

        let a1 = buf
            .get_interpolation_state(1020.0, Some(1020.0), 0.0)
            .unwrap()
            .alpha;
        let a2 = buf
            .get_interpolation_state(1080.0, Some(1080.0), 0.0)
            .unwrap()
            .alpha;
        assert!(a1 <= a2);
    }
}
