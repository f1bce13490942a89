//! Counters for the multiplayer pipeline, surfaced as a single overlay
//! string and a throttled log line so a live session is legible without
//! spamming the log at 60 Hz.

use std::time::Duration;

const LOG_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Default, Clone, Copy)]
pub struct MultiplayerTelemetry {
    pub snapshots_received: u64,
    pub snapshots_applied: u64,
    pub snapshots_dropped: u64,
    pub entity_overwrites: u64,
    pub reconciliation_corrections: u64,
    pub reconciliation_snaps: u64,
    pub predicted_bullets_spawned: u64,
    pub predicted_bullets_matched: u64,
    pub predicted_bullets_timed_out: u64,

    last_logged: Option<MultiplayerTelemetrySnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MultiplayerTelemetrySnapshot {
    snapshots_received: u64,
    snapshots_applied: u64,
    snapshots_dropped: u64,
    entity_overwrites: u64,
    reconciliation_corrections: u64,
    reconciliation_snaps: u64,
    predicted_bullets_spawned: u64,
    predicted_bullets_matched: u64,
    predicted_bullets_timed_out: u64,
}

impl MultiplayerTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    fn snapshot(&self) -> MultiplayerTelemetrySnapshot {
        MultiplayerTelemetrySnapshot {
            snapshots_received: self.snapshots_received,
            snapshots_applied: self.snapshots_applied,
            snapshots_dropped: self.snapshots_dropped,
            entity_overwrites: self.entity_overwrites,
            reconciliation_corrections: self.reconciliation_corrections,
            reconciliation_snaps: self.reconciliation_snaps,
            predicted_bullets_spawned: self.predicted_bullets_spawned,
            predicted_bullets_matched: self.predicted_bullets_matched,
            predicted_bullets_timed_out: self.predicted_bullets_timed_out,
        }
    }

    pub fn overlay_text(&self) -> String {
        format!(
            "snaps rx/applied/dropped: {}/{}/{} | overwrites: {} | corrections/snaps: {}/{} | bullets spawned/matched/timeout: {}/{}/{}",
            self.snapshots_received,
            self.snapshots_applied,
            self.snapshots_dropped,
            self.entity_overwrites,
            self.reconciliation_corrections,
            self.reconciliation_snaps,
            self.predicted_bullets_spawned,
            self.predicted_bullets_matched,
            self.predicted_bullets_timed_out,
        )
    }

    /// Logs at most once per [`LOG_INTERVAL`], and only if some counter has
    /// advanced since the last emission.
    pub fn maybe_log(&mut self, elapsed_since_last_check: &mut Duration, dt: Duration) {
        *elapsed_since_last_check += dt;
        if *elapsed_since_last_check < LOG_INTERVAL {
            return;
        }
        *elapsed_since_last_check = Duration::ZERO;

        let current = self.snapshot();
        if self.last_logged != Some(current) {
            log::info!("multiplayer telemetry: {}", self.overlay_text());
            self.last_logged = Some(current);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_reflects_counters() {
        let mut telemetry = MultiplayerTelemetry::new();
        telemetry.snapshots_received = 10;
        telemetry.reconciliation_snaps = 1;
        let text = telemetry.overlay_text();
        assert!(text.contains("10"));
    }

    #[test]
    fn logs_only_when_advanced_past_interval() {
        let mut telemetry = MultiplayerTelemetry::new();
        let mut elapsed = Duration::ZERO;
        telemetry.maybe_log(&mut elapsed, Duration::from_secs(1));
        assert_eq!(elapsed, Duration::from_secs(1));
        telemetry.snapshots_received = 1;
        telemetry.maybe_log(&mut elapsed, Duration::from_secs(5));
        assert_eq!(elapsed, Duration::ZERO);
    }
}
