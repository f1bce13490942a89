//! Round-trip ping sampling and a converged local-to-server time offset
//! estimate, gating whether the snapshot buffer may interpolate in
//! server-time mode.

const MIN_CONVERGED_SAMPLES: usize = 5;
const SAMPLE_WINDOW: usize = 16;

#[derive(Debug)]
pub struct ClockSync {
    offsets_ms: Vec<f64>,
    rtts_ms: Vec<f64>,
}

impl Default for ClockSync {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSync {
    pub fn new() -> Self {
        Self {
            offsets_ms: Vec::with_capacity(SAMPLE_WINDOW),
            rtts_ms: Vec::with_capacity(SAMPLE_WINDOW),
        }
    }

    /// `client_sent` is the local clock value when the ping was sent,
    /// `client_now` is the local clock value when the pong arrived, and
    /// `server_time` is the server's clock value echoed in the pong.
    pub fn on_pong(&mut self, client_sent: f64, client_now: f64, server_time: f64) {
        let rtt = client_now - client_sent;
        let midpoint = (client_sent + client_now) / 2.0;
        let offset = server_time - midpoint;

        if self.offsets_ms.len() == SAMPLE_WINDOW {
            self.offsets_ms.remove(0);
            self.rtts_ms.remove(0);
        }
        self.offsets_ms.push(offset);
        self.rtts_ms.push(rtt);
    }

    pub fn is_converged(&self) -> bool {
        self.offsets_ms.len() >= MIN_CONVERGED_SAMPLES
    }

    fn mean(samples: &[f64]) -> f64 {
        samples.iter().sum::<f64>() / samples.len() as f64
    }

    pub fn offset_ms(&self) -> f64 {
        if self.offsets_ms.is_empty() {
            0.0
        } else {
            Self::mean(&self.offsets_ms)
        }
    }

    pub fn get_server_time(&self, now_local: f64) -> f64 {
        now_local + self.offset_ms()
    }

    pub fn get_rtt_ms(&self) -> f64 {
        if self.rtts_ms.is_empty() {
            0.0
        } else {
            Self::mean(&self.rtts_ms)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_converged_before_min_samples() {
        let mut sync = ClockSync::new();
        for i in 0..4 {
            sync.on_pong(i as f64 * 100.0, i as f64 * 100.0 + 20.0, i as f64 * 100.0 + 1010.0);
        }
        assert!(!sync.is_converged());
    }

    #[test]
    fn converges_and_estimates_offset() {
        let mut sync = ClockSync::new();
        for i in 0..8 {
            let sent = i as f64 * 100.0;
            let now = sent + 20.0;
            let server = now - 10.0 + 1000.0;
            sync.on_pong(sent, now, server);
        }
        assert!(sync.is_converged());
        assert!((sync.offset_ms() - 1000.0).abs() < 1.0);
        assert!((sync.get_rtt_ms() - 20.0).abs() < 1e-6);
    }
}
