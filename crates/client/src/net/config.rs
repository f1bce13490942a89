use ricochet_core::snapshot_buffer::DEFAULT_INTERPOLATION_DELAY_MS;

/// Runtime-tunable connection knobs. Everything tick-rate/protocol related
/// stays a `const` in `ricochet_core`; this only covers what an operator or
/// a `--flag` might reasonably want to override per-run.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_addr: String,
    pub interpolation_delay_ms: f64,
    pub ping_interval_secs: f32,
    pub character_id: u16,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: format!("127.0.0.1:{}", ricochet_core::DEFAULT_PORT),
            interpolation_delay_ms: DEFAULT_INTERPOLATION_DELAY_MS,
            ping_interval_secs: 1.0,
            character_id: 0,
        }
    }
}
