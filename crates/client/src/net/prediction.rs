//! Wraps the core's prediction/reconciliation collaborators: the local
//! player advances every frame through [`LocalPlayerDriver`], and every
//! authoritative snapshot rewinds-and-replays through [`Reconciler`].

use ricochet_core::world::Eid;
use ricochet_core::{
    GameplayEventSink, InputBuffer, LocalPlayerDriver, NetworkInput, PlayerSnapshot,
    ReconcileSample, Reconciler, World,
};

const EPSILON: f32 = ricochet_core::reconciler::DEFAULT_EPSILON;
const SNAP_THRESHOLD: f32 = ricochet_core::reconciler::DEFAULT_SNAP_THRESHOLD;
const CORRECTION_SPEED: f32 = ricochet_core::reconciler::DEFAULT_CORRECTION_SPEED;

pub struct ClientPrediction {
    driver: LocalPlayerDriver,
    input_buffer: InputBuffer,
    reconciler: Reconciler,
    tick: u32,
}

impl ClientPrediction {
    pub fn new() -> Self {
        Self {
            driver: LocalPlayerDriver::new(crate::net::simulation::build_registry()),
            input_buffer: InputBuffer::new(),
            reconciler: Reconciler::new(),
            tick: 0,
        }
    }

    /// Predicts one tick for the local player and appends `input` to the
    /// unacknowledged ring the next reconciliation will replay from.
    pub fn predict_tick(
        &mut self,
        world: &mut World,
        my_client_eid: Eid,
        input: NetworkInput,
        sink: &mut dyn GameplayEventSink,
    ) {
        self.input_buffer.push(input);
        self.driver.step(world, my_client_eid, input, sink);
        self.tick = self.tick.wrapping_add(1);
    }

    pub fn reconcile(
        &mut self,
        world: &mut World,
        snapshot_players: &[PlayerSnapshot],
        my_server_eid: u16,
        my_client_eid: Eid,
        sink: &mut dyn GameplayEventSink,
    ) -> ReconcileSample {
        self.reconciler.reconcile(
            snapshot_players,
            world,
            &mut self.input_buffer,
            &self.driver,
            my_server_eid,
            my_client_eid,
            EPSILON,
            SNAP_THRESHOLD,
            sink,
        )
    }

    pub fn decay_error(&mut self, dt: f32) {
        self.reconciler.decay_error(dt, CORRECTION_SPEED);
    }

    pub fn error(&self) -> (f32, f32) {
        self.reconciler.error()
    }

    pub fn tick(&self) -> u32 {
        self.tick
    }

    pub fn pending_input_count(&self) -> usize {
        self.input_buffer.len()
    }
}

impl Default for ClientPrediction {
    fn default() -> Self {
        Self::new()
    }
}
