pub mod endpoint;
pub mod stats;

pub use endpoint::{Datagram, NetworkEndpoint};
pub use stats::{rand_percent, rand_u64, NetworkStats, PacketLossSimulation};
