//! Spatial-index external collaborator. Spec places the actual hash/grid
//! implementation outside the core (content/collision is a gameplay
//! concern), but the core still owns the seam: it rebuilds the index exactly
//! once per applied snapshot and never queries it itself — that's for the
//! gameplay layer's collision/AI systems to do.

use crate::world::Eid;

/// Queried by radius by gameplay systems (collision, AI targeting); rebuilt
/// by the netcode core once per applied snapshot so those systems always see
/// this tick's authoritative positions.
pub trait SpatialHash {
    fn rebuild(&mut self, entities: &[(Eid, f32, f32)]);
    fn for_each_in_radius(&self, cx: f32, cy: f32, radius: f32, f: &mut dyn FnMut(Eid));
}

/// No-op index used until a gameplay layer supplies a real one.
#[derive(Debug, Default)]
pub struct NullSpatialHash;

impl SpatialHash for NullSpatialHash {
    fn rebuild(&mut self, _entities: &[(Eid, f32, f32)]) {}
    fn for_each_in_radius(&self, _cx: f32, _cy: f32, _radius: f32, _f: &mut dyn FnMut(Eid)) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_spatial_hash_is_inert() {
        let mut hash = NullSpatialHash;
        hash.rebuild(&[(Eid(1), 0.0, 0.0)]);
        let mut seen = 0;
        hash.for_each_in_radius(0.0, 0.0, 100.0, &mut |_| seen += 1);
        assert_eq!(seen, 0);
    }
}
