//! The tiered occlusion pipeline internals.
//!
//! Stage order is cache probe, sphere pre-check, full cuboid test; a bundle
//! that any stage blocks goes no further. The shadow-frustum cuboid test in
//! [`frustum`] is the expensive path, so the cache exploits temporal
//! coherence (last tick's blocker almost always still blocks) and the broad
//! phase trims the candidate list before it runs.

pub(crate) mod broadphase;
pub(crate) mod frustum;
pub(crate) mod scratch;
pub(crate) mod sphere;
