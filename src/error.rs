//! Error types for engine construction.

use std::fmt;

/// Errors that can occur while loading a world into a [`crate::CullingEngine`].
///
/// All of these are construction-time failures. Once an engine is built,
/// the per-tick path is infallible.
#[derive(Debug, Clone)]
pub enum CullingError {
    /// A derived cuboid face's four vertices are not coplanar.
    NonPlanarFace { cuboid: usize, face: usize },

    /// A cuboid face has (near) zero area, so no outward normal exists.
    DegenerateFace { cuboid: usize, face: usize },

    /// A cuboid vertex lies strictly outside one of the face planes.
    /// This also catches inverted vertex windings, which flip the face
    /// normals inward.
    NonConvex {
        cuboid: usize,
        face: usize,
        vertex: usize,
    },

    /// Two of a cuboid's eight vertices coincide.
    DuplicateVertices { cuboid: usize },

    /// A sphere occluder with a non-positive radius.
    DegenerateSphere { sphere: usize },

    /// A configuration field is out of range.
    InvalidConfig(String),
}

impl fmt::Display for CullingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CullingError::NonPlanarFace { cuboid, face } => {
                write!(f, "cuboid {}: face {} is not planar", cuboid, face)
            }
            CullingError::DegenerateFace { cuboid, face } => {
                write!(f, "cuboid {}: face {} has zero area", cuboid, face)
            }
            CullingError::NonConvex {
                cuboid,
                face,
                vertex,
            } => {
                write!(
                    f,
                    "cuboid {}: vertex {} lies outside face {} (non-convex or inverted winding)",
                    cuboid, vertex, face
                )
            }
            CullingError::DuplicateVertices { cuboid } => {
                write!(f, "cuboid {}: duplicate vertices", cuboid)
            }
            CullingError::DegenerateSphere { sphere } => {
                write!(f, "sphere occluder {}: radius must be positive", sphere)
            }
            CullingError::InvalidConfig(msg) => {
                write!(f, "invalid configuration: {}", msg)
            }
        }
    }
}

impl std::error::Error for CullingError {}
