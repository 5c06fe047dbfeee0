//! Steering behaviors for autonomous agents
//!
//! This crate provides:
//! - A velocity-aligned local-space model and simple vehicle kinematics
//! - Steering behaviors: seek, flee, pursuit, flocking, avoidance,
//!   path and flow-field following
//! - Pathway geometry: polyline tubes, triangle-mesh corridors and
//!   gateway corridors
//! - A bin-lattice proximity database for fast neighbor queries

pub mod annotation;
pub mod flow_field;
pub mod local_space;
pub mod math;
pub mod obstacle;
pub mod pathway;
pub mod proximity;
pub mod steering;
pub mod vehicle;

// Re-exports for convenience
pub use glam;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::annotation::{Annotation, NullAnnotation, Trail};
    pub use crate::flow_field::{FlowField, GridFlowField};
    pub use crate::local_space::LocalSpace;
    pub use crate::math::Vec3Ext;
    pub use crate::obstacle::{Obstacle, SphericalObstacle};
    pub use crate::pathway::{
        Gateway, GatewayPathway, PathRelation, Pathway, PathwayError, PolylinePathway, Triangle,
        TrianglePathway,
    };
    pub use crate::proximity::{ProximityDatabase, TokenId};
    pub use crate::steering::{self, WanderState};
    pub use crate::vehicle::{SimpleVehicle, Vehicle};
    pub use glam::{Mat4, Vec3};
}
