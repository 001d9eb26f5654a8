//! Control Plane Module
//!
//! Turns GraphDeployment resources into cluster objects: storage claims,
//! registry pull-secret references and the reconciler that applies them.

pub mod claims;
pub mod reconciler;
pub mod secrets;

pub use claims::*;
pub use reconciler::*;
pub use secrets::*;
