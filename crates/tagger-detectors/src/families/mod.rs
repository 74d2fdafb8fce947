//! One module per tag family.

pub mod control;
pub mod initiative;
pub mod maneuver;
pub mod prophylaxis;
pub mod sacrifice;
pub mod structure;
pub mod tactical;
pub mod tension;
