//! Shared data model for the move-tagging engine: per-move feature
//! snapshots, threshold configuration, candidate tags, cooldown state and
//! the final tag result.

pub mod candidate;
pub mod config;
pub mod cooldown;
pub mod error;
pub mod features;
pub mod result;

pub use candidate::{Candidate, Family, FamilySide, GateCheck, SuppressReason};
pub use config::TagConfig;
pub use cooldown::CooldownState;
pub use error::{ConfigError, DetectorError};
pub use features::{FeatureContext, IntentHint, Phase, PlayedKind};
pub use result::{Diagnostics, GateMode, TagResult};
