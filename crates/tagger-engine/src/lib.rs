//! Move-tagging engine: gating, subtype selection, normalization and the
//! per-game orchestrator.
//!
//! The pipeline per move is gate mode → family detectors → control subtype
//! selector (with cross-ply cooldown) → normalizer. `GameTagger` is the
//! entry point; feed it one game's moves in ply order.

pub mod gating;
pub mod normalizer;
pub mod orchestrator;
pub mod selector;

pub use gating::{apply_gate, gate_mode};
pub use normalizer::normalize;
pub use orchestrator::GameTagger;
pub use selector::{select_subtype, Selection};
