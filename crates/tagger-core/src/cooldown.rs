//! Cross-move cooldown state for subtype-bearing families.
//!
//! Owned by the per-game orchestrator and passed by reference into the
//! subtype selector; never a global, so concurrent games stay isolated.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CooldownState {
    pub last_ply: Option<u32>,
    pub last_subtype: Option<String>,
}

impl CooldownState {
    /// Record a selection. Called once per move, only after a subtype is
    /// actually selected (not merely proposed).
    pub fn record(&mut self, ply: u32, subtype: &str) {
        self.last_ply = Some(ply);
        self.last_subtype = Some(subtype.to_string());
    }

    /// Plies left before the last-selected subtype may fire again.
    pub fn remaining(&self, current_ply: u32, cooldown_plies: u32) -> u32 {
        match self.last_ply {
            Some(last) if current_ply >= last => {
                let diff = current_ply - last;
                if diff <= cooldown_plies {
                    cooldown_plies - diff
                } else {
                    0
                }
            }
            _ => 0,
        }
    }

    /// True when `subtype` is still inside its cooldown window.
    pub fn blocks(&self, subtype: &str, current_ply: u32, cooldown_plies: u32) -> bool {
        match (&self.last_subtype, self.last_ply) {
            (Some(last_subtype), Some(last_ply)) => {
                last_subtype == subtype
                    && current_ply >= last_ply
                    && current_ply - last_ply <= cooldown_plies
            }
            _ => false,
        }
    }
}
