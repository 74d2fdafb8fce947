//! Base trait for family detectors.

use tagger_core::candidate::Candidate;
use tagger_core::config::TagConfig;
use tagger_core::cooldown::CooldownState;
use tagger_core::error::DetectorError;
use tagger_core::features::FeatureContext;
use tagger_core::Family;

/// Trait that all family detectors implement.
///
/// A detector proposes candidates for exactly one family and never consults
/// the tactical/positional gate; gating is applied to the combined candidate
/// set afterwards. Detectors are stateless: cross-move state (cooldowns) is
/// owned by the orchestrator and passed in read-only.
pub trait FamilyDetector {
    /// Family this detector proposes for.
    fn family(&self) -> Family;

    /// Evaluate one move and propose zero or more candidates.
    fn propose(
        &self,
        ctx: &FeatureContext,
        cfg: &TagConfig,
        cooldown: &CooldownState,
    ) -> Result<Vec<Candidate>, DetectorError>;
}
