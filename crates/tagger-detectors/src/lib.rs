//! Family detectors for the move-tagging engine.
//!
//! Each family implements the `FamilyDetector` trait and proposes candidate
//! tags from a per-move feature snapshot. Detectors are pure and
//! gate-agnostic; gating, subtype selection, cooldown and normalization live
//! in the engine crate. The main entry point is `all_detectors()`, which
//! returns the registered list the orchestrator iterates over.

pub mod detector;
pub mod families;

pub use detector::FamilyDetector;

/// All registered family detectors, in evaluation order.
pub fn all_detectors() -> Vec<Box<dyn FamilyDetector + Send + Sync>> {
    vec![
        Box::new(families::tension::TensionDetector::new()),
        Box::new(families::prophylaxis::ProphylaxisDetector::new()),
        Box::new(families::control::ControlDetector::new()),
        Box::new(families::structure::StructureDetector::new()),
        Box::new(families::maneuver::ManeuverDetector::new()),
        Box::new(families::initiative::InitiativeDetector::new()),
        Box::new(families::sacrifice::SacrificeDetector::new()),
        Box::new(families::tactical::TacticalDetector::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagger_core::Family;

    #[test]
    fn test_registry_covers_every_family() {
        let detectors = all_detectors();
        assert_eq!(detectors.len(), 8);
        for family in [
            Family::Tension,
            Family::Prophylaxis,
            Family::Control,
            Family::Structure,
            Family::Maneuver,
            Family::Initiative,
            Family::Sacrifice,
            Family::Tactical,
        ] {
            assert!(detectors.iter().any(|d| d.family() == family));
        }
    }
}
