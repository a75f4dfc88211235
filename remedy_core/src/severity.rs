//! Severity classification for interaction records.
//!
//! The `is_beneficial` flag decides whether a record is a warning or an
//! endorsement everywhere else in the engine.

use crate::{EvidenceLevel, Interaction, Severity};
use serde::Serialize;

const BENEFICIAL_MARKERS: [&str; 2] = ["BENEFICIOSA", "SINÉRGICA"];

/// Normalized rating of one interaction record
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct Classification {
    pub severity: Severity,
    pub evidence_level: EvidenceLevel,
    pub is_beneficial: bool,
}

/// Classify an interaction record
///
/// A record is beneficial when its severity is LEVE or its type mentions
/// BENEFICIOSA or SINÉRGICA in any case.
pub fn classify(interaction: &Interaction) -> Classification {
    Classification {
        severity: interaction.severity,
        evidence_level: interaction.evidence_level,
        is_beneficial: interaction.severity == Severity::Leve
            || is_beneficial_type(&interaction.interaction_type),
    }
}

/// Case-insensitive test for the beneficial markers in an interaction type
pub fn is_beneficial_type(interaction_type: &str) -> bool {
    let upper = interaction_type.to_uppercase();
    BENEFICIAL_MARKERS.iter().any(|marker| upper.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interaction(severity: Severity, kind: &str) -> Interaction {
        Interaction {
            id: "i1".into(),
            medication_id: "warfarina".into(),
            medication_name: "Warfarina".into(),
            plant_id: "ginkgo".into(),
            plant_name: "Ginkgo".into(),
            severity,
            interaction_type: kind.into(),
            mechanism: String::new(),
            clinical_consequence: String::new(),
            recommendation: String::new(),
            evidence_level: EvidenceLevel::Moderada,
            scientific_references: vec![],
        }
    }

    #[test]
    fn test_leve_is_always_beneficial() {
        let c = classify(&interaction(Severity::Leve, "CONTRAINDICACIÓN"));
        assert!(c.is_beneficial);
        assert_eq!(c.severity, Severity::Leve);
    }

    #[test]
    fn test_grave_contraindication_is_not_beneficial() {
        let c = classify(&interaction(Severity::Grave, "CONTRAINDICACIÓN"));
        assert!(!c.is_beneficial);
        assert_eq!(c.evidence_level, EvidenceLevel::Moderada);
    }

    #[test]
    fn test_type_markers_are_case_insensitive() {
        assert!(classify(&interaction(Severity::Moderada, "sinérgica")).is_beneficial);
        assert!(classify(&interaction(Severity::Grave, "Efecto Beneficiosa")).is_beneficial);
        assert!(!classify(&interaction(Severity::Moderada, "FARMACOCINÉTICA")).is_beneficial);
    }

    #[test]
    fn test_every_severity_matches_the_rule() {
        for severity in [Severity::Grave, Severity::Moderada, Severity::Leve] {
            for kind in ["", "BENEFICIOSA", "SINÉRGICA", "CONTRAINDICACIÓN"] {
                let expected = severity == Severity::Leve
                    || (!kind.is_empty() && kind != "CONTRAINDICACIÓN");
                assert_eq!(
                    classify(&interaction(severity, kind)).is_beneficial,
                    expected,
                    "{:?} / {}",
                    severity,
                    kind
                );
            }
        }
    }

    #[test]
    fn test_classify_does_not_mutate_input() {
        let record = interaction(Severity::Grave, "sinérgica");
        let before = record.clone();
        let _ = classify(&record);
        assert_eq!(record, before);
    }
}
