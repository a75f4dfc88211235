//! Core domain types for the remedy interaction engine.
//!
//! This module defines the fundamental types used throughout the system:
//! - Catalog entries (medications, plants, medical conditions)
//! - Documented medication–plant interactions and their closed ratings
//! - Per-user medical profile and active medication set
//! - Engine outputs (warnings, recommendations)

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Catalog Types
// ============================================================================

/// A conventional pharmaceutical agent
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Medication {
    pub id: String,
    pub name: String,
    pub active_ingredient: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub therapeutic_class: String,
}

/// A botanical remedy
///
/// Safety flags are tri-state: `None` means no data, which never counts as unsafe.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Plant {
    pub id: String,
    pub name: String,
    pub scientific_name: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub ailments: Vec<String>,
    #[serde(default)]
    pub safe_pregnancy: Option<bool>,
    #[serde(default)]
    pub safe_lactation: Option<bool>,
    #[serde(default)]
    pub safe_children: Option<bool>,
}

/// A condition a user can declare in their profile
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MedicalCondition {
    pub id: String,
    pub name: String,
    /// Curated ailment terms this condition maps to, besides its own name
    #[serde(default)]
    pub aliases: Vec<String>,
}

// ============================================================================
// Interaction Types
// ============================================================================

/// Clinical severity of an interaction
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Leve,
    Moderada,
    Grave,
}

impl Severity {
    /// Parse a store label. Anything outside GRAVE/MODERADA/LEVE is a data-integrity error.
    pub fn from_label(label: &str) -> Result<Self> {
        match label.trim().to_uppercase().as_str() {
            "GRAVE" => Ok(Severity::Grave),
            "MODERADA" => Ok(Severity::Moderada),
            "LEVE" => Ok(Severity::Leve),
            other => Err(Error::DataIntegrity(format!(
                "unknown severity '{}'",
                other
            ))),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Severity::Grave => "GRAVE",
            Severity::Moderada => "MODERADA",
            Severity::Leve => "LEVE",
        }
    }

    /// Sort key, higher is more severe
    pub fn priority(&self) -> u8 {
        match self {
            Severity::Grave => 3,
            Severity::Moderada => 2,
            Severity::Leve => 1,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Strength of the scientific support behind an interaction record
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum EvidenceLevel {
    Baja,
    Moderada,
    Alta,
}

impl EvidenceLevel {
    pub fn from_label(label: &str) -> Result<Self> {
        match label.trim().to_uppercase().as_str() {
            "ALTA" => Ok(EvidenceLevel::Alta),
            "MODERADA" => Ok(EvidenceLevel::Moderada),
            "BAJA" => Ok(EvidenceLevel::Baja),
            other => Err(Error::DataIntegrity(format!(
                "unknown evidence level '{}'",
                other
            ))),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EvidenceLevel::Alta => "ALTA",
            EvidenceLevel::Moderada => "MODERADA",
            EvidenceLevel::Baja => "BAJA",
        }
    }
}

impl fmt::Display for EvidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A documented relationship between one medication and one plant
///
/// Records arrive joined with the display names of both sides.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Interaction {
    pub id: String,
    pub medication_id: String,
    pub medication_name: String,
    pub plant_id: String,
    pub plant_name: String,
    pub severity: Severity,
    pub interaction_type: String,
    pub mechanism: String,
    pub clinical_consequence: String,
    pub recommendation: String,
    pub evidence_level: EvidenceLevel,
    #[serde(default)]
    pub scientific_references: Vec<String>,
}

// ============================================================================
// User Types
// ============================================================================

/// A user's self-declared conditions and risk flags
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserMedicalProfile {
    pub user_id: String,
    /// Condition identifiers (see [`MedicalCondition::id`])
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub is_pregnant: bool,
    #[serde(default)]
    pub is_lactating: bool,
    #[serde(default)]
    pub has_children: bool,
    #[serde(default)]
    pub onboarding_completed: bool,
    pub updated_at: Option<DateTime<Utc>>,
}

impl UserMedicalProfile {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            conditions: Vec::new(),
            is_pregnant: false,
            is_lactating: false,
            has_children: false,
            onboarding_completed: false,
            updated_at: None,
        }
    }

    /// Whether any risk flag is raised
    pub fn has_risk_flags(&self) -> bool {
        self.is_pregnant || self.is_lactating || self.has_children
    }
}

/// The set of medications a user currently takes
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct ActiveMedications {
    pub user_id: String,
    #[serde(default)]
    pub medication_ids: Vec<String>,
}

impl ActiveMedications {
    /// Add a medication; returns false if it was already present
    pub fn add(&mut self, medication_id: &str) -> bool {
        if self.medication_ids.iter().any(|m| m == medication_id) {
            return false;
        }
        self.medication_ids.push(medication_id.to_string());
        true
    }

    /// Remove a medication; returns false if it was not present
    pub fn remove(&mut self, medication_id: &str) -> bool {
        let before = self.medication_ids.len();
        self.medication_ids.retain(|m| m != medication_id);
        before != self.medication_ids.len()
    }
}

/// Identity of one client-side session
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// Engine Outputs
// ============================================================================

/// A contraindication between a remedy and one of the user's medications
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Warning {
    pub medication_id: String,
    pub medication_name: String,
    pub severity: Severity,
    pub evidence_level: EvidenceLevel,
    pub mechanism: String,
    pub clinical_consequence: String,
    pub recommendation: String,
    pub scientific_references: Vec<String>,
}

/// A remedy suggested to complement a medication
///
/// `interaction` is present only when a documented beneficial interaction
/// backs the suggestion; category matches carry none.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Recommendation {
    pub plant: Plant,
    pub interaction: Option<Interaction>,
}

impl Recommendation {
    pub fn has_documented_interaction(&self) -> bool {
        self.interaction.is_some()
    }
}

// ============================================================================
// Catalog Type
// ============================================================================

/// The complete reference dataset the engine reads from
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub medications: Vec<Medication>,
    #[serde(default)]
    pub plants: Vec<Plant>,
    #[serde(default)]
    pub conditions: Vec<MedicalCondition>,
    /// Loaded from the interaction table, not the catalog file
    #[serde(skip)]
    pub interactions: Vec<Interaction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_labels_are_closed() {
        assert_eq!(Severity::from_label("grave").unwrap(), Severity::Grave);
        assert_eq!(Severity::from_label(" LEVE ").unwrap(), Severity::Leve);
        assert!(matches!(
            Severity::from_label("CRITICA"),
            Err(Error::DataIntegrity(_))
        ));
    }

    #[test]
    fn test_evidence_labels_are_closed() {
        assert_eq!(EvidenceLevel::from_label("Alta").unwrap(), EvidenceLevel::Alta);
        assert!(EvidenceLevel::from_label("").is_err());
    }

    #[test]
    fn test_severity_serde_uses_upper_case() {
        let json = serde_json::to_string(&Severity::Moderada).unwrap();
        assert_eq!(json, "\"MODERADA\"");
        assert!(serde_json::from_str::<Severity>("\"URGENTE\"").is_err());
    }

    #[test]
    fn test_active_medications_membership() {
        let mut meds = ActiveMedications::default();
        assert!(meds.add("warfarina"));
        assert!(!meds.add("warfarina"));
        assert!(meds.remove("warfarina"));
        assert!(!meds.remove("warfarina"));
        assert!(meds.medication_ids.is_empty());
    }
}
