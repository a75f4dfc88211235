//! Contraindication checking between a remedy and a user's medications.

use crate::repository::InteractionRepository;
use crate::severity::classify;
use crate::{Error, Result, Warning};
use std::collections::HashSet;

pub struct ContraindicationChecker<'a> {
    repository: &'a dyn InteractionRepository,
}

impl<'a> ContraindicationChecker<'a> {
    pub fn new(repository: &'a dyn InteractionRepository) -> Self {
        Self { repository }
    }

    /// All warnings that apply when taking `remedy_id` alongside `active_medication_ids`
    ///
    /// Beneficial records are never warnings. The result is sorted by severity
    /// (GRAVE first), then medication name. Duplicate records for one pair are
    /// all returned.
    ///
    /// # Errors
    /// `NotFound` for an unknown remedy; repository failures propagate unchanged.
    pub fn check(&self, remedy_id: &str, active_medication_ids: &[String]) -> Result<Vec<Warning>> {
        let found = self.repository.get_plants_by_ids(&[remedy_id.to_string()])?;
        if !found.iter().any(|p| p.id == remedy_id) {
            return Err(Error::not_found("Remedy", remedy_id));
        }

        if active_medication_ids.is_empty() {
            tracing::debug!("No active medications, nothing to check for {}", remedy_id);
            return Ok(Vec::new());
        }

        let active: HashSet<&str> = active_medication_ids.iter().map(String::as_str).collect();

        let mut matched: Vec<_> = self
            .repository
            .get_interactions_by_plant(remedy_id)?
            .into_iter()
            .filter(|i| active.contains(i.medication_id.as_str()))
            .filter(|i| !classify(i).is_beneficial)
            .collect();

        matched.sort_by(|a, b| {
            b.severity
                .priority()
                .cmp(&a.severity.priority())
                .then_with(|| a.medication_name.cmp(&b.medication_name))
                .then_with(|| a.id.cmp(&b.id))
        });

        tracing::info!(
            "Remedy {} has {} warning(s) against {} active medication(s)",
            remedy_id,
            matched.len(),
            active.len()
        );

        Ok(matched
            .into_iter()
            .map(|i| Warning {
                medication_id: i.medication_id,
                medication_name: i.medication_name,
                severity: i.severity,
                evidence_level: i.evidence_level,
                mechanism: i.mechanism,
                clinical_consequence: i.clinical_consequence,
                recommendation: i.recommendation,
                scientific_references: i.scientific_references,
            })
            .collect())
    }
}
