//! Per-user entry points over the decision components.
//!
//! The engine is the explicit context object: it holds the repository and
//! configuration and hands them to each component, so nothing relies on
//! global state and tests can swap in an in-memory repository.

use crate::conditions::ConditionMatcher;
use crate::contraindications::ContraindicationChecker;
use crate::ranker::Ranker;
use crate::recommender::BeneficialRecommender;
use crate::repository::InteractionRepository;
use crate::{Config, Error, Plant, Recommendation, Result, UserMedicalProfile, Warning};
use serde::Serialize;

/// A catalog entry in personalized order
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct RankedPlant {
    pub plant: Plant,
    /// Names of the user's conditions this plant addresses; empty when not promoted
    pub relevant_to: Vec<String>,
}

pub struct InteractionEngine<'a> {
    repository: &'a dyn InteractionRepository,
    ranker: Ranker,
    max_results: usize,
}

impl<'a> InteractionEngine<'a> {
    /// Build an engine, loading the condition table from the repository
    pub fn new(repository: &'a dyn InteractionRepository, config: &Config) -> Result<Self> {
        let conditions = repository.get_conditions()?;
        let matcher = ConditionMatcher::new(&conditions, &config.conditions.aliases);
        Ok(Self {
            repository,
            ranker: Ranker::new(matcher),
            max_results: config.recommender.max_results,
        })
    }

    /// Warnings for a remedy against an explicit medication set
    pub fn check_remedy(&self, remedy_id: &str, medication_ids: &[String]) -> Result<Vec<Warning>> {
        ContraindicationChecker::new(self.repository).check(remedy_id, medication_ids)
    }

    /// Warnings for a remedy against the medications a user currently takes
    pub fn check_remedy_for_user(&self, user_id: &str, remedy_id: &str) -> Result<Vec<Warning>> {
        let active = self.repository.get_user_active_medication_ids(user_id)?;
        tracing::debug!("User {} takes {} medication(s)", user_id, active.len());
        self.check_remedy(remedy_id, &active)
    }

    /// Beneficial remedies by medication name, with optional category/tags for the fallback
    pub fn recommend(
        &self,
        medication_name: &str,
        category: Option<&str>,
        tags: &[String],
    ) -> Result<Vec<Recommendation>> {
        BeneficialRecommender::new(self.repository)
            .with_max_results(self.max_results)
            .recommend(medication_name, category, tags)
    }

    /// Beneficial remedies for a catalog medication, using its own category and tags
    ///
    /// # Errors
    /// `NotFound` if no medication has this id.
    pub fn recommend_for_medication(&self, medication_id: &str) -> Result<Vec<Recommendation>> {
        let medication = self
            .repository
            .get_medications_by_ids(&[medication_id.to_string()])?
            .into_iter()
            .find(|m| m.id == medication_id)
            .ok_or_else(|| Error::not_found("Medication", medication_id))?;

        self.recommend(&medication.name, Some(&medication.category), &medication.tags)
    }

    /// The full remedy catalog in personalized order
    ///
    /// Without a user, or for a user with no profile yet, this is the
    /// catalog order unchanged.
    pub fn personalized_catalog(&self, user_id: Option<&str>, only_safe: bool) -> Result<Vec<RankedPlant>> {
        let catalog = self.repository.get_all_plants()?;
        let profile = match user_id {
            Some(user_id) => self.repository.get_user_medical_profile(user_id)?,
            None => None,
        };
        Ok(self.rank(&catalog, profile.as_ref(), only_safe))
    }

    /// Rank an already-fetched catalog
    pub fn rank(
        &self,
        catalog: &[Plant],
        profile: Option<&UserMedicalProfile>,
        only_safe: bool,
    ) -> Vec<RankedPlant> {
        self.ranker
            .rank(catalog, profile, only_safe)
            .into_iter()
            .map(|plant| {
                let relevant_to = profile
                    .map(|p| self.ranker.relevance(&plant, p))
                    .unwrap_or_default();
                RankedPlant { plant, relevant_to }
            })
            .collect()
    }
}
