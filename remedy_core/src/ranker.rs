//! Personalized ordering and safety filtering of the remedy catalog.
//!
//! 1. **Relevance partition**: plants whose ailments match one of the user's
//!    declared conditions move ahead of the rest. Both groups keep their
//!    incoming relative order.
//! 2. **Safety filter** (only-safe mode): plants explicitly flagged unsafe for
//!    an active pregnancy, lactation or children flag are dropped. Unknown
//!    flags never exclude.
//!
//! Conventional sorting and text filters belong to the catalog browser and
//! are applied after this.

use crate::conditions::ConditionMatcher;
use crate::{Plant, UserMedicalProfile};

pub struct Ranker {
    matcher: ConditionMatcher,
}

impl Ranker {
    pub fn new(matcher: ConditionMatcher) -> Self {
        Self { matcher }
    }

    /// Rank a catalog for a user. Returns a new list; `catalog` is untouched.
    pub fn rank(
        &self,
        catalog: &[Plant],
        profile: Option<&UserMedicalProfile>,
        only_safe: bool,
    ) -> Vec<Plant> {
        let ordered = match profile {
            Some(profile) if !self.matcher.resolve_names(&profile.conditions).is_empty() => {
                let (relevant, other): (Vec<&Plant>, Vec<&Plant>) = catalog
                    .iter()
                    .partition(|plant| self.is_relevant(plant, profile));
                tracing::debug!(
                    "Relevance partition: {} relevant, {} other",
                    relevant.len(),
                    other.len()
                );
                relevant.into_iter().chain(other).collect::<Vec<_>>()
            }
            _ => catalog.iter().collect(),
        };

        ordered
            .into_iter()
            .filter(|plant| !only_safe || profile.map_or(true, |p| is_safe_for(plant, p)))
            .cloned()
            .collect()
    }

    pub fn is_relevant(&self, plant: &Plant, profile: &UserMedicalProfile) -> bool {
        self.matcher.matches_any(&profile.conditions, &plant.ailments)
    }

    /// Names of the user's conditions that promoted this plant
    pub fn relevance(&self, plant: &Plant, profile: &UserMedicalProfile) -> Vec<String> {
        self.matcher
            .matching_conditions(&profile.conditions, &plant.ailments)
    }
}

/// Whether a plant is safe for the profile's active risk flags
///
/// Only an explicit `Some(false)` excludes.
pub fn is_safe_for(plant: &Plant, profile: &UserMedicalProfile) -> bool {
    let unsafe_for = |active: bool, flag: Option<bool>| active && flag == Some(false);

    !(unsafe_for(profile.is_pregnant, plant.safe_pregnancy)
        || unsafe_for(profile.is_lactating, plant.safe_lactation)
        || unsafe_for(profile.has_children, plant.safe_children))
}
