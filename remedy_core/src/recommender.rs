//! Beneficial remedy recommendations for a medication.
//!
//! Selection runs in strict priority order:
//! 1. Plants with a documented beneficial (LEVE, BENEFICIOSA or SINÉRGICA)
//!    interaction with the medication, paired with that interaction
//! 2. Otherwise plants sharing the medication's category, unpaired
//! 3. Otherwise nothing, which is a valid "no data" answer
//!
//! Ordering is deterministic for identical inputs.

use crate::repository::InteractionRepository;
use crate::severity::classify;
use crate::{Error, Interaction, Recommendation, Result};
use std::collections::HashSet;

pub const DEFAULT_MAX_RESULTS: usize = 6;

pub struct BeneficialRecommender<'a> {
    repository: &'a dyn InteractionRepository,
    max_results: usize,
}

impl<'a> BeneficialRecommender<'a> {
    pub fn new(repository: &'a dyn InteractionRepository) -> Self {
        Self {
            repository,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }

    /// Lower the cap; it never exceeds [`DEFAULT_MAX_RESULTS`]
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.clamp(1, DEFAULT_MAX_RESULTS);
        self
    }

    /// Recommend remedies that complement `medication_name`
    ///
    /// `tags` only affects the order of category matches: plants sharing more
    /// tags with the medication come first.
    pub fn recommend(
        &self,
        medication_name: &str,
        category: Option<&str>,
        tags: &[String],
    ) -> Result<Vec<Recommendation>> {
        let documented = self.documented(medication_name)?;
        if !documented.is_empty() {
            tracing::info!(
                "{} documented beneficial remedies for {}",
                documented.len(),
                medication_name
            );
            return Ok(documented);
        }

        match category.map(str::trim).filter(|c| !c.is_empty()) {
            Some(category) => {
                let same_category = self.same_category(category, tags)?;
                tracing::info!(
                    "No documented synergy for {}, {} complementary remedies in category {}",
                    medication_name,
                    same_category.len(),
                    category
                );
                Ok(same_category)
            }
            None => {
                tracing::info!("No recommendation data for {}", medication_name);
                Ok(Vec::new())
            }
        }
    }

    fn documented(&self, medication_name: &str) -> Result<Vec<Recommendation>> {
        // One entry per plant, first discovered interaction wins
        let mut seen = HashSet::new();
        let picked: Vec<Interaction> = self
            .repository
            .get_interactions_by_medication_name(medication_name)?
            .into_iter()
            .filter(|i| classify(i).is_beneficial)
            .filter(|i| seen.insert(i.plant_id.clone()))
            .take(self.max_results)
            .collect();

        if picked.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = picked.iter().map(|i| i.plant_id.clone()).collect();
        let mut plants = self.repository.get_plants_by_ids(&ids)?;

        picked
            .into_iter()
            .map(|interaction| {
                let position = plants
                    .iter()
                    .position(|p| p.id == interaction.plant_id)
                    .ok_or_else(|| {
                        Error::DataIntegrity(format!(
                            "interaction '{}' references non-existent plant '{}'",
                            interaction.id, interaction.plant_id
                        ))
                    })?;
                Ok(Recommendation {
                    plant: plants.swap_remove(position),
                    interaction: Some(interaction),
                })
            })
            .collect()
    }

    fn same_category(&self, category: &str, tags: &[String]) -> Result<Vec<Recommendation>> {
        let wanted: HashSet<String> = tags.iter().map(|t| t.to_lowercase()).collect();
        let mut plants = self.repository.get_plants_by_category(category)?;

        // Stable sort keeps store order among equal tag overlap
        plants.sort_by_key(|p| {
            std::cmp::Reverse(
                p.tags
                    .iter()
                    .filter(|t| wanted.contains(&t.to_lowercase()))
                    .count(),
            )
        });

        Ok(plants
            .into_iter()
            .take(self.max_results)
            .map(|plant| Recommendation {
                plant,
                interaction: None,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testing::UnreachableRepository;
    use crate::repository::InMemoryRepository;
    use crate::{build_default_catalog, EvidenceLevel, Plant, Severity};

    fn names(recs: &[Recommendation]) -> Vec<&str> {
        recs.iter().map(|r| r.plant.name.as_str()).collect()
    }

    fn beneficial(id: &str, medication: &str, plant_id: &str) -> Interaction {
        Interaction {
            id: id.into(),
            medication_id: medication.to_lowercase(),
            medication_name: medication.into(),
            plant_id: plant_id.into(),
            plant_name: plant_id.into(),
            severity: Severity::Leve,
            interaction_type: "SINÉRGICA".into(),
            mechanism: String::new(),
            clinical_consequence: String::new(),
            recommendation: String::new(),
            evidence_level: EvidenceLevel::Baja,
            scientific_references: vec![],
        }
    }

    fn plant(id: &str, category: &str, tags: &[&str]) -> Plant {
        Plant {
            id: id.into(),
            name: id.to_uppercase(),
            scientific_name: String::new(),
            category: category.into(),
            tags: tags.iter().map(|s| s.to_string()).collect(),
            ailments: vec![],
            safe_pregnancy: None,
            safe_lactation: None,
            safe_children: None,
        }
    }

    #[test]
    fn test_omeprazol_recommends_manzanilla_with_interaction() {
        let repo = InMemoryRepository::new(build_default_catalog());
        let recs = BeneficialRecommender::new(&repo)
            .recommend("Omeprazol", None, &[])
            .unwrap();

        assert_eq!(names(&recs), vec!["Manzanilla"]);
        assert!(recs[0].has_documented_interaction());
        let interaction = recs[0].interaction.as_ref().unwrap();
        assert_eq!(interaction.severity, Severity::Leve);
        assert_eq!(interaction.interaction_type, "SINÉRGICA BENEFICIOSA");
    }

    #[test]
    fn test_unknown_medication_without_category_is_empty() {
        let repo = InMemoryRepository::new(build_default_catalog());
        let recs = BeneficialRecommender::new(&repo)
            .recommend("X", None, &[])
            .unwrap();
        assert!(recs.is_empty());
    }

    #[test]
    fn test_falls_back_to_category_without_pairing() {
        let repo = InMemoryRepository::new(build_default_catalog());
        let recs = BeneficialRecommender::new(&repo)
            .recommend("Ibuprofeno", Some("Antiinflamatoria"), &[])
            .unwrap();

        assert_eq!(names(&recs), vec!["Jengibre", "Cúrcuma"]);
        assert!(recs.iter().all(|r| !r.has_documented_interaction()));
    }

    #[test]
    fn test_documented_tier_wins_over_category() {
        let repo = InMemoryRepository::new(build_default_catalog());
        let recs = BeneficialRecommender::new(&repo)
            .recommend("Lorazepam", Some("Sedante"), &[])
            .unwrap();
        assert_eq!(names(&recs), vec!["Melisa"]);
        assert!(recs[0].has_documented_interaction());
    }

    #[test]
    fn test_never_more_than_cap() {
        let mut catalog = build_default_catalog();
        catalog.plants = (0..10).map(|n| plant(&format!("p{}", n), "Digestiva", &[])).collect();
        catalog.interactions = (0..10)
            .map(|n| beneficial(&format!("i{}", n), "Omeprazol", &format!("p{}", n)))
            .collect();
        let repo = InMemoryRepository::new(catalog);
        let recommender = BeneficialRecommender::new(&repo);

        let documented = recommender.recommend("Omeprazol", None, &[]).unwrap();
        assert_eq!(documented.len(), 6);
        assert_eq!(documented[0].plant.id, "p0");
        assert_eq!(documented[5].plant.id, "p5");

        let by_category = recommender.recommend("Nada", Some("Digestiva"), &[]).unwrap();
        assert_eq!(by_category.len(), 6);
    }

    #[test]
    fn test_duplicate_pairs_yield_one_plant_in_discovery_order() {
        let mut catalog = build_default_catalog();
        catalog.plants = vec![plant("a", "X", &[]), plant("b", "X", &[])];
        catalog.interactions = vec![
            beneficial("i1", "Omeprazol", "b"),
            beneficial("i2", "Omeprazol", "a"),
            beneficial("i3", "Omeprazol", "b"),
        ];
        let repo = InMemoryRepository::new(catalog);
        let recs = BeneficialRecommender::new(&repo)
            .recommend("omeprazol", None, &[])
            .unwrap();

        let ids: Vec<&str> = recs.iter().map(|r| r.plant.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(recs[0].interaction.as_ref().unwrap().id, "i1");
    }

    #[test]
    fn test_category_matches_ordered_by_shared_tags() {
        let mut catalog = build_default_catalog();
        catalog.plants = vec![
            plant("a", "Sedante", &["sueño"]),
            plant("b", "Sedante", &["ansiedad", "sueño"]),
            plant("c", "Sedante", &[]),
            plant("d", "Sedante", &["ANSIEDAD"]),
        ];
        catalog.interactions.clear();
        let repo = InMemoryRepository::new(catalog);
        let tags = vec!["sueño".to_string(), "ansiedad".to_string()];
        let recs = BeneficialRecommender::new(&repo)
            .recommend("Lorazepam", Some("sedante"), &tags)
            .unwrap();

        let ids: Vec<&str> = recs.iter().map(|r| r.plant.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "d", "c"]);
    }

    #[test]
    fn test_results_are_stable_across_calls() {
        let repo = InMemoryRepository::new(build_default_catalog());
        let recommender = BeneficialRecommender::new(&repo);
        let first = recommender.recommend("Ibuprofeno", Some("Antiinflamatoria"), &[]).unwrap();
        for _ in 0..5 {
            assert_eq!(
                recommender.recommend("Ibuprofeno", Some("Antiinflamatoria"), &[]).unwrap(),
                first
            );
        }
    }

    #[test]
    fn test_dangling_plant_reference_is_integrity_error() {
        let mut catalog = build_default_catalog();
        catalog.interactions = vec![beneficial("i1", "Omeprazol", "ghost")];
        let repo = InMemoryRepository::new(catalog);
        let result = BeneficialRecommender::new(&repo).recommend("Omeprazol", None, &[]);
        assert!(matches!(result, Err(Error::DataIntegrity(_))));
    }

    #[test]
    fn test_repository_failure_propagates() {
        let result = BeneficialRecommender::new(&UnreachableRepository).recommend("Omeprazol", None, &[]);
        assert!(matches!(result, Err(Error::Repository(_))));
    }
}
