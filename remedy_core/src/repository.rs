//! Read contracts over the interaction, medication, plant and user data.
//!
//! The decision components only ever see `&dyn InteractionRepository`, so
//! they can run against the in-memory double in tests and against a
//! loaded dataset in the CLI.

use crate::profile_store::ProfileStore;
use crate::{
    ActiveMedications, Catalog, Error, Interaction, MedicalCondition, Medication, Plant, Result,
    UserMedicalProfile,
};
use std::collections::HashMap;

/// Typed fetch contracts of the data-store collaborator. Read-only.
pub trait InteractionRepository {
    fn get_interactions_by_plant(&self, plant_id: &str) -> Result<Vec<Interaction>>;

    /// Match is on the medication display name, case-insensitive
    fn get_interactions_by_medication_name(&self, name: &str) -> Result<Vec<Interaction>>;

    /// Unknown ids are silently absent from the result
    fn get_plants_by_ids(&self, ids: &[String]) -> Result<Vec<Plant>>;

    fn get_plants_by_category(&self, category: &str) -> Result<Vec<Plant>>;

    fn get_all_plants(&self) -> Result<Vec<Plant>>;

    fn get_medications_by_ids(&self, ids: &[String]) -> Result<Vec<Medication>>;

    fn get_conditions(&self) -> Result<Vec<MedicalCondition>>;

    fn get_user_medical_profile(&self, user_id: &str) -> Result<Option<UserMedicalProfile>>;

    fn get_user_active_medication_ids(&self, user_id: &str) -> Result<Vec<String>>;
}

/// Repository over an in-memory [`Catalog`]
///
/// User data comes from an attached [`ProfileStore`] when present, otherwise
/// from profiles registered with [`InMemoryRepository::with_profile`].
/// Results keep catalog order so callers see a stable ordering.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    catalog: Catalog,
    profiles: HashMap<String, UserMedicalProfile>,
    active: HashMap<String, ActiveMedications>,
    store: Option<ProfileStore>,
}

impl InMemoryRepository {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            ..Default::default()
        }
    }

    pub fn with_profile(mut self, profile: UserMedicalProfile) -> Self {
        self.profiles.insert(profile.user_id.clone(), profile);
        self
    }

    pub fn with_active_medications(mut self, user_id: &str, medication_ids: &[&str]) -> Self {
        self.active.insert(
            user_id.to_string(),
            ActiveMedications {
                user_id: user_id.to_string(),
                medication_ids: medication_ids.iter().map(|s| s.to_string()).collect(),
            },
        );
        self
    }

    pub fn with_user_store(mut self, store: ProfileStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn store_record(&self, user_id: &str) -> Result<Option<crate::profile_store::UserRecord>> {
        match &self.store {
            Some(store) => store
                .load(user_id)
                .map(Some)
                .map_err(|e| Error::Repository(format!("user store: {}", e))),
            None => Ok(None),
        }
    }
}

impl InteractionRepository for InMemoryRepository {
    fn get_interactions_by_plant(&self, plant_id: &str) -> Result<Vec<Interaction>> {
        Ok(self
            .catalog
            .interactions
            .iter()
            .filter(|i| i.plant_id == plant_id)
            .cloned()
            .collect())
    }

    fn get_interactions_by_medication_name(&self, name: &str) -> Result<Vec<Interaction>> {
        let wanted = name.trim().to_lowercase();
        Ok(self
            .catalog
            .interactions
            .iter()
            .filter(|i| i.medication_name.to_lowercase() == wanted)
            .cloned()
            .collect())
    }

    fn get_plants_by_ids(&self, ids: &[String]) -> Result<Vec<Plant>> {
        Ok(self
            .catalog
            .plants
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    fn get_plants_by_category(&self, category: &str) -> Result<Vec<Plant>> {
        let wanted = category.trim().to_lowercase();
        Ok(self
            .catalog
            .plants
            .iter()
            .filter(|p| p.category.to_lowercase() == wanted)
            .cloned()
            .collect())
    }

    fn get_all_plants(&self) -> Result<Vec<Plant>> {
        Ok(self.catalog.plants.clone())
    }

    fn get_medications_by_ids(&self, ids: &[String]) -> Result<Vec<Medication>> {
        Ok(self
            .catalog
            .medications
            .iter()
            .filter(|m| ids.contains(&m.id))
            .cloned()
            .collect())
    }

    fn get_conditions(&self) -> Result<Vec<MedicalCondition>> {
        Ok(self.catalog.conditions.clone())
    }

    fn get_user_medical_profile(&self, user_id: &str) -> Result<Option<UserMedicalProfile>> {
        if let Some(record) = self.store_record(user_id)? {
            return Ok(record.profile);
        }
        Ok(self.profiles.get(user_id).cloned())
    }

    fn get_user_active_medication_ids(&self, user_id: &str) -> Result<Vec<String>> {
        if let Some(record) = self.store_record(user_id)? {
            return Ok(record.active_medications.medication_ids);
        }
        Ok(self
            .active
            .get(user_id)
            .map(|a| a.medication_ids.clone())
            .unwrap_or_default())
    }
}
