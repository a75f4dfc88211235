//! Loading and exporting the reference dataset on disk.
//!
//! A dataset directory holds two files:
//! - `catalog.json`: medications, plants and medical conditions
//! - `interactions.csv`: one row per documented interaction, with
//!   `scientific_references` separated by `|`
//!
//! Severity and evidence labels outside their closed sets are rejected with
//! the offending row number rather than coerced.

use crate::{Catalog, Error, EvidenceLevel, Interaction, Result, Severity};
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub const CATALOG_FILE: &str = "catalog.json";
pub const INTERACTIONS_FILE: &str = "interactions.csv";

const REFERENCE_SEPARATOR: &str = "|";

/// CSV row format for the interaction table
#[derive(Debug, Serialize, Deserialize)]
struct CsvRow {
    id: String,
    medication_id: String,
    plant_id: String,
    severity: String,
    interaction_type: String,
    mechanism: String,
    clinical_consequence: String,
    recommendation: String,
    evidence_level: String,
    #[serde(default)]
    scientific_references: String,
}

impl From<&Interaction> for CsvRow {
    fn from(i: &Interaction) -> Self {
        CsvRow {
            id: i.id.clone(),
            medication_id: i.medication_id.clone(),
            plant_id: i.plant_id.clone(),
            severity: i.severity.label().to_string(),
            interaction_type: i.interaction_type.clone(),
            mechanism: i.mechanism.clone(),
            clinical_consequence: i.clinical_consequence.clone(),
            recommendation: i.recommendation.clone(),
            evidence_level: i.evidence_level.label().to_string(),
            scientific_references: i.scientific_references.join(REFERENCE_SEPARATOR),
        }
    }
}

/// Load a dataset directory into a catalog
///
/// # Errors
/// `DataIntegrity` for unknown severity/evidence labels or interactions that
/// reference missing medications or plants.
pub fn load_dataset(dir: &Path) -> Result<Catalog> {
    let catalog_path = dir.join(CATALOG_FILE);
    let contents = std::fs::read_to_string(&catalog_path)?;
    let mut catalog: Catalog = serde_json::from_str(&contents)?;

    let interactions_path = dir.join(INTERACTIONS_FILE);
    if interactions_path.exists() {
        catalog.interactions = read_interactions(&interactions_path, &catalog)?;
    } else {
        tracing::warn!("No interaction table at {:?}", interactions_path);
    }

    for (medication, plant) in catalog.duplicate_pairs() {
        tracing::warn!(
            "Multiple interaction records for {} / {}; all are kept",
            medication,
            plant
        );
    }

    tracing::info!(
        "Loaded dataset from {:?}: {} medications, {} plants, {} interactions",
        dir,
        catalog.medications.len(),
        catalog.plants.len(),
        catalog.interactions.len()
    );
    Ok(catalog)
}

fn read_interactions(path: &Path, catalog: &Catalog) -> Result<Vec<Interaction>> {
    let medication_names: HashMap<&str, &str> = catalog
        .medications
        .iter()
        .map(|m| (m.id.as_str(), m.name.as_str()))
        .collect();
    let plant_names: HashMap<&str, &str> = catalog
        .plants
        .iter()
        .map(|p| (p.id.as_str(), p.name.as_str()))
        .collect();

    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut interactions = Vec::new();

    for (index, result) in reader.deserialize::<CsvRow>().enumerate() {
        // Header is line 1
        let line = index + 2;
        let row = result?;
        let at_line = |e: Error| match e {
            Error::DataIntegrity(msg) => {
                Error::DataIntegrity(format!("{}:{}: {}", INTERACTIONS_FILE, line, msg))
            }
            other => other,
        };

        let medication_name = medication_names
            .get(row.medication_id.as_str())
            .ok_or_else(|| {
                Error::DataIntegrity(format!(
                    "{}:{}: unknown medication '{}'",
                    INTERACTIONS_FILE, line, row.medication_id
                ))
            })?
            .to_string();
        let plant_name = plant_names
            .get(row.plant_id.as_str())
            .ok_or_else(|| {
                Error::DataIntegrity(format!(
                    "{}:{}: unknown plant '{}'",
                    INTERACTIONS_FILE, line, row.plant_id
                ))
            })?
            .to_string();

        interactions.push(Interaction {
            id: row.id,
            medication_id: row.medication_id,
            medication_name,
            plant_id: row.plant_id,
            plant_name,
            severity: Severity::from_label(&row.severity).map_err(at_line)?,
            interaction_type: row.interaction_type,
            mechanism: row.mechanism,
            clinical_consequence: row.clinical_consequence,
            recommendation: row.recommendation,
            evidence_level: EvidenceLevel::from_label(&row.evidence_level).map_err(at_line)?,
            scientific_references: row
                .scientific_references
                .split(REFERENCE_SEPARATOR)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        });
    }

    tracing::debug!("Read {} interactions from {:?}", interactions.len(), path);
    Ok(interactions)
}

/// Write a catalog out as a dataset directory
pub fn save_dataset(catalog: &Catalog, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)?;

    let contents = serde_json::to_string_pretty(catalog)?;
    std::fs::write(dir.join(CATALOG_FILE), contents)?;

    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_path(dir.join(INTERACTIONS_FILE))?;
    for interaction in &catalog.interactions {
        writer.serialize(CsvRow::from(interaction))?;
    }
    writer.flush()?;

    tracing::info!("Saved dataset to {:?}", dir);
    Ok(())
}
