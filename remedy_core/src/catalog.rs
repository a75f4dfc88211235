//! Default reference dataset and catalog validation.
//!
//! The built-in catalog lets the engine run without any data files. It holds
//! a small set of medications, plants, conditions and documented interactions.

use crate::types::*;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog_internal);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Builds the default catalog
///
/// **Note**: For production use, prefer `get_default_catalog()` which returns a
/// cached reference. This function is retained for testing and custom catalog creation.
pub fn build_default_catalog() -> Catalog {
    build_default_catalog_internal()
}

fn tags(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn medication(id: &str, name: &str, ingredient: &str, category: &str, class: &str, t: &[&str]) -> Medication {
    Medication {
        id: id.into(),
        name: name.into(),
        active_ingredient: ingredient.into(),
        category: category.into(),
        tags: tags(t),
        therapeutic_class: class.into(),
    }
}

/// Safety flags are given as (pregnancy, lactation, children)
fn plant(
    id: &str,
    name: &str,
    scientific_name: &str,
    category: &str,
    t: &[&str],
    ailments: &[&str],
    safety: (Option<bool>, Option<bool>, Option<bool>),
) -> Plant {
    Plant {
        id: id.into(),
        name: name.into(),
        scientific_name: scientific_name.into(),
        category: category.into(),
        tags: tags(t),
        ailments: tags(ailments),
        safe_pregnancy: safety.0,
        safe_lactation: safety.1,
        safe_children: safety.2,
    }
}

fn build_default_catalog_internal() -> Catalog {
    // ========================================================================
    // Medications
    // ========================================================================

    let medications = vec![
        medication("warfarina", "Warfarina", "warfarina sódica", "Anticoagulante", "Antagonista de la vitamina K", &["sangre", "coagulación"]),
        medication("omeprazol", "Omeprazol", "omeprazol", "Digestiva", "Inhibidor de la bomba de protones", &["estómago", "acidez"]),
        medication("sertralina", "Sertralina", "sertralina clorhidrato", "Antidepresivo", "ISRS", &["serotonina", "ánimo"]),
        medication("ibuprofeno", "Ibuprofeno", "ibuprofeno", "Antiinflamatoria", "AINE", &["dolor", "inflamación"]),
        medication("metformina", "Metformina", "metformina clorhidrato", "Antidiabético", "Biguanida", &["glucosa"]),
        medication("lorazepam", "Lorazepam", "lorazepam", "Sedante", "Benzodiacepina", &["sueño", "ansiedad"]),
    ];

    // ========================================================================
    // Plants
    // ========================================================================

    let plants = vec![
        plant("ginkgo", "Ginkgo", "Ginkgo biloba", "Circulatoria", &["circulación", "memoria"], &["Mala circulación", "Pérdida de memoria"], (Some(false), Some(false), None)),
        plant("manzanilla", "Manzanilla", "Matricaria chamomilla", "Digestiva", &["estómago", "calmante"], &["Acidez estomacal", "Digestión pesada", "Insomnio leve"], (Some(true), Some(true), Some(true))),
        plant("hiperico", "Hipérico", "Hypericum perforatum", "Sedante", &["ánimo"], &["Depresión leve", "Ansiedad"], (Some(false), Some(false), Some(false))),
        plant("valeriana", "Valeriana", "Valeriana officinalis", "Sedante", &["sueño", "calmante"], &["Insomnio", "Nerviosismo"], (Some(false), None, Some(false))),
        plant("jengibre", "Jengibre", "Zingiber officinale", "Antiinflamatoria", &["inflamación", "estómago"], &["Náuseas", "Dolor articular"], (None, None, Some(true))),
        plant("curcuma", "Cúrcuma", "Curcuma longa", "Antiinflamatoria", &["inflamación", "dolor"], &["Dolor articular", "Inflamación"], (Some(false), None, None)),
        plant("ajo", "Ajo", "Allium sativum", "Circulatoria", &["sangre", "circulación"], &["Hipertensión", "Colesterol alto"], (Some(true), Some(true), Some(true))),
        plant("melisa", "Melisa", "Melissa officinalis", "Sedante", &["sueño", "calmante", "estómago"], &["Ansiedad", "Insomnio", "Dolor de cabeza tensional"], (None, None, Some(true))),
        plant("menta", "Menta", "Mentha piperita", "Digestiva", &["estómago"], &["Digestión pesada", "Dolor de cabeza"], (Some(true), Some(false), Some(false))),
    ];

    // ========================================================================
    // Medical Conditions
    // ========================================================================

    let conditions = vec![
        MedicalCondition { id: "insomnio".into(), name: "Insomnio".into(), aliases: tags(&["Trastornos del sueño"]) },
        MedicalCondition { id: "ansiedad".into(), name: "Ansiedad".into(), aliases: tags(&["Nerviosismo", "Estrés"]) },
        MedicalCondition { id: "cefalea".into(), name: "Dolor de cabeza".into(), aliases: tags(&["Migraña", "Cefalea"]) },
        MedicalCondition { id: "reflujo".into(), name: "Reflujo gastroesofágico".into(), aliases: tags(&["Acidez estomacal", "Acidez"]) },
        MedicalCondition { id: "hipertension".into(), name: "Hipertensión".into(), aliases: vec![] },
        MedicalCondition { id: "artrosis".into(), name: "Artrosis".into(), aliases: tags(&["Dolor articular"]) },
    ];

    // ========================================================================
    // Interactions
    // ========================================================================

    let med_names: HashMap<&str, &str> = medications.iter().map(|m| (m.id.as_str(), m.name.as_str())).collect();
    let plant_names: HashMap<&str, &str> = plants.iter().map(|p| (p.id.as_str(), p.name.as_str())).collect();

    let interaction = |id: &str,
                       medication_id: &str,
                       plant_id: &str,
                       severity: Severity,
                       kind: &str,
                       mechanism: &str,
                       consequence: &str,
                       recommendation: &str,
                       evidence: EvidenceLevel,
                       references: &[&str]| Interaction {
        id: id.into(),
        medication_id: medication_id.into(),
        medication_name: med_names.get(medication_id).copied().unwrap_or(medication_id).into(),
        plant_id: plant_id.into(),
        plant_name: plant_names.get(plant_id).copied().unwrap_or(plant_id).into(),
        severity,
        interaction_type: kind.into(),
        mechanism: mechanism.into(),
        clinical_consequence: consequence.into(),
        recommendation: recommendation.into(),
        evidence_level: evidence,
        scientific_references: tags(references),
    };

    let interactions = vec![
        interaction(
            "int-001", "warfarina", "ginkgo", Severity::Grave, "CONTRAINDICACIÓN",
            "Inhibición de la agregación plaquetaria por ginkgólidos",
            "Aumento del riesgo de hemorragia",
            "Evitar la combinación",
            EvidenceLevel::Alta,
            &["Bent S, et al. J Gen Intern Med. 2005;20(7):657-61"],
        ),
        interaction(
            "int-002", "warfarina", "ajo", Severity::Moderada, "FARMACODINÁMICA",
            "Efecto antiagregante de la alicina",
            "Posible potenciación del efecto anticoagulante",
            "Vigilar INR si se consume en dosis altas",
            EvidenceLevel::Moderada,
            &[],
        ),
        interaction(
            "int-003", "warfarina", "jengibre", Severity::Moderada, "FARMACODINÁMICA",
            "Inhibición de la tromboxano sintetasa",
            "Posible aumento del tiempo de sangrado",
            "Usar con precaución y monitorizar",
            EvidenceLevel::Baja,
            &[],
        ),
        interaction(
            "int-004", "omeprazol", "manzanilla", Severity::Leve, "SINÉRGICA BENEFICIOSA",
            "Efecto protector de la mucosa gástrica",
            "Mejora del alivio sintomático de la acidez",
            "Puede tomarse como infusión complementaria",
            EvidenceLevel::Moderada,
            &["Srivastava JK, et al. Mol Med Rep. 2010;3(6):895-901"],
        ),
        interaction(
            "int-005", "omeprazol", "hiperico", Severity::Grave, "CONTRAINDICACIÓN",
            "Inducción de CYP2C19 y CYP3A4",
            "Reducción de la concentración plasmática de omeprazol",
            "Evitar la combinación",
            EvidenceLevel::Alta,
            &["Wang LS, et al. Clin Pharmacol Ther. 2004;75(3):191-7"],
        ),
        interaction(
            "int-006", "sertralina", "hiperico", Severity::Grave, "CONTRAINDICACIÓN",
            "Efecto serotoninérgico aditivo",
            "Riesgo de síndrome serotoninérgico",
            "No combinar bajo ningún concepto",
            EvidenceLevel::Alta,
            &["Lantz MS, et al. J Geriatr Psychiatry Neurol. 1999;12(1):7-10"],
        ),
        interaction(
            "int-007", "sertralina", "valeriana", Severity::Moderada, "FARMACODINÁMICA",
            "Depresión aditiva del sistema nervioso central",
            "Somnolencia excesiva",
            "Evitar conducir tras la toma",
            EvidenceLevel::Baja,
            &[],
        ),
        interaction(
            "int-008", "ibuprofeno", "ginkgo", Severity::Moderada, "FARMACODINÁMICA",
            "Efecto antiplaquetario aditivo",
            "Aumento del riesgo de sangrado gastrointestinal",
            "Vigilar signos de sangrado",
            EvidenceLevel::Moderada,
            &[],
        ),
        interaction(
            "int-009", "lorazepam", "valeriana", Severity::Moderada, "FARMACODINÁMICA",
            "Potenciación del efecto GABAérgico",
            "Sedación excesiva",
            "Reducir dosis o evitar la combinación",
            EvidenceLevel::Moderada,
            &[],
        ),
        interaction(
            "int-010", "lorazepam", "melisa", Severity::Leve, "SINÉRGICA",
            "Efecto ansiolítico suave complementario",
            "Mejor control de la ansiedad leve",
            "Compatible en infusión",
            EvidenceLevel::Baja,
            &[],
        ),
    ];

    Catalog {
        medications,
        plants,
        conditions,
        interactions,
    }
}

impl Catalog {
    pub fn plant(&self, id: &str) -> Option<&Plant> {
        self.plants.iter().find(|p| p.id == id)
    }

    pub fn medication(&self, id: &str) -> Option<&Medication> {
        self.medications.iter().find(|m| m.id == id)
    }

    /// Find a medication by id or, failing that, by case-insensitive name
    pub fn find_medication(&self, id_or_name: &str) -> Option<&Medication> {
        self.medication(id_or_name).or_else(|| {
            let wanted = id_or_name.to_lowercase();
            self.medications
                .iter()
                .find(|m| m.name.to_lowercase() == wanted)
        })
    }

    /// Medication–plant pairs documented by more than one interaction record
    pub fn duplicate_pairs(&self) -> Vec<(String, String)> {
        let mut counts: HashMap<(&str, &str), usize> = HashMap::new();
        let mut order = Vec::new();
        for i in &self.interactions {
            let key = (i.medication_id.as_str(), i.plant_id.as_str());
            let count = counts.entry(key).or_insert(0);
            *count += 1;
            if *count == 2 {
                order.push((key.0.to_string(), key.1.to_string()));
            }
        }
        order
    }

    /// Validate the catalog for consistency and completeness
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        let mut medication_ids = HashSet::new();
        for medication in &self.medications {
            if medication.id.is_empty() {
                errors.push("Medication has empty ID".to_string());
            }
            if medication.name.is_empty() {
                errors.push(format!("Medication '{}' has empty name", medication.id));
            }
            if !medication_ids.insert(medication.id.as_str()) {
                errors.push(format!("Duplicate medication ID '{}'", medication.id));
            }
        }

        let mut plant_ids = HashSet::new();
        for plant in &self.plants {
            if plant.id.is_empty() {
                errors.push("Plant has empty ID".to_string());
            }
            if plant.name.is_empty() {
                errors.push(format!("Plant '{}' has empty name", plant.id));
            }
            if !plant_ids.insert(plant.id.as_str()) {
                errors.push(format!("Duplicate plant ID '{}'", plant.id));
            }
        }

        let mut condition_ids = HashSet::new();
        for condition in &self.conditions {
            if condition.id.is_empty() || condition.name.trim().is_empty() {
                errors.push(format!("Condition '{}' has empty ID or name", condition.id));
            }
            if !condition_ids.insert(condition.id.as_str()) {
                errors.push(format!("Duplicate condition ID '{}'", condition.id));
            }
        }

        // Check that every interaction references existing records
        for interaction in &self.interactions {
            match self.medication(&interaction.medication_id) {
                None => errors.push(format!(
                    "Interaction '{}' references non-existent medication '{}'",
                    interaction.id, interaction.medication_id
                )),
                Some(m) if m.name != interaction.medication_name => errors.push(format!(
                    "Interaction '{}': medication name '{}' doesn't match catalog name '{}'",
                    interaction.id, interaction.medication_name, m.name
                )),
                Some(_) => {}
            }
            match self.plant(&interaction.plant_id) {
                None => errors.push(format!(
                    "Interaction '{}' references non-existent plant '{}'",
                    interaction.id, interaction.plant_id
                )),
                Some(p) if p.name != interaction.plant_name => errors.push(format!(
                    "Interaction '{}': plant name '{}' doesn't match catalog name '{}'",
                    interaction.id, interaction.plant_name, p.name
                )),
                Some(_) => {}
            }
        }

        errors
    }
}
