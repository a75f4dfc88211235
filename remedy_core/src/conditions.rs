//! Matching of declared medical conditions against plant ailments.
//!
//! Terms are compared as normalized token sets rather than raw substrings:
//! lower-cased, Spanish diacritics folded, split on anything that is not a
//! letter or digit, with short function words dropped. An ailment matches a
//! condition term when either token set contains the other, so "Dolor" matches
//! "Dolor de cabeza" but not "Dolorido".

use crate::MedicalCondition;
use std::collections::{BTreeSet, HashMap};

const STOPWORDS: [&str; 13] = [
    "de", "del", "la", "el", "los", "las", "y", "e", "en", "por", "a", "o", "u",
];

pub type TokenSet = BTreeSet<String>;

/// Fold the diacritics that appear in Spanish text
fn fold(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

/// Normalize free text into its set of significant tokens
pub fn tokenize(text: &str) -> TokenSet {
    text.to_lowercase()
        .chars()
        .map(fold)
        .collect::<String>()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty() && !STOPWORDS.contains(t))
        .map(str::to_string)
        .collect()
}

fn overlaps(a: &TokenSet, b: &TokenSet) -> bool {
    !a.is_empty() && !b.is_empty() && (a.is_subset(b) || b.is_subset(a))
}

/// A condition resolved to the token sets of every term that names it
#[derive(Clone, Debug)]
struct ConditionTerms {
    name: String,
    terms: BTreeSet<TokenSet>,
}

/// Resolves condition ids and tests ailments against them
#[derive(Clone, Debug, Default)]
pub struct ConditionMatcher {
    conditions: HashMap<String, ConditionTerms>,
}

impl ConditionMatcher {
    /// Build from the condition catalog plus extra curated aliases keyed by condition id
    pub fn new(conditions: &[MedicalCondition], extra_aliases: &HashMap<String, Vec<String>>) -> Self {
        let mut table = HashMap::new();
        for condition in conditions {
            let terms: BTreeSet<TokenSet> = std::iter::once(&condition.name)
                .chain(condition.aliases.iter())
                .chain(extra_aliases.get(&condition.id).into_iter().flatten())
                .map(|term| tokenize(term))
                .filter(|t| !t.is_empty())
                .collect();
            table.insert(
                condition.id.clone(),
                ConditionTerms {
                    name: condition.name.clone(),
                    terms,
                },
            );
        }
        Self { conditions: table }
    }

    /// Names of the given condition ids that exist in the table, in input order
    pub fn resolve_names(&self, condition_ids: &[String]) -> Vec<String> {
        condition_ids
            .iter()
            .filter_map(|id| self.conditions.get(id).map(|c| c.name.clone()))
            .collect()
    }

    /// Names of the conditions (among `condition_ids`) that any of `ailments` matches
    pub fn matching_conditions(&self, condition_ids: &[String], ailments: &[String]) -> Vec<String> {
        let ailment_tokens: Vec<TokenSet> = ailments.iter().map(|a| tokenize(a)).collect();
        condition_ids
            .iter()
            .filter_map(|id| self.conditions.get(id))
            .filter(|condition| {
                condition
                    .terms
                    .iter()
                    .any(|term| ailment_tokens.iter().any(|a| overlaps(term, a)))
            })
            .map(|condition| condition.name.clone())
            .collect()
    }

    pub fn matches_any(&self, condition_ids: &[String], ailments: &[String]) -> bool {
        !self.matching_conditions(condition_ids, ailments).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condition(id: &str, name: &str, aliases: &[&str]) -> MedicalCondition {
        MedicalCondition {
            id: id.into(),
            name: name.into(),
            aliases: aliases.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_tokenize_folds_case_and_accents() {
        let tokens = tokenize("Digestión  PESADA, de noche");
        assert_eq!(
            tokens,
            strings(&["digestion", "noche", "pesada"]).into_iter().collect::<TokenSet>()
        );
    }

    #[test]
    fn test_token_containment_is_bidirectional() {
        let matcher = ConditionMatcher::new(
            &[condition("dolor", "Dolor", &[]), condition("insomnio", "Insomnio leve", &[])],
            &HashMap::new(),
        );
        assert!(matcher.matches_any(&strings(&["dolor"]), &strings(&["Dolor de cabeza"])));
        assert!(matcher.matches_any(&strings(&["insomnio"]), &strings(&["Insomnio"])));
    }

    #[test]
    fn test_repeated_aliases_are_stored_once() {
        let mut extra = HashMap::new();
        extra.insert("reflujo".to_string(), strings(&["ACIDEZ", "Ardor"]));
        let matcher = ConditionMatcher::new(
            &[condition("reflujo", "Acidez", &["Reflujo", "acidez"])],
            &extra,
        );

        let terms = &matcher.conditions["reflujo"].terms;
        assert_eq!(terms.len(), 3);
        assert!(terms.contains(&tokenize("Ardor")));
    }

    #[test]
    fn test_partial_words_do_not_match() {
        let matcher = ConditionMatcher::new(&[condition("dolor", "Dolor", &[])], &HashMap::new());
        assert!(!matcher.matches_any(&strings(&["dolor"]), &strings(&["Músculo dolorido"])));
    }

    #[test]
    fn test_catalog_and_config_aliases() {
        let mut extra = HashMap::new();
        extra.insert("reflujo".to_string(), strings(&["Ardor"]));
        let matcher = ConditionMatcher::new(
            &[condition("reflujo", "Reflujo", &["Acidez estomacal"])],
            &extra,
        );
        let ids = strings(&["reflujo"]);
        assert!(matcher.matches_any(&ids, &strings(&["Acidez estomacal"])));
        assert!(matcher.matches_any(&ids, &strings(&["Ardor"])));
        assert!(!matcher.matches_any(&ids, &strings(&["Náuseas"])));
    }

    #[test]
    fn test_unknown_condition_ids_are_ignored() {
        let matcher = ConditionMatcher::new(&[condition("insomnio", "Insomnio", &[])], &HashMap::new());
        let ids = strings(&["no_such", "insomnio"]);
        assert_eq!(matcher.resolve_names(&ids), strings(&["Insomnio"]));
        assert_eq!(
            matcher.matching_conditions(&ids, &strings(&["Insomnio"])),
            strings(&["Insomnio"])
        );
    }

    #[test]
    fn test_stopword_only_terms_never_match() {
        let matcher = ConditionMatcher::new(&[condition("x", "de la", &[])], &HashMap::new());
        assert!(!matcher.matches_any(&strings(&["x"]), &strings(&["de"])));
    }
}
