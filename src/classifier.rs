// 🏷️ Item Classifier - Free-text description → canonical supply item
// Substring matching over a configured synonym table, first declared match wins.

use crate::expense::{ClassifiedExpense, ExpenseRecord};
use crate::normalizer::{normalize, title_case};
use crate::synonyms::SynonymTable;

/// Item name used when a row carries no description at all
pub const NO_DESCRIPTION: &str = "Sem descrição";

// ============================================================================
// BASE LABEL
// ============================================================================

/// Part of a description before the first colon, trimmed.
///
/// "Cimento: 50kg saco" → "Cimento". Without a colon the whole text is used.
pub fn base_label(description: &str) -> &str {
    let label = match description.find(':') {
        Some(pos) => &description[..pos],
        None => description,
    };
    label.trim()
}

// ============================================================================
// ITEM CLASSIFIER
// ============================================================================

/// Classifier bound to one synonym table.
///
/// Aliases are normalized once up front; use this when classifying a whole
/// sheet instead of calling [`classify`] row by row.
pub struct ItemClassifier<'a> {
    table: &'a SynonymTable,

    /// Normalized aliases, parallel to `table.entries()`
    normalized_aliases: Vec<Vec<String>>,
}

impl<'a> ItemClassifier<'a> {
    pub fn new(table: &'a SynonymTable) -> Self {
        let normalized_aliases = table
            .entries()
            .iter()
            .map(|entry| {
                entry
                    .aliases
                    .iter()
                    .map(|alias| normalize(alias))
                    .filter(|alias| !alias.is_empty())
                    .collect()
            })
            .collect();

        ItemClassifier {
            table,
            normalized_aliases,
        }
    }

    /// Canonical item for a description (never fails)
    pub fn classify(&self, description: Option<&str>) -> String {
        let label = match description.map(base_label) {
            Some(label) if !label.is_empty() => label,
            _ => return NO_DESCRIPTION.to_string(),
        };

        match self.find_canonical(&normalize(label)) {
            Some(canonical) => canonical.to_string(),
            None => title_case(label),
        }
    }

    /// First canonical (declaration order) with any alias inside the label.
    ///
    /// Plain substring test: a short alias such as "cal" also hits "calha".
    fn find_canonical(&self, normalized_label: &str) -> Option<&'a str> {
        self.table
            .entries()
            .iter()
            .zip(&self.normalized_aliases)
            .find(|(_, aliases)| {
                aliases
                    .iter()
                    .any(|alias| normalized_label.contains(alias.as_str()))
            })
            .map(|(entry, _)| entry.canonical.as_str())
    }

    pub fn classify_record(&self, record: &ExpenseRecord) -> ClassifiedExpense {
        ClassifiedExpense {
            item: self.classify(record.description_str()),
            record: record.clone(),
        }
    }
}

// ============================================================================
// FREE FUNCTIONS
// ============================================================================

/// Canonical item for a single description
pub fn classify(description: Option<&str>, table: &SynonymTable) -> String {
    ItemClassifier::new(table).classify(description)
}

/// Classify every record, keeping input order
pub fn classify_all(records: &[ExpenseRecord], table: &SynonymTable) -> Vec<ClassifiedExpense> {
    let classifier = ItemClassifier::new(table);
    records
        .iter()
        .map(|record| classifier.classify_record(record))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
