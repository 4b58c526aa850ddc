// 📚 Synonym Table - Canonical supply items as data
// Canonical name → aliases, kept in declaration order. The first canonical
// whose alias matches wins, so the order in the file is part of the contract.

use anyhow::{bail, Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

// ============================================================================
// SYNONYM ENTRY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynonymEntry {
    /// User-facing item name (e.g. "Cimento")
    pub canonical: String,

    /// Raw fragments known to refer to this item, tried in order
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl SynonymEntry {
    pub fn new(canonical: impl Into<String>, aliases: &[&str]) -> Self {
        SynonymEntry {
            canonical: canonical.into(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }
}

// ============================================================================
// SYNONYM TABLE
// ============================================================================

/// Ordered canonical → aliases mapping.
///
/// Serialized as a JSON array of `{ "canonical": ..., "aliases": [...] }` so
/// the declaration order survives a round trip. Canonical names are unique.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<SynonymEntry>", into = "Vec<SynonymEntry>")]
pub struct SynonymTable {
    entries: Vec<SynonymEntry>,
}

impl SynonymTable {
    /// Create an empty table (every description falls back to its own label)
    pub fn new() -> Self {
        SynonymTable {
            entries: Vec::new(),
        }
    }

    /// Build a table from entries, rejecting duplicate canonical names
    pub fn from_entries(entries: Vec<SynonymEntry>) -> Result<Self> {
        let mut table = SynonymTable::new();
        for entry in entries {
            table.push(entry)?;
        }
        Ok(table)
    }

    /// Load a table from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read synonyms file: {:?}", path.as_ref()))?;

        SynonymTable::from_json_str(&content)
    }

    /// Parse a table from JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse synonyms JSON")
    }

    /// Append an entry after all existing ones
    pub fn push(&mut self, entry: SynonymEntry) -> Result<()> {
        let canonical = entry.canonical.trim();
        if canonical.is_empty() {
            bail!("Synonym entry has an empty canonical name");
        }
        if self.entries.iter().any(|e| e.canonical == entry.canonical) {
            bail!("Duplicate canonical name in synonym table: {}", entry.canonical);
        }

        self.entries.push(entry);
        Ok(())
    }

    /// Entries in declaration order
    pub fn entries(&self) -> &[SynonymEntry] {
        &self.entries
    }

    pub fn canonical_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.canonical.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Common construction supplies as they appear in project sheets
    pub fn construction_defaults() -> Self {
        let entries = vec![
            SynonymEntry::new("Cimento", &["cimento", "cp-ii", "cp ii", "cp-v", "cp v"]),
            SynonymEntry::new("Argamassa", &["argamassa", "reboco pronto"]),
            SynonymEntry::new("Areia", &["areia"]),
            SynonymEntry::new("Brita", &["brita", "pedra britada", "pedrisco"]),
            SynonymEntry::new("Tijolo", &["tijolo", "bloco ceramico"]),
            SynonymEntry::new("Bloco de Concreto", &["bloco de concreto", "bloco concreto"]),
            SynonymEntry::new("Concreto Usinado", &["concreto usinado", "concreto"]),
            SynonymEntry::new("Vergalhão", &["vergalhao", "ferro", "ca-50", "ca-60"]),
            SynonymEntry::new("Cal", &["cal hidratada", "cal"]),
            SynonymEntry::new("Madeira", &["madeira", "tabua", "caibro", "sarrafo", "pontalete"]),
            SynonymEntry::new("Telha", &["telha"]),
            SynonymEntry::new("Tinta", &["tinta", "latex", "esmalte", "selador"]),
            SynonymEntry::new("Tubo PVC", &["tubo", "pvc", "cano"]),
            SynonymEntry::new("Fio Elétrico", &["fio", "cabo flexivel"]),
            SynonymEntry::new("Piso", &["piso", "porcelanato", "revestimento"]),
            SynonymEntry::new("Rejunte", &["rejunte"]),
            SynonymEntry::new("Impermeabilizante", &["impermeabilizante", "manta asfaltica"]),
        ];

        SynonymTable { entries }
    }
}

impl TryFrom<Vec<SynonymEntry>> for SynonymTable {
    type Error = anyhow::Error;

    fn try_from(entries: Vec<SynonymEntry>) -> Result<Self> {
        SynonymTable::from_entries(entries)
    }
}

impl From<SynonymTable> for Vec<SynonymEntry> {
    fn from(table: SynonymTable) -> Self {
        table.entries
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_keeps_declaration_order() {
        let json = r#"[
            {"canonical": "Tijolo", "aliases": ["tijolo", "bloco"]},
            {"canonical": "Areia", "aliases": ["areia"]},
            {"canonical": "Cimento", "aliases": ["cimento"]}
        ]"#;

        let table = SynonymTable::from_json_str(json).unwrap();
        let names: Vec<&str> = table.canonical_names().collect();

        assert_eq!(names, vec!["Tijolo", "Areia", "Cimento"]);
        assert_eq!(table.entries()[0].aliases, vec!["tijolo", "bloco"]);
    }

    #[test]
    fn test_missing_aliases_default_to_empty() {
        let table = SynonymTable::from_json_str(r#"[{"canonical": "Areia"}]"#).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.entries()[0].aliases.is_empty());
    }

    #[test]
    fn test_duplicate_canonical_rejected() {
        let json = r#"[
            {"canonical": "Areia", "aliases": ["areia"]},
            {"canonical": "Areia", "aliases": ["areia fina"]}
        ]"#;

        let err = SynonymTable::from_json_str(json).unwrap_err();
        assert!(format!("{:#}", err).contains("Duplicate canonical name"));
    }

    #[test]
    fn test_empty_canonical_rejected() {
        let mut table = SynonymTable::new();
        assert!(table.push(SynonymEntry::new("  ", &["x"])).is_err());
        assert!(table.is_empty());
    }

    #[test]
    fn test_serialize_round_trip_as_array() {
        let table = SynonymTable::from_entries(vec![
            SynonymEntry::new("Cimento", &["cimento"]),
            SynonymEntry::new("Cal", &["cal"]),
        ])
        .unwrap();

        let json = serde_json::to_string(&table).unwrap();
        assert!(json.starts_with('['));

        let back = SynonymTable::from_json_str(&json).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn test_defaults_are_valid() {
        let defaults = SynonymTable::construction_defaults();
        let rebuilt = SynonymTable::from_entries(defaults.entries().to_vec()).unwrap();

        assert_eq!(rebuilt.len(), defaults.len());
        assert_eq!(defaults.canonical_names().next(), Some("Cimento"));
    }
}
