use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::warn;

use crate::core::technology::Technology;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse catalog: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid technology: {0}")]
    InvalidTechnology(String),
}

/// Catalog version for compatibility checking
pub const CATALOG_VERSION: &str = "1.0.0";

/// Serializable catalog format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogData {
    pub version: String,
    pub technologies: Vec<Technology>,
}

/// The read-only list of known technologies
#[derive(Debug)]
pub struct TechnologyRegistry {
    technologies: Vec<Technology>,

    /// Index: technology name -> index in technologies vec
    name_to_index: HashMap<String, usize>,
}

static EMBEDDED: OnceLock<TechnologyRegistry> = OnceLock::new();

impl TechnologyRegistry {
    /// The process-wide registry built from the embedded catalog.
    ///
    /// Built once on first use and never modified afterwards.
    pub fn embedded() -> &'static Self {
        EMBEDDED.get_or_init(|| {
            // Validated at compile time via build.rs
            Self::load_embedded().expect("embedded catalog is validated by build.rs")
        })
    }

    /// Parse the embedded default catalog
    pub fn load_embedded() -> Result<Self, CatalogError> {
        const EMBEDDED_CATALOG: &str = include_str!("../../catalogs/technologies.json");
        Self::from_json(EMBEDDED_CATALOG)
    }

    /// Load catalog from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse catalog from JSON string
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let data: CatalogData = serde_json::from_str(json)?;

        // Version check (warn but don't fail)
        if data.version != CATALOG_VERSION {
            warn!(
                expected = CATALOG_VERSION,
                found = %data.version,
                "Catalog version mismatch"
            );
        }

        Self::from_technologies(data.technologies)
    }

    /// Build a registry from technology definitions, checking their invariants
    pub fn from_technologies(technologies: Vec<Technology>) -> Result<Self, CatalogError> {
        let mut name_to_index = HashMap::with_capacity(technologies.len());
        for (index, technology) in technologies.iter().enumerate() {
            technology
                .validate()
                .map_err(CatalogError::InvalidTechnology)?;
            if name_to_index.insert(technology.name.clone(), index).is_some() {
                return Err(CatalogError::InvalidTechnology(format!(
                    "duplicate technology name '{}'",
                    technology.name
                )));
            }
        }

        Ok(Self {
            technologies,
            name_to_index,
        })
    }

    /// All technologies in catalog order
    pub fn technologies(&self) -> &[Technology] {
        &self.technologies
    }

    /// Get a technology by name
    pub fn get(&self, name: &str) -> Option<&Technology> {
        self.name_to_index
            .get(name)
            .map(|&idx| &self.technologies[idx])
    }

    /// Export catalog to JSON
    pub fn to_json(&self) -> Result<String, CatalogError> {
        let data = CatalogData {
            version: CATALOG_VERSION.to_string(),
            technologies: self.technologies.clone(),
        };
        Ok(serde_json::to_string_pretty(&data)?)
    }

    /// Number of technologies in catalog
    pub fn len(&self) -> usize {
        self.technologies.len()
    }

    /// Check if catalog is empty
    pub fn is_empty(&self) -> bool {
        self.technologies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ReadSubstring;

    #[test]
    fn test_load_embedded_catalog() {
        let registry = TechnologyRegistry::load_embedded().unwrap();
        assert!(!registry.is_empty());
        for technology in registry.technologies() {
            assert!(technology.validate().is_ok(), "{technology} is invalid");
        }
    }

    #[test]
    fn test_embedded_is_shared() {
        let a = TechnologyRegistry::embedded();
        let b = TechnologyRegistry::embedded();
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn test_registry_get_by_name() {
        let registry = TechnologyRegistry::embedded();

        let v2 = registry.get("10xv2").unwrap();
        assert_eq!(v2.description, "10x version 2");
        assert_eq!(v2.file_count, 2);
        assert_eq!(v2.barcode, vec![ReadSubstring::new(0, 0, Some(16))]);
        assert_eq!(v2.umi, vec![ReadSubstring::new(0, 16, Some(26))]);
        assert_eq!(v2.sequence, ReadSubstring::new(1, 0, None));
        assert!(v2.has_whitelist());
        assert!(v2.alignment_tags.is_some());

        let indrops = registry.get("indropsv3").unwrap();
        assert_eq!(indrops.file_count, 3);
        assert_eq!(indrops.barcode_length(), 16);
        assert!(indrops.alignment_tags.is_none());

        assert!(!registry.get("dropseq").unwrap().has_whitelist());
    }

    #[test]
    fn test_registry_get_nonexistent() {
        assert!(TechnologyRegistry::embedded().get("nonexistent").is_none());
    }

    #[test]
    fn test_registry_to_json_round_trips() {
        let registry = TechnologyRegistry::embedded();
        let json = registry.to_json().unwrap();
        assert!(json.contains("\"technologies\""));
        assert!(json.contains("10xv3"));

        let reparsed = TechnologyRegistry::from_json(&json).unwrap();
        assert_eq!(reparsed.technologies(), registry.technologies());
    }

    #[test]
    fn test_invalid_technology_rejected() {
        let json = r#"{
            "version": "1.0.0",
            "technologies": [{
                "name": "broken",
                "description": "stream out of range",
                "file_count": 1,
                "sequence": { "stream": 0, "start": 0, "stop": null },
                "umi": [{ "stream": 1, "start": 0, "stop": 8 }],
                "barcode": []
            }]
        }"#;
        let err = TechnologyRegistry::from_json(json).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidTechnology(_)));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let tech = Technology::new("dup", "dup", 1, ReadSubstring::new(0, 0, None));
        let err = TechnologyRegistry::from_technologies(vec![tech.clone(), tech]).unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }
}
