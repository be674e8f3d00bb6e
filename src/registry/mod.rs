//! Mapping registry - store and reuse confirmed header mappings.
//!
//! Saves mapping sets to disk and automatically matches them to CSV formats
//! based on column overlap, so a recurring supplier export only has to be
//! mapped once.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::RegistryError;
use crate::mapping::FieldMapping;

/// Directory where mappings are stored (relative to current dir)
const DEFAULT_REGISTRY_DIR: &str = ".assetbook/mappings";

/// A stored mapping set with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredMapping {
    /// Unique identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// The header-to-field mappings
    pub mappings: Vec<FieldMapping>,
    /// CSV columns this mapping set was created for
    pub csv_columns: Vec<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last time this mapping set was used
    pub last_used: Option<String>,
    /// Success rate (0.0 to 1.0)
    pub success_rate: f64,
    /// Number of times used
    pub use_count: u32,
}

/// Registry for managing stored mapping sets.
pub struct MappingRegistry {
    /// Directory where mappings are stored
    registry_dir: PathBuf,
    /// Loaded mappings (id -> stored set)
    stored: HashMap<String, StoredMapping>,
}

impl MappingRegistry {
    /// Create a new registry, loading existing mappings from disk.
    pub fn new() -> Self {
        Self::with_dir(DEFAULT_REGISTRY_DIR)
    }

    /// Create a registry with a custom directory.
    pub fn with_dir(dir: impl AsRef<Path>) -> Self {
        let registry_dir = PathBuf::from(dir.as_ref());
        let mut registry = Self {
            registry_dir,
            stored: HashMap::new(),
        };
        registry.load_all();
        registry
    }

    /// Load all mapping sets from the registry directory.
    fn load_all(&mut self) {
        if !self.registry_dir.exists() {
            return;
        }

        let entries = match fs::read_dir(&self.registry_dir) {
            Ok(e) => e,
            Err(_) => return,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Ok(content) = fs::read_to_string(&path) {
                    if let Ok(stored) = serde_json::from_str::<StoredMapping>(&content) {
                        self.stored.insert(stored.id.clone(), stored);
                    }
                }
            }
        }
    }

    /// Get all stored mapping sets.
    pub fn list(&self) -> Vec<&StoredMapping> {
        self.stored.values().collect()
    }

    /// Get a mapping set by ID.
    pub fn get(&self, id: &str) -> Option<&StoredMapping> {
        self.stored.get(id)
    }

    /// Find compatible mapping sets for given CSV columns.
    /// Returns sets sorted by compatibility score and success rate.
    pub fn find_compatible(&self, csv_columns: &[String]) -> Vec<(&StoredMapping, f64)> {
        let mut compatible: Vec<_> = self
            .stored
            .values()
            .filter_map(|m| {
                let score = self.calculate_compatibility(&m.csv_columns, csv_columns);
                if score > 0.5 {
                    Some((m, score))
                } else {
                    None
                }
            })
            .collect();

        // Sort by: compatibility score * success rate (descending)
        compatible.sort_by(|a, b| {
            let score_a = a.1 * a.0.success_rate;
            let score_b = b.1 * b.0.success_rate;
            score_b.partial_cmp(&score_a).unwrap_or(std::cmp::Ordering::Equal)
        });

        compatible
    }

    /// Calculate compatibility score between stored columns and CSV columns.
    fn calculate_compatibility(&self, stored: &[String], csv: &[String]) -> f64 {
        if stored.is_empty() {
            return 0.0;
        }

        let csv_lower: Vec<String> = csv.iter().map(|c| c.to_lowercase()).collect();
        let match_count = stored
            .iter()
            .filter(|col| csv_lower.contains(&col.to_lowercase()))
            .count();

        match_count as f64 / stored.len() as f64
    }

    /// Save a new mapping set to the registry.
    pub fn save(
        &mut self,
        mappings: Vec<FieldMapping>,
        name: &str,
        csv_columns: Vec<String>,
    ) -> Result<String, RegistryError> {
        fs::create_dir_all(&self.registry_dir)?;

        let id = self.generate_id(name);
        let stored = StoredMapping {
            id: id.clone(),
            name: name.to_string(),
            mappings,
            csv_columns,
            created_at: chrono::Utc::now().to_rfc3339(),
            last_used: None,
            success_rate: 1.0,
            use_count: 0,
        };

        let path = self.registry_dir.join(format!("{}.json", id));
        let content = serde_json::to_string_pretty(&stored)?;
        fs::write(&path, content)?;

        self.stored.insert(id.clone(), stored);
        Ok(id)
    }

    /// Import a mapping set from a JSON file.
    pub fn import(&mut self, path: &Path, name: Option<&str>) -> Result<String, RegistryError> {
        let content = fs::read_to_string(path)?;

        let mappings: Vec<FieldMapping> = serde_json::from_str(&content)
            .map_err(|e| RegistryError::InvalidTemplate(e.to_string()))?;

        let mapping_name = name.unwrap_or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("imported")
        });

        let csv_columns: Vec<String> = mappings.iter().map(|m| m.csv_header.clone()).collect();

        self.save(mappings, mapping_name, csv_columns)
    }

    /// Update statistics after using a mapping set.
    pub fn update_stats(&mut self, id: &str, success: bool) {
        if let Some(stored) = self.stored.get_mut(id) {
            // Exponential moving average
            stored.success_rate = if success {
                stored.success_rate * 0.9 + 0.1
            } else {
                stored.success_rate * 0.9
            };
            stored.last_used = Some(chrono::Utc::now().to_rfc3339());
            stored.use_count += 1;

            let path = self.registry_dir.join(format!("{}.json", id));
            if let Ok(content) = serde_json::to_string_pretty(stored) {
                let _ = fs::write(&path, content);
            }
        }
    }

    /// Delete a mapping set from the registry.
    pub fn delete(&mut self, id: &str) -> Result<(), RegistryError> {
        if self.stored.remove(id).is_some() {
            let path = self.registry_dir.join(format!("{}.json", id));
            fs::remove_file(&path)?;
            Ok(())
        } else {
            Err(RegistryError::NotFound(id.to_string()))
        }
    }

    /// Generate a unique ID from a name.
    fn generate_id(&self, name: &str) -> String {
        let slug: String = name
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-");

        let timestamp = chrono::Utc::now().timestamp_millis();
        format!("{}-{}", slug, timestamp)
    }
}

impl Default for MappingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_mappings() -> Vec<FieldMapping> {
        vec![
            FieldMapping::new("Asset", "name"),
            FieldMapping::new("Serial", "serial_number"),
        ]
    }

    #[test]
    fn test_compatibility_score() {
        let registry = MappingRegistry::with_dir(tempdir().unwrap().path());

        let stored = vec!["Asset".to_string(), "Serial".to_string(), "Price".to_string()];
        let csv = vec!["Asset".to_string(), "Serial".to_string(), "Vendor".to_string()];

        let score = registry.calculate_compatibility(&stored, &csv);
        assert!((score - 0.666).abs() < 0.01); // 2/3 match
    }

    #[test]
    fn test_case_insensitive_match() {
        let registry = MappingRegistry::with_dir(tempdir().unwrap().path());

        let stored = vec!["asset".to_string(), "SERIAL".to_string()];
        let csv = vec!["ASSET".to_string(), "serial".to_string()];

        let score = registry.calculate_compatibility(&stored, &csv);
        assert!((score - 1.0).abs() < 0.01); // 100% match (case insensitive)
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let id = {
            let mut registry = MappingRegistry::with_dir(dir.path());
            registry
                .save(
                    sample_mappings(),
                    "supplier export",
                    vec!["Asset".to_string(), "Serial".to_string()],
                )
                .unwrap()
        };

        let registry = MappingRegistry::with_dir(dir.path());
        let stored = registry.get(&id).expect("reloaded from disk");
        assert_eq!(stored.name, "supplier export");
        assert_eq!(stored.mappings.len(), 2);
        assert_eq!(stored.use_count, 0);
    }

    #[test]
    fn test_find_compatible_filters_below_threshold() {
        let dir = tempdir().unwrap();
        let mut registry = MappingRegistry::with_dir(dir.path());
        registry
            .save(
                sample_mappings(),
                "assets",
                vec!["Asset".to_string(), "Serial".to_string()],
            )
            .unwrap();

        let hits = registry.find_compatible(&["Asset".to_string(), "Serial".to_string()]);
        assert_eq!(hits.len(), 1);

        let misses = registry.find_compatible(&["Venue".to_string(), "Date".to_string()]);
        assert!(misses.is_empty());
    }

    #[test]
    fn test_update_stats_moving_average() {
        let dir = tempdir().unwrap();
        let mut registry = MappingRegistry::with_dir(dir.path());
        let id = registry
            .save(sample_mappings(), "assets", vec!["Asset".to_string()])
            .unwrap();

        registry.update_stats(&id, false);
        let stored = registry.get(&id).unwrap();
        assert!((stored.success_rate - 0.9).abs() < 1e-9);
        assert_eq!(stored.use_count, 1);
        assert!(stored.last_used.is_some());
    }

    #[test]
    fn test_delete_missing_is_error() {
        let dir = tempdir().unwrap();
        let mut registry = MappingRegistry::with_dir(dir.path());
        assert!(matches!(
            registry.delete("nope"),
            Err(RegistryError::NotFound(_))
        ));
    }
}
