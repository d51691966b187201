use crate::error::AppResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Descripteurs de domaines déclarés dans un fichier JSON
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainManifest {
    #[serde(default)]
    pub domains: Vec<String>,
}

impl DomainManifest {
    /// Charge le manifeste depuis un fichier JSON
    pub fn load_from_file(path: &Path) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let manifest: DomainManifest = serde_json::from_str(&content)?;
        Ok(manifest)
    }

    /// Sauvegarde le manifeste dans un fichier JSON
    pub fn save_to_file(&self, path: &Path) -> AppResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use tempfile::tempdir;

    #[test]
    fn test_load_manifest() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("domains.json");
        std::fs::write(
            &path,
            r#"{ "domains": ["example.com -> app:3000 #production", "static.example.com"] }"#,
        )
        .unwrap();

        let manifest = DomainManifest::load_from_file(&path).unwrap();
        assert_eq!(manifest.domains.len(), 2);
        assert_eq!(manifest.domains[1], "static.example.com");
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("domains.json");
        let manifest = DomainManifest {
            domains: vec!["old.example.com => https://new.example.com".to_string()],
        };
        manifest.save_to_file(&path).unwrap();

        let loaded = DomainManifest::load_from_file(&path).unwrap();
        assert_eq!(loaded.domains, manifest.domains);
    }

    #[test]
    fn test_missing_domains_key_defaults_to_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("domains.json");
        std::fs::write(&path, "{}").unwrap();

        let manifest = DomainManifest::load_from_file(&path).unwrap();
        assert!(manifest.domains.is_empty());
    }

    #[test]
    fn test_errors_are_typed() {
        let dir = tempdir().unwrap();
        let missing = DomainManifest::load_from_file(&dir.path().join("nope.json"));
        assert!(matches!(missing, Err(AppError::Io(_))));

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "not json").unwrap();
        let broken = DomainManifest::load_from_file(&path);
        assert!(matches!(broken, Err(AppError::Serialization(_))));
    }
}
