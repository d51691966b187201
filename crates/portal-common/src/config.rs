use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration principale chargée depuis les variables d'environnement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvConfig {
    /// Stage des descripteurs sans marqueur `#stage`.
    /// Gardé brut : une valeur invalide est signalée domaine par domaine.
    pub default_stage: String,
    /// Racine du stockage des certificats par domaine
    pub storage_root: PathBuf,
    /// Préfixe des répertoires web de chaque domaine
    pub web_root_prefix: PathBuf,
    /// Template de la page d'accueil
    pub welcome_template_path: PathBuf,
    /// Descripteurs de domaines séparés par des virgules
    pub domains: String,
    /// Fichier JSON optionnel avec d'autres descripteurs
    pub domains_file: Option<PathBuf>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            default_stage: "staging".to_string(),
            storage_root: PathBuf::from("/var/lib/portal/certs"),
            web_root_prefix: PathBuf::from("/var/www/vhosts"),
            welcome_template_path: PathBuf::from("/var/www/default/index.html.tpl"),
            domains: String::new(),
            domains_file: None,
        }
    }
}

impl EnvConfig {
    /// Charge la configuration depuis les variables d'environnement
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Charge la configuration depuis une source de variables quelconque
    pub fn from_vars<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("STAGE") {
            config.default_stage = v.trim().to_string();
        }
        if let Some(v) = lookup("STORAGE_ROOT") {
            config.storage_root = PathBuf::from(v);
        }
        if let Some(v) = lookup("WEB_ROOT_PREFIX") {
            config.web_root_prefix = PathBuf::from(v);
        }
        if let Some(v) = lookup("WELCOME_TEMPLATE") {
            config.welcome_template_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("DOMAINS") {
            config.domains = v;
        }
        if let Some(v) = lookup("DOMAINS_FILE") {
            if !v.trim().is_empty() {
                config.domains_file = Some(PathBuf::from(v));
            }
        }

        config
    }

    /// Charge le fichier .env puis les variables d'environnement
    pub fn load(env_file: Option<&Path>) -> Self {
        if let Some(path) = env_file {
            load_dotenv(path);
        } else {
            let candidates = [PathBuf::from("/etc/portal/.env"), PathBuf::from(".env")];
            for candidate in &candidates {
                if candidate.exists() {
                    load_dotenv(candidate);
                    break;
                }
            }
        }

        Self::from_env()
    }

    /// Vérifie les valeurs qui ne peuvent pas être signalées par domaine
    pub fn validate(&self) -> AppResult<()> {
        if !self.storage_root.is_absolute() {
            return Err(AppError::Config(format!(
                "STORAGE_ROOT must be an absolute path, got {}",
                self.storage_root.display()
            )));
        }
        if !self.web_root_prefix.is_absolute() {
            return Err(AppError::Config(format!(
                "WEB_ROOT_PREFIX must be an absolute path, got {}",
                self.web_root_prefix.display()
            )));
        }
        Ok(())
    }
}

/// Lit un fichier .env basique (KEY=VALUE par ligne)
pub fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (key.trim().to_string(), value.to_string())
        })
        .collect()
}

fn load_dotenv(path: &Path) {
    let Ok(content) = std::fs::read_to_string(path) else {
        return;
    };
    debug!(path = %path.display(), "Loading .env file");

    for (key, value) in parse_dotenv(&content) {
        if std::env::var(&key).is_err() {
            // SAFETY: called before spawning any threads (single-threaded init)
            unsafe { std::env::set_var(&key, value) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_without_variables() {
        let config = EnvConfig::from_vars(|_| None);
        assert_eq!(config.default_stage, "staging");
        assert_eq!(config.storage_root, PathBuf::from("/var/lib/portal/certs"));
        assert_eq!(config.web_root_prefix, PathBuf::from("/var/www/vhosts"));
        assert!(config.domains.is_empty());
        assert!(config.domains_file.is_none());
    }

    #[test]
    fn test_variables_override_defaults() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("STAGE", " production "),
            ("STORAGE_ROOT", "/srv/certs"),
            ("WEB_ROOT_PREFIX", "/srv/www"),
            ("DOMAINS", "a.example.com, b.example.com -> app:80"),
            ("DOMAINS_FILE", "/etc/portal/domains.json"),
        ]);
        let config = EnvConfig::from_vars(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.default_stage, "production");
        assert_eq!(config.storage_root, PathBuf::from("/srv/certs"));
        assert_eq!(config.web_root_prefix, PathBuf::from("/srv/www"));
        assert_eq!(config.domains, "a.example.com, b.example.com -> app:80");
        assert_eq!(
            config.domains_file,
            Some(PathBuf::from("/etc/portal/domains.json"))
        );
    }

    #[test]
    fn test_blank_domains_file_is_ignored() {
        let config = EnvConfig::from_vars(|k| (k == "DOMAINS_FILE").then(|| "  ".to_string()));
        assert!(config.domains_file.is_none());
    }

    #[test]
    fn test_validate_rejects_relative_roots() {
        let config = EnvConfig {
            storage_root: PathBuf::from("certs"),
            ..EnvConfig::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        let config = EnvConfig {
            web_root_prefix: PathBuf::from("www"),
            ..EnvConfig::default()
        };
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        assert!(EnvConfig::default().validate().is_ok());
    }

    #[test]
    fn test_parse_dotenv() {
        let content = "# comment\n\nSTAGE=\"local\"\nDOMAINS='a.example.com'\ninvalid line\n";
        let pairs = parse_dotenv(content);
        assert_eq!(
            pairs,
            vec![
                ("STAGE".to_string(), "local".to_string()),
                ("DOMAINS".to_string(), "a.example.com".to_string()),
            ]
        );
    }
}
