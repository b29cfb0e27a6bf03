//! # Configuration Management Module
//!
//! Questo modulo gestisce la configurazione del plugin di compressione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutte le opzioni di compressione
//! - Fornisce validazione dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `quality`: Qualità JPEG, passata anche all'encoder PNG (0-100, default: 80)
//! - `webp_quality`: Qualità WebP (0-100, default: 80)
//! - `enable_webp`: Genera anche una copia `.webp` accanto all'originale (default: false)
//! - `include`: Regex sul nome del file (default: `(?i)\.(jpg|jpeg|png)$`)
//! - `public_dir`: Directory di output della build (default: `public`)
//!
//! ## Formato file JSON:
//! ```json
//! {
//!   "quality": 80,
//!   "webpQuality": 80,
//!   "enableWebp": false,
//!   "include": "(?i)\\.(jpg|jpeg|png)$",
//!   "publicDir": "public"
//! }
//! ```
//! Le chiavi mancanti prendono il valore di default.
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = Config {
//!     quality: 75,
//!     enable_webp: true,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Default include pattern: JPEG and PNG, case-insensitive
pub const DEFAULT_INCLUDE: &str = r"(?i)\.(jpg|jpeg|png)$";

/// Filename pattern selecting the files eligible for compression.
///
/// Matched against the file name only, never the full path. Serialized as the
/// regex source string.
#[derive(Clone)]
pub struct IncludePattern(Regex);

impl IncludePattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self(Regex::new(pattern)?))
    }

    /// Check a file name against the pattern
    pub fn matches(&self, file_name: &str) -> bool {
        self.0.is_match(file_name)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for IncludePattern {
    fn default() -> Self {
        Self(Regex::new(DEFAULT_INCLUDE).expect("default include pattern is valid"))
    }
}

impl fmt::Debug for IncludePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("IncludePattern").field(&self.as_str()).finish()
    }
}

impl Serialize for IncludePattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for IncludePattern {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pattern = String::deserialize(deserializer)?;
        Self::new(&pattern).map_err(serde::de::Error::custom)
    }
}

/// Configuration for the image compression hook
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// JPEG quality (0-100), also handed to the PNG encoder as-is
    pub quality: u8,
    /// WebP quality (0-100)
    pub webp_quality: u8,
    /// Write a `.webp` sibling next to every processed image
    pub enable_webp: bool,
    /// Filename pattern selecting the files to compress
    pub include: IncludePattern,
    /// Build output directory, relative to the working directory
    pub public_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quality: 80,
            webp_quality: 80,
            enable_webp: false,
            include: IncludePattern::default(),
            public_dir: PathBuf::from("public"),
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.quality > 100 {
            return Err(anyhow::anyhow!("Quality must be between 0 and 100"));
        }

        if self.webp_quality > 100 {
            return Err(anyhow::anyhow!("WebP quality must be between 0 and 100"));
        }

        if self.public_dir.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("Public directory must not be empty"));
        }

        Ok(())
    }

    /// Resolve the output directory against a working directory
    pub fn resolve_public_dir(&self, cwd: &Path) -> PathBuf {
        cwd.join(&self.public_dir)
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.quality = 101;
        assert!(config.validate().is_err());

        config.quality = 0;
        assert!(config.validate().is_ok());

        config.webp_quality = 150;
        assert!(config.validate().is_err());

        config.webp_quality = 100;
        config.public_dir = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.quality, 80);
        assert_eq!(config.webp_quality, 80);
        assert!(!config.enable_webp);
        assert_eq!(config.include.as_str(), DEFAULT_INCLUDE);
        assert_eq!(config.public_dir, PathBuf::from("public"));
    }

    #[test]
    fn test_default_include_pattern() {
        let include = IncludePattern::default();
        assert!(include.matches("photo.jpg"));
        assert!(include.matches("photo.JPEG"));
        assert!(include.matches("icon.Png"));
        assert!(!include.matches("photo.webp"));
        assert!(!include.matches("photo.jpg.bak"));
        assert!(!include.matches("notes.txt"));
    }

    #[test]
    fn test_invalid_include_pattern() {
        assert!(IncludePattern::new("(unclosed").is_err());

        let result: Result<Config, _> = serde_json::from_str(r#"{ "include": "[" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_public_dir() {
        let config = Config::default();
        assert_eq!(
            config.resolve_public_dir(Path::new("/site")),
            PathBuf::from("/site/public")
        );
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{ "enableWebp": true, "webpQuality": 60 }"#).unwrap();
        assert!(config.enable_webp);
        assert_eq!(config.webp_quality, 60);
        assert_eq!(config.quality, 80);
        assert_eq!(config.public_dir, PathBuf::from("public"));
    }

    #[tokio::test]
    async fn test_config_missing_file_is_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::from_file(&temp_dir.path().join("nope.json")).await.unwrap();
        assert_eq!(config.quality, 80);
    }

    #[tokio::test]
    async fn test_config_rejects_out_of_range_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        tokio::fs::write(&config_path, r#"{ "quality": 200 }"#).await.unwrap();

        assert!(Config::from_file(&config_path).await.is_err());
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let original_config = Config {
            quality: 65,
            webp_quality: 70,
            enable_webp: true,
            include: IncludePattern::new(r"(?i)\.png$").unwrap(),
            public_dir: PathBuf::from("dist"),
        };

        // Save config
        original_config.save_to_file(&config_path).await.unwrap();

        // Load config
        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config.quality, 65);
        assert_eq!(loaded_config.webp_quality, 70);
        assert!(loaded_config.enable_webp);
        assert_eq!(loaded_config.include.as_str(), r"(?i)\.png$");
        assert_eq!(loaded_config.public_dir, PathBuf::from("dist"));
    }
}
