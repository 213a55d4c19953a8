use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use directories::{BaseDirs, ProjectDirs};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;
use crate::form::FormSettings;
use crate::roster::mapper::DEFAULT_HEADER_SYNONYMS;
use crate::roster::{CanonicalField, ColumnMapper, ImportMode, NameSchema, RowNormalizer};
use crate::selection::RefreshPolicy;
use crate::utils::parse_endpoint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub endpoint: String,
    pub name_schema: NameSchema,
    pub import_mode: ImportMode,
    pub selection_on_refresh: RefreshPolicy,
    pub delimiter: char,
    /// Recognized header -> canonical field.
    pub headers: BTreeMap<String, CanonicalField>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            name_schema: NameSchema::default(),
            import_mode: ImportMode::default(),
            selection_on_refresh: RefreshPolicy::default(),
            delimiter: ',',
            headers: (*DEFAULT_HEADER_SYNONYMS).clone(),
        }
    }
}

impl AppConfig {
    // TOML is the primary format. A JSON config in the project dir is still read and converted to TOML on first load
    pub fn toml_path() -> Option<PathBuf> {
        let base = BaseDirs::new()?;
        Some(base.config_dir().join("text-blast.toml"))
    }

    fn legacy_json_path() -> Option<PathBuf> {
        let proj = ProjectDirs::from("com", "example", "TextBlast")?;
        Some(proj.config_dir().join("config.json"))
    }

    /// Discovers the config file. Nothing on disk means defaults; a file
    /// that exists but does not parse is an error.
    pub fn load() -> Result<Self, ConfigError> {
        if let Some(path) = Self::toml_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }

        if let Some(legacy) = Self::legacy_json_path() {
            if legacy.exists() {
                let config = Self::load_from(&legacy)?;
                match config.save() {
                    Ok(path) => info!("migrated {} to {}", legacy.display(), path.display()),
                    Err(e) => warn!("could not migrate legacy config: {}", e),
                }
                return Ok(config);
            }
        }

        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Ok(serde_json::from_str(&text)?)
        } else {
            Ok(toml::from_str(&text)?)
        }
    }

    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::toml_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let toml = toml::to_string_pretty(self)?;
        fs::write(path, toml)?;
        Ok(())
    }

    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        parse_endpoint(&self.endpoint)
    }

    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(ConfigError::InvalidDelimiter(self.delimiter))
        }
    }

    pub fn mapper(&self) -> ColumnMapper {
        ColumnMapper::new(self.headers.iter().map(|(h, f)| (h.as_str(), *f)))
    }

    pub fn normalizer(&self) -> RowNormalizer {
        RowNormalizer::new(self.mapper(), self.name_schema)
    }

    pub fn form_settings(&self) -> Result<FormSettings, ConfigError> {
        Ok(FormSettings {
            import_mode: self.import_mode,
            refresh_policy: self.selection_on_refresh,
            delimiter: self.delimiter_byte()?,
        })
    }
}
