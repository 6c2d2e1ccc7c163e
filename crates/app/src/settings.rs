//! Runtime settings: an optional TOML file, then `FAMILYFLOW_*` environment
//! variables, then command-line overrides.

use serde::Deserialize;

use crate::{cli::Cli, error::Result};

const DEFAULT_CONFIG_PATH: &str = "config/familyflow";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl From<String> for Database {
    fn from(value: String) -> Self {
        if value == "memory" {
            Self::Memory
        } else {
            Self::Sqlite(value)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database: Database,
    /// Signed-in profile id.
    pub profile: String,
    pub level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: Database::Sqlite("familyflow.db".to_string()),
            profile: String::new(),
            level: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
        let mut settings: Settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(cli.config.is_some()))
            .add_source(config::Environment::with_prefix("FAMILYFLOW"))
            .build()?
            .try_deserialize()?;

        if let Some(database) = &cli.database {
            settings.database = Database::from(database.clone());
        }
        if let Some(profile) = &cli.profile {
            settings.profile = profile.clone();
        }
        if let Some(level) = &cli.level {
            settings.level = level.clone();
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_keyword_selects_in_memory_database() {
        assert_eq!(Database::from("memory".to_string()), Database::Memory);
        assert_eq!(
            Database::from("data/ledger.db".to_string()),
            Database::Sqlite("data/ledger.db".to_string())
        );
    }
}
