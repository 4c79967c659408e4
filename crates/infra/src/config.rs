//! Runtime configuration read from `PETCLINIC_*` environment variables.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub const PROFILE_VAR: &str = "PETCLINIC_PROFILE";
pub const DATABASE_URL_VAR: &str = "PETCLINIC_DATABASE_URL";
pub const MAX_CONNECTIONS_VAR: &str = "PETCLINIC_DB_MAX_CONNECTIONS";
pub const SEED_VAR: &str = "PETCLINIC_SEED";

const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: unknown store profile '{value}' (expected 'memory' or 'sqlite')")]
    UnknownProfile { var: &'static str, value: String },

    #[error("{var}: expected a positive integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{var}: expected 'true' or 'false', got '{value}'")]
    InvalidBool { var: &'static str, value: String },

    #[error("{var}: must not be empty")]
    Empty { var: &'static str },
}

/// Which backend holds the clinic data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreProfile {
    Memory,
    #[default]
    Sqlite,
}

impl FromStr for StoreProfile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(ConfigError::UnknownProfile {
                var: PROFILE_VAR,
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for StoreProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    /// A private in-memory SQLite database.
    pub fn in_memory() -> Self {
        Self {
            url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 1,
        }
    }

    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::in_memory()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClinicConfig {
    pub profile: StoreProfile,
    pub database: DatabaseConfig,
    /// Load the reference dataset on startup.
    pub seed: bool,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            profile: StoreProfile::default(),
            database: DatabaseConfig::default(),
            seed: true,
        }
    }
}

impl ClinicConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a config from any variable source. Unset variables take defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let profile = match lookup(PROFILE_VAR) {
            Some(value) => value.parse()?,
            None => StoreProfile::default(),
        };

        let url = match lookup(DATABASE_URL_VAR) {
            Some(value) if value.trim().is_empty() => {
                return Err(ConfigError::Empty {
                    var: DATABASE_URL_VAR,
                });
            }
            Some(value) => value.trim().to_string(),
            None => DEFAULT_DATABASE_URL.to_string(),
        };

        let mut database = DatabaseConfig {
            url,
            max_connections: 5,
        };
        if database.is_in_memory() {
            database.max_connections = 1;
        }
        if let Some(value) = lookup(MAX_CONNECTIONS_VAR) {
            database.max_connections = match value.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidNumber {
                        var: MAX_CONNECTIONS_VAR,
                        value,
                    });
                }
            };
        }

        let seed = match lookup(SEED_VAR) {
            Some(value) => parse_bool(SEED_VAR, &value)?,
            None => true,
        };

        Ok(Self {
            profile,
            database,
            seed,
        })
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<ClinicConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClinicConfig::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn defaults_to_seeded_in_memory_sqlite() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg, ClinicConfig::default());
        assert_eq!(cfg.profile, StoreProfile::Sqlite);
        assert_eq!(cfg.database.max_connections, 1);
        assert!(cfg.seed);
    }

    #[test]
    fn file_database_gets_a_larger_pool() {
        let cfg = config(&[(DATABASE_URL_VAR, "sqlite://clinic.db")]).unwrap();
        assert_eq!(cfg.database.max_connections, 5);
    }

    #[test]
    fn reads_every_variable() {
        let cfg = config(&[
            (PROFILE_VAR, "Memory"),
            (MAX_CONNECTIONS_VAR, "3"),
            (SEED_VAR, "false"),
        ])
        .unwrap();

        assert_eq!(cfg.profile, StoreProfile::Memory);
        assert_eq!(cfg.database.max_connections, 3);
        assert!(!cfg.seed);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            config(&[(PROFILE_VAR, "jdbc")]),
            Err(ConfigError::UnknownProfile { .. })
        ));
        assert!(matches!(
            config(&[(MAX_CONNECTIONS_VAR, "0")]),
            Err(ConfigError::InvalidNumber { .. })
        ));
        assert!(matches!(
            config(&[(SEED_VAR, "maybe")]),
            Err(ConfigError::InvalidBool { .. })
        ));
        assert!(matches!(
            config(&[(DATABASE_URL_VAR, " ")]),
            Err(ConfigError::Empty { .. })
        ));
    }
}
