//! Process configuration from environment variables (a `.env` file is loaded first by the binary).

use crate::error::ConfigError;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_SCHEMA: &str = "hamburgueria";
pub const DEFAULT_PUBLIC_DIR: &str = "public";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub port: u16,
    /// `None` runs on the in-memory store.
    pub database_url: Option<String>,
    pub max_connections: u32,
    /// Schema holding the collection tables. Must be a plain lowercase identifier.
    pub schema: String,
    pub public_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::InvalidVar { var: "PORT", value: v })?,
            None => DEFAULT_PORT,
        };
        let max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(v) => match v.parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::InvalidVar {
                        var: "DATABASE_MAX_CONNECTIONS",
                        value: v,
                    })
                }
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };
        let schema = get("HAMBURGUERIA_SCHEMA").unwrap_or_else(|| DEFAULT_SCHEMA.into());
        if !is_plain_identifier(&schema) {
            return Err(ConfigError::InvalidSchema(schema));
        }

        Ok(AppConfig {
            port,
            database_url: get("DATABASE_URL"),
            max_connections,
            schema,
            public_dir: get("PUBLIC_DIR").unwrap_or_else(|| DEFAULT_PUBLIC_DIR.into()).into(),
        })
    }
}

fn is_plain_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_lowercase())
        && chars.all(|c| c == '_' || c.is_ascii_lowercase() || c.is_ascii_digit())
        && s.len() <= 63
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = AppConfig::from_lookup(lookup(&[])).ok();
        assert_eq!(
            cfg,
            Some(AppConfig {
                port: 4000,
                database_url: None,
                max_connections: 5,
                schema: "hamburgueria".into(),
                public_dir: "public".into(),
            })
        );
    }

    #[test]
    fn reads_port_and_database() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/food"),
            ("PUBLIC_DIR", ""),
        ]))
        .ok();
        let cfg = cfg.as_ref();
        assert_eq!(cfg.map(|c| c.port), Some(8080));
        assert_eq!(cfg.and_then(|c| c.database_url.as_deref()), Some("postgres://localhost/food"));
        assert_eq!(cfg.map(|c| c.public_dir.clone()), Some(PathBuf::from("public")));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("PORT", "http")])),
            Err(ConfigError::InvalidVar { var: "PORT", .. })
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("DATABASE_MAX_CONNECTIONS", "0")])),
            Err(ConfigError::InvalidVar { .. })
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[("HAMBURGUERIA_SCHEMA", "drop table;")])),
            Err(ConfigError::InvalidSchema(_))
        ));
    }
}
