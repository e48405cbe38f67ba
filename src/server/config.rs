use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Fully resolved settings; built by [`ServerConfig::load`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub database_url: String,
    pub data_dir: String,
    pub log_dir: String,
    /// bcrypt work factor used for new password hashes.
    pub password_hash_cost: u32,
    pub db_max_connections: u32,
    pub db_connect_retries: u32,
    pub db_connect_retry_interval_secs: u64,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    listen_addr: Option<String>,
    database_url: Option<String>,
    data_dir: Option<String>,
    log_dir: Option<String>,
    password_hash_cost: Option<u32>,
    db_max_connections: Option<u32>,
    db_connect_retries: Option<u32>,
    db_connect_retry_interval_secs: Option<u64>,
}

/// bcrypt accepts work factors in this range.
pub const MIN_HASH_COST: u32 = 4;
pub const MAX_HASH_COST: u32 = 31;

fn default_listen_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_database_url(data_dir: &str) -> String {
    format!("sqlite://{data_dir}/recipe.db?mode=rwc")
}

fn default_password_hash_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_connect_retries() -> u32 {
    30
}

fn default_db_connect_retry_interval_secs() -> u64 {
    1
}

impl ServerConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config: PartialServerConfig = if let Some(path_str) = config_path {
            let path = Path::new(path_str);
            if path.exists() {
                let contents = fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
                toml::from_str(&contents)
                    .map_err(|e| format!("Failed to parse TOML from config file at {path:?}: {e}"))?
            } else {
                PartialServerConfig::default()
            }
        } else {
            PartialServerConfig::default()
        };

        // 2. Load from environment variables
        let env_config: PartialServerConfig = envy::from_env::<PartialServerConfig>()
            .map_err(|e| format!("Failed to load config from environment: {e}"))?;

        // 3. Merge: environment overrides file
        Self::merge(env_config, file_config)
    }

    fn merge(env: PartialServerConfig, file: PartialServerConfig) -> Result<Self, String> {
        let data_dir = env.data_dir.or(file.data_dir).unwrap_or_else(default_data_dir);
        let database_url = env
            .database_url
            .or(file.database_url)
            .unwrap_or_else(|| default_database_url(&data_dir));

        let password_hash_cost = env
            .password_hash_cost
            .or(file.password_hash_cost)
            .unwrap_or_else(default_password_hash_cost);
        if !(MIN_HASH_COST..=MAX_HASH_COST).contains(&password_hash_cost) {
            return Err(format!(
                "PASSWORD_HASH_COST must be between {MIN_HASH_COST} and {MAX_HASH_COST}, got {password_hash_cost}"
            ));
        }

        Ok(ServerConfig {
            listen_addr: env.listen_addr.or(file.listen_addr)
                .unwrap_or_else(default_listen_addr),
            database_url,
            data_dir,
            log_dir: env.log_dir.or(file.log_dir)
                .unwrap_or_else(default_log_dir),
            password_hash_cost,
            db_max_connections: env.db_max_connections.or(file.db_max_connections)
                .unwrap_or_else(default_db_max_connections),
            db_connect_retries: env.db_connect_retries.or(file.db_connect_retries)
                .unwrap_or_else(default_db_connect_retries),
            db_connect_retry_interval_secs: env
                .db_connect_retry_interval_secs
                .or(file.db_connect_retry_interval_secs)
                .unwrap_or_else(default_db_connect_retry_interval_secs),
        })
    }

    /// Config for tests: in-memory database and the cheapest bcrypt cost.
    pub fn for_tests() -> Self {
        ServerConfig {
            listen_addr: "127.0.0.1:0".to_string(),
            database_url: "sqlite::memory:".to_string(),
            data_dir: default_data_dir(),
            log_dir: default_log_dir(),
            password_hash_cost: MIN_HASH_COST,
            db_max_connections: 1,
            db_connect_retries: 0,
            db_connect_retry_interval_secs: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config =
            ServerConfig::merge(PartialServerConfig::default(), PartialServerConfig::default())
                .unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:8000");
        assert_eq!(config.database_url, "sqlite://data/recipe.db?mode=rwc");
        assert_eq!(config.password_hash_cost, bcrypt::DEFAULT_COST);
        assert_eq!(config.db_connect_retries, 30);
    }

    #[test]
    fn test_env_overrides_file() {
        let file: PartialServerConfig = toml::from_str(
            r#"
            listen_addr = "127.0.0.1:9000"
            data_dir = "/srv/recipes"
            password_hash_cost = 10
            "#,
        )
        .unwrap();
        let env = PartialServerConfig {
            listen_addr: Some("0.0.0.0:7000".to_string()),
            ..Default::default()
        };

        let config = ServerConfig::merge(env, file).unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:7000");
        assert_eq!(config.database_url, "sqlite:///srv/recipes/recipe.db?mode=rwc");
        assert_eq!(config.password_hash_cost, 10);
    }

    #[test]
    fn test_partial_file_falls_back_to_defaults() {
        let file: PartialServerConfig = toml::from_str(r#"database_url = "postgres://db/recipes""#).unwrap();

        let config = ServerConfig::merge(PartialServerConfig::default(), file).unwrap();

        assert_eq!(config.database_url, "postgres://db/recipes");
        assert_eq!(config.data_dir, "data");
        assert_eq!(config.log_dir, "logs");
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.db_connect_retry_interval_secs, 1);
    }

    #[test]
    fn test_rejects_out_of_range_hash_cost() {
        let env = PartialServerConfig {
            password_hash_cost: Some(2),
            ..Default::default()
        };

        let result = ServerConfig::merge(env, PartialServerConfig::default());
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("PASSWORD_HASH_COST"));
    }
}
