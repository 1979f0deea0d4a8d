use serde::Deserialize;
use std::path::PathBuf;

/// Where the calendar, categories and shiurim tables are read from
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TableSource {
    Csv,
    Postgres,
}

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Backing store for the reference tables
    #[serde(default = "default_table_source")]
    pub table_source: TableSource,

    /// Directory holding calendar.csv, categories.csv and shiurim.csv
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// PostgreSQL connection URL, required when `table_source` is postgres
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default = "default_calendar_table")]
    pub calendar_table: String,

    #[serde(default = "default_categories_table")]
    pub categories_table: String,

    #[serde(default = "default_shiurim_table")]
    pub shiurim_table: String,

    /// Redis connection URL. Recommendation results are not cached when unset.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Lifetime of cached recommendation results in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Days after the start date scanned for holiday markers
    #[serde(default = "default_holiday_window_days")]
    pub holiday_window_days: u32,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_table_source() -> TableSource {
    TableSource::Csv
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_calendar_table() -> String {
    "calendar".to_string()
}

fn default_categories_table() -> String {
    "categories".to_string()
}

fn default_shiurim_table() -> String {
    "shiurim".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_holiday_window_days() -> u32 {
    3
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of key/value pairs
    pub fn from_vars<I>(vars: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = envy::from_iter::<_, Config>(vars)
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        if config.table_source == TableSource::Postgres && config.database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set when TABLE_SOURCE=postgres");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(vars(&[])).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);
        assert_eq!(config.table_source, TableSource::Csv);
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.calendar_table, "calendar");
        assert_eq!(config.redis_url, None);
        assert_eq!(config.holiday_window_days, 3);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_vars(vars(&[
            ("PORT", "8080"),
            ("TABLE_SOURCE", "postgres"),
            ("DATABASE_URL", "postgres://localhost/shiurim"),
            ("HOLIDAY_WINDOW_DAYS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.table_source, TableSource::Postgres);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/shiurim")
        );
        assert_eq!(config.holiday_window_days, 5);
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let result = Config::from_vars(vars(&[("TABLE_SOURCE", "postgres")]));
        assert!(result.is_err());
    }
}
