use serde::{Deserialize, Serialize};
use std::env;
use std::fs;

/// YAML-serializable configuration structure, loaded when `CONFIG_FILE`
/// is set instead of reading individual env vars.
#[derive(Serialize, Deserialize, Debug)]
pub struct ConfigYaml {
    pub node_name: String,
    pub environment: String,
    pub port: u16,
    pub chunk_size: usize,
    pub rayon_threads: Option<usize>,
    pub observations_csv_path: String,
    pub business_hours_csv_path: String,
    pub timezones_csv_path: String,
    pub current_timestamp_override: Option<String>,
}

/// Application-wide settings for the report service.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub node_name: String,
    pub environment: String,
    pub port: u16,
    /// Store-id slice size handed to a single `rayon` task in
    /// `build_report_chunked`.
    pub chunk_size: usize,
    /// `None` lets the global pool default to `num_cpus::get() - 2`.
    pub rayon_threads: Option<usize>,
    pub observations_csv_path: String,
    pub business_hours_csv_path: String,
    pub timezones_csv_path: String,
    /// `CURRENT_TIMESTAMP_OVERRIDE`, passed through to
    /// `storepulse_core::clock::resolve` unparsed.
    pub current_timestamp_override: Option<String>,
}

impl AppConfig {
    /// Load configuration from a `CONFIG_FILE` YAML path if set, else
    /// from individual environment variables.
    pub fn load() -> Self {
        if let Ok(config_file) = env::var("CONFIG_FILE") {
            Self::from_yaml(&config_file)
        } else {
            Self::from_env()
        }
    }

    pub fn from_yaml(file_path: &str) -> Self {
        let yaml_content =
            fs::read_to_string(file_path).unwrap_or_else(|e| panic!("Failed to read config file {file_path}: {e}"));

        let yaml_config: ConfigYaml =
            serde_yaml::from_str(&yaml_content).unwrap_or_else(|e| panic!("Failed to parse YAML config: {e}"));

        Self {
            node_name: yaml_config.node_name,
            environment: yaml_config.environment,
            port: yaml_config.port,
            chunk_size: yaml_config.chunk_size,
            rayon_threads: yaml_config.rayon_threads,
            observations_csv_path: yaml_config.observations_csv_path,
            business_hours_csv_path: yaml_config.business_hours_csv_path,
            timezones_csv_path: yaml_config.timezones_csv_path,
            current_timestamp_override: yaml_config.current_timestamp_override,
        }
    }

    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let node_name = env::var("NODE_NAME").unwrap_or_else(|_| "storepulse".to_string());
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let port = env::var("PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(8888);

        let chunk_size = env::var("REPORT_CHUNK_SIZE").ok().and_then(|s| s.parse().ok()).unwrap_or(50);

        let rayon_threads = env::var("RAYON_THREADS").ok().and_then(|s| s.parse().ok());

        let observations_csv_path =
            env::var("OBSERVATIONS_CSV_PATH").unwrap_or_else(|_| "data/observations.csv".to_string());
        let business_hours_csv_path =
            env::var("BUSINESS_HOURS_CSV_PATH").unwrap_or_else(|_| "data/business_hours.csv".to_string());
        let timezones_csv_path = env::var("TIMEZONES_CSV_PATH").unwrap_or_else(|_| "data/timezones.csv".to_string());

        let current_timestamp_override = env::var("CURRENT_TIMESTAMP_OVERRIDE").ok();

        Self {
            node_name,
            environment,
            port,
            chunk_size,
            rayon_threads,
            observations_csv_path,
            business_hours_csv_path,
            timezones_csv_path,
            current_timestamp_override,
        }
    }
}
