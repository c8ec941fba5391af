use secrecy::Secret;
use serde::Deserialize;

/// Where entities are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    /// Process-local tables, lost on restart.
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub database_url: Option<Secret<String>>,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for local development)
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        let store_backend = match config.get::<StoreBackend>("store_backend") {
            Ok(backend) => backend,
            Err(config::ConfigError::NotFound(_)) => StoreBackend::Postgres,
            Err(e) => return Err(e),
        };

        let database_url = config
            .get::<String>("database_url")
            .ok()
            .map(Secret::new);

        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(config::ConfigError::Message(
                "DATABASE_URL is required when STORE_BACKEND=postgres".to_string(),
            ));
        }

        Ok(Self {
            store_backend,
            database_url,
            database_max_connections: config.get("database_max_connections").unwrap_or(20),
            host: config.get("host").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: config.get("port").unwrap_or(8000),
        })
    }
}
