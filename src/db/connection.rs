use mongodb::{options::ClientOptions, Client, Database};
use std::env;
use dotenvy::dotenv;
use tracing::info;

use crate::utils::error::{AppError, AppResult};

const DEFAULT_APP_NAME: &str = "PollingApp";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub mongo_uri: String,
    pub db_name: String,
    pub app_name: String,
}

impl DbConfig {
    /// Reads `MONGO_URI`, `DB_NAME` and the optional `MONGO_APP_NAME`, loading `.env` first.
    pub fn from_env() -> AppResult<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mongo_uri = lookup("MONGO_URI")
            .ok_or_else(|| AppError::ConfigError("MONGO_URI must be set in .env".to_string()))?;
        let db_name = lookup("DB_NAME")
            .ok_or_else(|| AppError::ConfigError("DB_NAME must be set in .env".to_string()))?;

        if db_name.trim().is_empty() {
            return Err(AppError::ConfigError("DB_NAME must not be empty".to_string()));
        }

        let app_name = lookup("MONGO_APP_NAME").unwrap_or_else(|| DEFAULT_APP_NAME.to_string());

        Ok(Self { mongo_uri, db_name, app_name })
    }
}

pub async fn init_db(config: &DbConfig) -> AppResult<Database> {
    let mut client_options = ClientOptions::parse(&config.mongo_uri)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to parse MongoDB URI: {}", e)))?;

    client_options.app_name = Some(config.app_name.clone());

    let client = Client::with_options(client_options).map_err(|e| {
        AppError::DatabaseError(format!("Failed to initialize MongoDB client: {}", e))
    })?;

    info!(db = %config.db_name, "database connection configured");

    Ok(client.database(&config.db_name))
}
