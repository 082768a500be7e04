// src/config/server.rs

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            host: super::env_or("HOST", "0.0.0.0"),
            port: super::env_or("PORT", "8080").parse().unwrap_or(8080),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn from_env() -> Self {
        Self {
            database_url: super::env_or("DATABASE_URL", "sqlite://sessions.db"),
            max_connections: super::env_u64("SQLITE_MAX_CONNECTIONS", 5) as u32,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub filter: String,
    pub json: bool,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self {
            filter: super::env_or("RUST_LOG", "assistant_core=info,tower_http=info"),
            json: super::env_or("LOG_JSON", "false") == "true",
        }
    }

    pub fn init(&self) {
        use tracing_subscriber::{fmt, EnvFilter};
        let filter = EnvFilter::try_new(&self.filter).unwrap_or_else(|_| EnvFilter::new("info"));
        let subscriber = fmt().with_env_filter(filter);
        if self.json {
            let _ = subscriber.json().try_init();
        } else {
            let _ = subscriber.try_init();
        }
    }
}
