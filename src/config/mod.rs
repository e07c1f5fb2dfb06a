use std::env;
use std::path::PathBuf;

/// Runtime configuration for the import service
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Database connection string (required at startup)
    pub database_url: String,

    /// HTTP listen port (default: 3000)
    pub port: u16,

    /// Directory where uploaded files are staged (default: <tmp>/csv-uploads)
    pub upload_dir: PathBuf,

    /// Maximum request body size in bytes (default: 64 MB)
    pub max_upload_size: usize,

    /// Connection pool size (default: 10)
    pub db_max_connections: u32,

    /// Seconds to wait for a pooled connection (default: 30)
    pub db_acquire_timeout_secs: u64,

    /// Create the target table on startup if missing (default: false)
    pub auto_migrate: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            port: 3000,
            upload_dir: env::temp_dir().join("csv-uploads"),
            max_upload_size: 64 * 1024 * 1024, // 64 MB
            db_max_connections: 10,
            db_acquire_timeout_secs: 30,
            auto_migrate: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            database_url: env::var("DATABASE_URL").unwrap_or(default.database_url),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),

            upload_dir: env::var("CSV_FILE_PATH")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(default.upload_dir),

            max_upload_size: env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_upload_size),

            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.db_max_connections),

            db_acquire_timeout_secs: env::var("DB_ACQUIRE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.db_acquire_timeout_secs),

            auto_migrate: env::var("AUTO_MIGRATE")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(default.auto_migrate),
        }
    }

    /// Config for tests: SQLite in memory, schema bootstrap on
    pub fn development(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            upload_dir: upload_dir.into(),
            auto_migrate: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_upload_size, 64 * 1024 * 1024);
        assert!(config.upload_dir.ends_with("csv-uploads"));
        assert!(!config.auto_migrate);
    }

    #[test]
    fn test_development_config() {
        let config = AppConfig::development("/tmp/staging");
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.upload_dir, PathBuf::from("/tmp/staging"));
        assert!(config.auto_migrate);
    }

    #[test]
    fn test_from_env_overrides() {
        unsafe {
            env::set_var("PORT", "8081");
            env::set_var("CSV_FILE_PATH", "/var/tmp/uploads");
            env::set_var("AUTO_MIGRATE", "1");
        }
        let config = AppConfig::from_env();
        unsafe {
            env::remove_var("PORT");
            env::remove_var("CSV_FILE_PATH");
            env::remove_var("AUTO_MIGRATE");
        }
        assert_eq!(config.port, 8081);
        assert_eq!(config.upload_dir, PathBuf::from("/var/tmp/uploads"));
        assert!(config.auto_migrate);
    }

    #[test]
    fn test_from_env_ignores_unparseable_numbers() {
        unsafe { env::set_var("MAX_UPLOAD_SIZE", "lots") };
        let config = AppConfig::from_env();
        unsafe { env::remove_var("MAX_UPLOAD_SIZE") };
        assert_eq!(config.max_upload_size, AppConfig::default().max_upload_size);
    }
}
