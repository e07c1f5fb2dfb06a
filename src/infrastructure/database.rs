use crate::config::AppConfig;
use crate::entities::users;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};
use std::time::Duration;
use tracing::info;

pub async fn setup_database(config: &AppConfig) -> anyhow::Result<DatabaseConnection> {
    if config.database_url.is_empty() {
        anyhow::bail!("DATABASE_URL must be set");
    }

    info!("📂 Database: {}", redact(&config.database_url));

    let mut opt = ConnectOptions::new(&config.database_url);
    opt.max_connections(config.db_max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(30))
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .sqlx_logging(true)
        .sqlx_logging_level(log::LevelFilter::Debug);

    let db = Database::connect(opt).await?;

    info!("✅ Database connected successfully");

    if config.auto_migrate {
        run_migrations(&db).await?;
    }

    Ok(db)
}

/// Creates the `users` table from the entity definition if it does not exist.
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    info!("🔄 Ensuring users table exists...");
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let stmt = schema
        .create_table_from_entity(users::Entity)
        .if_not_exists()
        .to_owned();

    db.execute(builder.build(&stmt)).await?;
    Ok(())
}

/// Hides the password part of a connection string before logging it.
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            let userinfo = &url[scheme_end + 3..at];
            match userinfo.find(':') {
                Some(colon) => format!(
                    "{}{}:***{}",
                    &url[..scheme_end + 3],
                    &userinfo[..colon],
                    &url[at..]
                ),
                None => url.to_string(),
            }
        }
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact_hides_password() {
        assert_eq!(
            redact("postgres://app:hunter2@db:5432/users"),
            "postgres://app:***@db:5432/users"
        );
    }

    #[test]
    fn test_redact_leaves_plain_urls() {
        assert_eq!(redact("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            redact("postgres://app@db/users"),
            "postgres://app@db/users"
        );
    }

    #[tokio::test]
    async fn test_missing_url_is_rejected() {
        let config = AppConfig {
            database_url: String::new(),
            ..AppConfig::default()
        };
        assert!(setup_database(&config).await.is_err());
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        run_migrations(&db).await.unwrap();
        run_migrations(&db).await.unwrap();
    }
}
