use crate::entities::{prelude::*, users};
use crate::infrastructure::staging::StagedUpload;
use crate::models::{NewUser, UserRecord};
use crate::services::csv_parser;
use futures::future::join_all;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, Set, TransactionTrait};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Address encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] DbErr),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Loads CSV uploads into the `users` table, one transaction per file.
#[derive(Clone)]
pub struct ImportService {
    db: DatabaseConnection,
}

impl ImportService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Parses the staged file and inserts every row. Returns the number of
    /// rows committed.
    pub async fn import_file(&self, upload: &StagedUpload) -> Result<u64, ImportError> {
        let path = upload.path().to_path_buf();
        let records =
            tokio::task::spawn_blocking(move || csv_parser::read_file(&path)).await??;

        tracing::info!(
            "📄 Parsed {} rows from {} byte upload",
            records.len(),
            upload.size()
        );

        self.insert_batch(records).await
    }

    /// Inserts all records inside a single transaction.
    ///
    /// Every insert is issued before any result is inspected. The batch is
    /// committed only if all of them succeeded, otherwise it is rolled back.
    pub async fn insert_batch(&self, records: Vec<UserRecord>) -> Result<u64, ImportError> {
        let rows = records
            .into_iter()
            .map(|record| to_active_model(NewUser::from(record)))
            .collect::<Result<Vec<_>, _>>()?;
        let total = rows.len();

        // Dropping `txn` without commit rolls back and returns the connection.
        let txn = self.db.begin().await?;

        let results = join_all(
            rows.into_iter()
                .map(|row| Users::insert(row).exec_without_returning(&txn)),
        )
        .await;

        let mut inserted = 0;
        let mut first_error = None;
        for result in results {
            match result {
                Ok(n) => inserted += n,
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(_) => {}
            }
        }

        if let Some(e) = first_error {
            tracing::warn!(
                "↩️ Insert failed after {}/{} rows, rolling back: {}",
                inserted,
                total,
                e
            );
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!("❌ Rollback failed: {}", rollback_err);
            }
            return Err(e.into());
        }

        txn.commit().await?;
        tracing::info!("✅ Committed {} rows", inserted);
        Ok(inserted)
    }
}

fn to_active_model(user: NewUser) -> Result<users::ActiveModel, serde_json::Error> {
    Ok(users::ActiveModel {
        first_name: Set(user.first_name),
        last_name: Set(user.last_name),
        age: Set(user.age),
        address: Set(Some(serde_json::to_value(&user.address)?)),
        ..Default::default()
    })
}
