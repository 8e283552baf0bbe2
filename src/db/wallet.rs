use serde::{Deserialize, Serialize};
use tracing::debug;

use super::core::Database;
use crate::TARGET_DB;

/// A catalogued wallet, keyed by its address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct KnownWallet {
    pub wallet: String,
    pub description: String,
    pub added_at: String,
}

impl Database {
    /// Insert a wallet row. Returns false when the wallet already exists;
    /// the existing row is left untouched.
    pub(crate) async fn insert_wallet(&self, entry: &KnownWallet) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO known_wallets (wallet, description, added_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(wallet) DO NOTHING
            "#,
        )
        .bind(&entry.wallet)
        .bind(&entry.description)
        .bind(&entry.added_at)
        .execute(self.pool())
        .await?;

        let inserted = result.rows_affected() > 0;
        debug!(
            target: TARGET_DB,
            "Insert wallet {}: {}",
            entry.wallet,
            if inserted { "added" } else { "already present" }
        );
        Ok(inserted)
    }

    pub(crate) async fn get_all_wallets(&self) -> Result<Vec<KnownWallet>, sqlx::Error> {
        sqlx::query_as::<_, KnownWallet>(
            "SELECT wallet, description, added_at FROM known_wallets ORDER BY wallet",
        )
        .fetch_all(self.pool())
        .await
    }

    /// Delete a wallet row. Returns false when no such wallet was stored.
    pub(crate) async fn delete_wallet(&self, wallet: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM known_wallets WHERE wallet = ?1")
            .bind(wallet)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove every wallet row, returning how many were deleted.
    pub(crate) async fn clear_wallets(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM known_wallets")
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }
}
