use super::core::Database;

impl Database {
    pub(crate) async fn initialize_schema(&self) -> Result<(), sqlx::Error> {
        let mut conn = self.pool().acquire().await?;
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS known_wallets (
                wallet TEXT PRIMARY KEY,
                description TEXT NOT NULL DEFAULT '',
                added_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_known_wallets_added_at ON known_wallets (added_at);
            "#,
        )
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
