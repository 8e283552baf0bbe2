//! Durable catalogue of already-known wallets.
//!
//! The store persists wallets in SQLite and mirrors them in an in-memory
//! cache so membership tests stay synchronous. Initialization is lazy and
//! idempotent: concurrent callers converge on a single open, and a failed
//! open can be retried by the next operation. Before initialization
//! completes the cache is simply empty and excludes nothing.

use chrono::Utc;
use std::collections::HashSet;
use std::sync::RwLock;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use crate::db::{Database, KnownWallet};
use crate::TARGET_DB;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("wallet '{0}' is already known")]
    Duplicate(String),
    #[error("known-wallet storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

/// Outcome of a bulk add: entries are applied independently, so one
/// duplicate or storage rejection never aborts the rest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkSummary {
    pub added: usize,
    pub skipped: usize,
}

#[derive(Default)]
struct Cache {
    wallets: Vec<KnownWallet>,
    index: HashSet<String>,
}

impl Cache {
    fn replace(&mut self, wallets: Vec<KnownWallet>) {
        self.index = wallets.iter().map(|w| w.wallet.clone()).collect();
        self.wallets = wallets;
    }

    fn insert(&mut self, entry: KnownWallet) {
        self.index.insert(entry.wallet.clone());
        self.wallets.push(entry);
    }

    fn remove(&mut self, wallet: &str) {
        self.index.remove(wallet);
        self.wallets.retain(|w| w.wallet != wallet);
    }
}

pub struct KnownWalletStore {
    database_url: String,
    db: OnceCell<Database>,
    cache: RwLock<Cache>,
}

impl KnownWalletStore {
    /// Create a store over the given SQLite location. Nothing is opened
    /// until [`initialize`](Self::initialize) or the first mutating call.
    pub fn new(database_url: impl Into<String>) -> Self {
        KnownWalletStore {
            database_url: database_url.into(),
            db: OnceCell::new(),
            cache: RwLock::new(Cache::default()),
        }
    }

    /// Open the backing database, create the schema if absent, and load
    /// every stored wallet into the cache. Safe to call repeatedly and
    /// concurrently; all callers share one initialization, and a failure
    /// leaves the store uninitialized so a later call can retry.
    pub async fn initialize(&self) -> Result<(), StoreError> {
        self.database().await.map(|_| ())
    }

    async fn database(&self) -> Result<&Database, StoreError> {
        self.db
            .get_or_try_init(|| async {
                let db = Database::open(&self.database_url).await?;
                let wallets = db.get_all_wallets().await?;
                info!(
                    target: TARGET_DB,
                    "Loaded {} known wallets into cache",
                    wallets.len()
                );
                self.cache.write().unwrap().replace(wallets);
                Ok::<_, StoreError>(db)
            })
            .await
    }

    /// Synchronous membership test against the in-memory cache only. Never
    /// touches durable storage; before initialization completes it reports
    /// false for everything.
    pub fn is_known(&self, wallet: &str) -> bool {
        self.cache.read().unwrap().index.contains(wallet)
    }

    /// Number of wallets currently cached.
    pub fn count(&self) -> usize {
        self.cache.read().unwrap().wallets.len()
    }

    /// Persist a new wallet. Adding one that already exists is a distinct,
    /// non-fatal failure.
    pub async fn add(
        &self,
        wallet: &str,
        description: &str,
    ) -> Result<KnownWallet, StoreError> {
        let db = self.database().await?;

        if self.is_known(wallet) {
            return Err(StoreError::Duplicate(wallet.to_string()));
        }

        let entry = KnownWallet {
            wallet: wallet.to_string(),
            description: description.to_string(),
            added_at: Utc::now().to_rfc3339(),
        };

        if !db.insert_wallet(&entry).await? {
            return Err(StoreError::Duplicate(wallet.to_string()));
        }

        self.cache.write().unwrap().insert(entry.clone());
        Ok(entry)
    }

    /// Add a batch of (wallet, description) entries. Each entry is applied
    /// independently; the cache is reloaded from storage once the whole
    /// batch has been attempted, so it stays consistent even after partial
    /// failures.
    pub async fn add_bulk(&self, entries: &[(String, String)]) -> Result<BulkSummary, StoreError> {
        let db = self.database().await?;

        let mut summary = BulkSummary::default();
        for (wallet, description) in entries {
            let entry = KnownWallet {
                wallet: wallet.clone(),
                description: description.clone(),
                added_at: Utc::now().to_rfc3339(),
            };
            match db.insert_wallet(&entry).await {
                Ok(true) => summary.added += 1,
                Ok(false) => summary.skipped += 1,
                Err(err) => {
                    warn!(
                        target: TARGET_DB,
                        "Skipping wallet {} in bulk add: {}", wallet, err
                    );
                    summary.skipped += 1;
                }
            }
        }

        let wallets = db.get_all_wallets().await?;
        self.cache.write().unwrap().replace(wallets);

        info!(
            target: TARGET_DB,
            "Bulk add finished: {} added, {} skipped", summary.added, summary.skipped
        );
        Ok(summary)
    }

    /// Remove a wallet. The cache is only updated after the durable delete
    /// succeeds. Returns false when the wallet was not stored.
    pub async fn remove(&self, wallet: &str) -> Result<bool, StoreError> {
        let db = self.database().await?;
        let removed = db.delete_wallet(wallet).await?;
        if removed {
            self.cache.write().unwrap().remove(wallet);
        }
        Ok(removed)
    }

    /// Remove every stored wallet, returning how many were deleted.
    pub async fn clear(&self) -> Result<u64, StoreError> {
        let db = self.database().await?;
        let cleared = db.clear_wallets().await?;
        self.cache.write().unwrap().replace(Vec::new());
        info!(target: TARGET_DB, "Cleared {} known wallets", cleared);
        Ok(cleared)
    }

    /// All known wallets in a stable order (by wallet key). Reads only the
    /// cache and never mutates state.
    pub fn export(&self) -> Vec<KnownWallet> {
        let mut wallets = self.cache.read().unwrap().wallets.clone();
        wallets.sort_by(|a, b| a.wallet.cmp(&b.wallet));
        wallets
    }

    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.export())
    }

    pub fn export_csv(&self) -> Result<String, csv::Error> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for wallet in self.export() {
            writer.serialize(wallet)?;
        }
        let bytes = writer.into_inner().expect("flushing an in-memory writer");
        Ok(String::from_utf8(bytes).expect("csv output is utf-8"))
    }
}
