//! Shortlist of wallets the user marked while paging through results.
//!
//! Distinct from the known-wallet catalogue: known wallets are excluded
//! from analysis, saved wallets are its output. The list lives in memory
//! and is written through the settings store after every mutation.

use crate::config::{ConfigStore, SAVED_WALLETS_KEY};

#[derive(Debug, Default)]
pub struct SavedWallets {
    wallets: Vec<String>,
}

impl SavedWallets {
    /// Load the persisted shortlist; an unreadable store yields an empty
    /// list.
    pub fn load(config: &ConfigStore) -> Self {
        SavedWallets {
            wallets: config.get(SAVED_WALLETS_KEY, Vec::new()),
        }
    }

    pub fn contains(&self, wallet: &str) -> bool {
        self.wallets.iter().any(|w| w == wallet)
    }

    pub fn count(&self) -> usize {
        self.wallets.len()
    }

    pub fn wallets(&self) -> &[String] {
        &self.wallets
    }

    /// Add a wallet. Returns false when it was already saved.
    pub fn add(&mut self, config: &ConfigStore, wallet: &str) -> bool {
        if self.contains(wallet) {
            return false;
        }
        self.wallets.push(wallet.to_string());
        config.set(SAVED_WALLETS_KEY, &self.wallets);
        true
    }

    /// Remove a wallet. Returns false when it was not saved.
    pub fn remove(&mut self, config: &ConfigStore, wallet: &str) -> bool {
        let before = self.wallets.len();
        self.wallets.retain(|w| w != wallet);
        if self.wallets.len() == before {
            return false;
        }
        config.set(SAVED_WALLETS_KEY, &self.wallets);
        true
    }

    pub fn clear(&mut self, config: &ConfigStore) {
        self.wallets.clear();
        config.set(SAVED_WALLETS_KEY, &self.wallets);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config() -> ConfigStore {
        ConfigStore::new(tempfile::tempdir().unwrap().into_path().join("settings.json"))
    }

    #[test]
    fn test_add_remove_round_trip() {
        let config = temp_config();
        let mut saved = SavedWallets::load(&config);

        assert!(saved.add(&config, "w1"));
        assert!(!saved.add(&config, "w1"));
        assert!(saved.contains("w1"));
        assert_eq!(saved.count(), 1);

        // Persisted: a fresh load sees the same list.
        let reloaded = SavedWallets::load(&config);
        assert!(reloaded.contains("w1"));

        assert!(saved.remove(&config, "w1"));
        assert!(!saved.remove(&config, "w1"));
        assert_eq!(SavedWallets::load(&config).count(), 0);
    }

    #[test]
    fn test_clear_persists() {
        let config = temp_config();
        let mut saved = SavedWallets::load(&config);
        saved.add(&config, "w1");
        saved.add(&config, "w2");

        saved.clear(&config);
        assert_eq!(saved.count(), 0);
        assert_eq!(SavedWallets::load(&config).count(), 0);
    }
}
