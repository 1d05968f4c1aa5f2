//! Durable storage configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where account records and activity timestamps are persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory for durable data.
    #[serde(default = "default_data_root")]
    pub data_root: String,
    /// JSON file holding the account directory. Relative paths are resolved
    /// against `data_root`.
    #[serde(default = "default_accounts_file")]
    pub accounts_file: String,
    /// Maximum number of account records kept in the directory read cache.
    #[serde(default = "default_account_cache_capacity")]
    pub account_cache_capacity: u64,
    /// Time-to-live of cached account records, in seconds.
    #[serde(default = "default_account_cache_ttl")]
    pub account_cache_ttl_seconds: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            accounts_file: default_accounts_file(),
            account_cache_capacity: default_account_cache_capacity(),
            account_cache_ttl_seconds: default_account_cache_ttl(),
        }
    }
}

impl StorageConfig {
    /// Root directory as a path.
    pub fn data_root(&self) -> PathBuf {
        PathBuf::from(&self.data_root)
    }

    /// Directory holding the per-account activity records.
    pub fn activity_root(&self) -> PathBuf {
        self.data_root().join("activity")
    }

    /// Resolved path of the accounts file.
    pub fn accounts_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.accounts_file);
        if path.is_absolute() {
            path
        } else {
            self.data_root().join(path)
        }
    }

    /// File holding process-wide state such as the plugin epoch.
    pub fn state_path(&self) -> PathBuf {
        self.data_root().join("state.toml")
    }
}

fn default_data_root() -> String {
    "./data".to_string()
}

fn default_accounts_file() -> String {
    "accounts.json".to_string()
}

fn default_account_cache_capacity() -> u64 {
    10_000
}

fn default_account_cache_ttl() -> u64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_accounts_file_resolves_under_root() {
        let config = StorageConfig {
            data_root: "/srv/dormant".to_string(),
            ..StorageConfig::default()
        };
        assert_eq!(
            config.accounts_path(),
            PathBuf::from("/srv/dormant/accounts.json")
        );
        assert_eq!(config.state_path(), PathBuf::from("/srv/dormant/state.toml"));
        assert_eq!(config.activity_root(), PathBuf::from("/srv/dormant/activity"));
    }

    #[test]
    fn test_absolute_accounts_file_is_kept() {
        let config = StorageConfig {
            accounts_file: "/etc/accounts.json".to_string(),
            ..StorageConfig::default()
        };
        assert_eq!(config.accounts_path(), PathBuf::from("/etc/accounts.json"));
    }
}
