// 🗂️ Configuration - persisted settings store + runtime environment
//
// The settings store lives in a JSON document. A missing file means the
// built-in defaults; saving goes through a temp file and a rename.

use crate::error::Result;
use crate::settings::ConfigStore;
use rust_decimal::Decimal;
use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const CONFIG_PATH_ENV: &str = "OWNER_STATEMENTS_CONFIG";
pub const RESERVATIONS_PATH_ENV: &str = "OWNER_STATEMENTS_RESERVATIONS";
pub const BANK_BALANCE_ENV: &str = "OWNER_STATEMENTS_BANK_BALANCE";
pub const BIND_ADDR_ENV: &str = "OWNER_STATEMENTS_BIND";

const DEFAULT_CONFIG_FILE: &str = "owner_statements.json";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const TMP_SUFFIX: &str = "tmp";

// ============================================================================
// CONFIG MANAGER (persistence of the settings store)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        ConfigManager {
            config_path: config_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load the store, or the built-in defaults when no file exists yet
    pub fn load(&self) -> Result<ConfigStore> {
        if !self.config_path.exists() {
            tracing::debug!(path = %self.config_path.display(), "no config file, using defaults");
            return Ok(ConfigStore::default());
        }

        let data = fs::read_to_string(&self.config_path)?;
        let store: ConfigStore = serde_json::from_str(&data)?;
        tracing::debug!(
            path = %self.config_path.display(),
            overrides = store.client_overrides.len(),
            "config loaded"
        );
        Ok(store)
    }

    pub fn save(&self, store: &ConfigStore) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(store)?;
        let tmp = tmp_path(&self.config_path);
        let mut file = File::create(&tmp)?;
        file.write_all(json.as_bytes())?;
        file.flush()?;
        fs::rename(&tmp, &self.config_path)?;

        tracing::info!(path = %self.config_path.display(), "config saved");
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

// ============================================================================
// APP CONFIG (environment)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Where the settings store is persisted
    pub config_path: PathBuf,

    /// Reservation CSV export; `None` means the built-in sample data
    pub reservations_path: Option<PathBuf>,

    /// Fixed actual bank balance; `None` means the simulated balance
    pub bank_balance: Option<Decimal>,

    /// API server listen address
    pub bind_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
            reservations_path: None,
            bank_balance: None,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup (tests pass a map instead of the process env)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = AppConfig::default();

        let bank_balance = non_empty(BANK_BALANCE_ENV).and_then(|raw| {
            match Decimal::from_str(&raw) {
                Ok(balance) => Some(balance),
                Err(err) => {
                    tracing::warn!(value = %raw, error = %err, "ignoring unparseable bank balance");
                    None
                }
            }
        });

        AppConfig {
            config_path: non_empty(CONFIG_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.config_path),
            reservations_path: non_empty(RESERVATIONS_PATH_ENV).map(PathBuf::from),
            bank_balance,
            bind_addr: non_empty(BIND_ADDR_ENV).unwrap_or(defaults.bind_addr),
        }
    }

    pub fn config_manager(&self) -> ConfigManager {
        ConfigManager::new(self.config_path.clone())
    }
}

// ============================================================================
// TESTS
// ============================================================================
