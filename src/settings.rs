// ⚙️ Settings - default record + per-property overrides
//
// Resolution rule: start from the default settings, then replace every
// field the property's override carries. Unknown tags get the defaults.

use crate::error::{Result, StatementError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_PROPERTY_TAG: &str = "480 Laswell Ave";

// ============================================================================
// SETTINGS (always complete)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub management_fee_percentage: Decimal,
    pub supplies_estimate_percentage: Decimal,
    pub utilities_estimate_percentage: Decimal,
    pub default_tag: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_company: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            management_fee_percentage: dec!(20),
            supplies_estimate_percentage: dec!(15),
            utilities_estimate_percentage: dec!(8),
            default_tag: DEFAULT_PROPERTY_TAG.to_string(),
            owner_name: None,
            management_company: None,
        }
    }
}

impl Settings {
    /// Field-by-field merge: a field present in the override replaces ours
    pub fn merged_with(&self, overrides: &SettingsOverride) -> Settings {
        Settings {
            management_fee_percentage: overrides
                .management_fee_percentage
                .unwrap_or(self.management_fee_percentage),
            supplies_estimate_percentage: overrides
                .supplies_estimate_percentage
                .unwrap_or(self.supplies_estimate_percentage),
            utilities_estimate_percentage: overrides
                .utilities_estimate_percentage
                .unwrap_or(self.utilities_estimate_percentage),
            default_tag: overrides
                .default_tag
                .clone()
                .unwrap_or_else(|| self.default_tag.clone()),
            owner_name: overrides
                .owner_name
                .clone()
                .or_else(|| self.owner_name.clone()),
            management_company: overrides
                .management_company
                .clone()
                .or_else(|| self.management_company.clone()),
        }
    }
}

// ============================================================================
// SETTINGS OVERRIDE (partial)
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_fee_percentage: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplies_estimate_percentage: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utilities_estimate_percentage: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_tag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_company: Option<String>,
}

impl SettingsOverride {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: override the management fee
    pub fn with_management_fee(mut self, percentage: Decimal) -> Self {
        self.management_fee_percentage = Some(percentage);
        self
    }

    /// Builder pattern: override the supplies estimate rate
    pub fn with_supplies_estimate(mut self, percentage: Decimal) -> Self {
        self.supplies_estimate_percentage = Some(percentage);
        self
    }

    /// Builder pattern: override the utilities estimate rate
    pub fn with_utilities_estimate(mut self, percentage: Decimal) -> Self {
        self.utilities_estimate_percentage = Some(percentage);
        self
    }

    /// Builder pattern: set the owner name
    pub fn with_owner_name(mut self, owner_name: impl Into<String>) -> Self {
        self.owner_name = Some(owner_name.into());
        self
    }

    /// Builder pattern: set the management company
    pub fn with_management_company(mut self, company: impl Into<String>) -> Self {
        self.management_company = Some(company.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == SettingsOverride::default()
    }
}

// ============================================================================
// COLLABORATOR TRAITS
// ============================================================================

/// Read-only view used by the resolver
pub trait SettingsSource {
    fn default_settings(&self) -> &Settings;

    fn override_for(&self, tag: &str) -> Option<&SettingsOverride>;

    /// Effective settings for a property tag. Never fails: tags without an
    /// override silently receive the defaults.
    fn resolve(&self, tag: &str) -> Settings {
        match self.override_for(tag) {
            Some(overrides) => self.default_settings().merged_with(overrides),
            None => self.default_settings().clone(),
        }
    }
}

/// Read-write view used by configuration management
pub trait SettingsEditor: SettingsSource {
    /// Replace the defaults wholesale
    fn update_defaults(&mut self, settings: Settings);

    /// Register a new property; fails on an empty or already-known tag
    fn add_override(&mut self, tag: &str, overrides: SettingsOverride) -> Result<()>;

    /// Insert or replace a property's override
    fn update_override(&mut self, tag: &str, overrides: SettingsOverride) -> Result<()>;

    fn remove_override(&mut self, tag: &str) -> Result<SettingsOverride>;
}

// ============================================================================
// CONFIG STORE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigStore {
    pub default_settings: Settings,

    #[serde(default)]
    pub client_overrides: BTreeMap<String, SettingsOverride>,
}

impl Default for ConfigStore {
    /// Defaults plus the one property the application ships with
    fn default() -> Self {
        let mut client_overrides = BTreeMap::new();
        client_overrides.insert(
            DEFAULT_PROPERTY_TAG.to_string(),
            SettingsOverride::new()
                .with_management_fee(dec!(20))
                .with_supplies_estimate(dec!(15))
                .with_utilities_estimate(dec!(8))
                .with_owner_name("Property Owner")
                .with_management_company("Your Management Company"),
        );

        ConfigStore {
            default_settings: Settings::default(),
            client_overrides,
        }
    }
}

impl ConfigStore {
    /// Store with the given defaults and no overrides
    pub fn with_defaults(default_settings: Settings) -> Self {
        ConfigStore {
            default_settings,
            client_overrides: BTreeMap::new(),
        }
    }

    /// Tags offered for statement generation: every configured property,
    /// or the default tag when none are configured
    pub fn tags(&self) -> Vec<String> {
        if self.client_overrides.is_empty() {
            vec![self.default_settings.default_tag.clone()]
        } else {
            self.client_overrides.keys().cloned().collect()
        }
    }

    /// Number of properties with client-specific settings
    pub fn active_properties(&self) -> usize {
        self.client_overrides.len()
    }
}

impl SettingsSource for ConfigStore {
    fn default_settings(&self) -> &Settings {
        &self.default_settings
    }

    fn override_for(&self, tag: &str) -> Option<&SettingsOverride> {
        self.client_overrides.get(tag)
    }
}

impl SettingsEditor for ConfigStore {
    fn update_defaults(&mut self, settings: Settings) {
        tracing::info!(
            management_fee = %settings.management_fee_percentage,
            supplies = %settings.supplies_estimate_percentage,
            utilities = %settings.utilities_estimate_percentage,
            "default settings replaced"
        );
        self.default_settings = settings;
    }

    fn add_override(&mut self, tag: &str, overrides: SettingsOverride) -> Result<()> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(StatementError::EmptyTag);
        }
        if self.client_overrides.contains_key(tag) {
            return Err(StatementError::DuplicateOverride(tag.to_string()));
        }

        tracing::info!(tag, "client settings added");
        self.client_overrides.insert(tag.to_string(), overrides);
        Ok(())
    }

    fn update_override(&mut self, tag: &str, overrides: SettingsOverride) -> Result<()> {
        let tag = tag.trim();
        if tag.is_empty() {
            return Err(StatementError::EmptyTag);
        }

        tracing::info!(tag, "client settings updated");
        self.client_overrides.insert(tag.to_string(), overrides);
        Ok(())
    }

    fn remove_override(&mut self, tag: &str) -> Result<SettingsOverride> {
        let removed = self
            .client_overrides
            .remove(tag)
            .ok_or_else(|| StatementError::UnknownOverride(tag.to_string()))?;

        tracing::info!(tag, "client settings removed");
        Ok(removed)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tag_gets_defaults() {
        let store = ConfigStore::default();
        let settings = store.resolve("Some Unknown Cabin");

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.owner_name, None);
    }

    #[test]
    fn test_partial_override_only_replaces_present_fields() {
        let mut store = ConfigStore::with_defaults(Settings::default());
        store
            .add_override("Beach House", SettingsOverride::new().with_management_fee(dec!(25)))
            .unwrap();

        let settings = store.resolve("Beach House");
        let defaults = Settings::default();

        assert_eq!(settings.management_fee_percentage, dec!(25));
        assert_eq!(
            settings.supplies_estimate_percentage,
            defaults.supplies_estimate_percentage
        );
        assert_eq!(
            settings.utilities_estimate_percentage,
            defaults.utilities_estimate_percentage
        );
        assert_eq!(settings.default_tag, defaults.default_tag);
        assert_eq!(settings.owner_name, defaults.owner_name);
        assert_eq!(settings.management_company, defaults.management_company);
    }

    #[test]
    fn test_seeded_property_resolves_metadata() {
        let store = ConfigStore::default();
        let settings = store.resolve(DEFAULT_PROPERTY_TAG);

        assert_eq!(settings.management_fee_percentage, dec!(20));
        assert_eq!(settings.owner_name.as_deref(), Some("Property Owner"));
        assert_eq!(
            settings.management_company.as_deref(),
            Some("Your Management Company")
        );
    }

    #[test]
    fn test_resolved_settings_follow_updated_defaults() {
        let mut store = ConfigStore::default();
        store
            .update_override("Cabin", SettingsOverride::new().with_owner_name("Ana"))
            .unwrap();

        let mut defaults = Settings::default();
        defaults.utilities_estimate_percentage = dec!(10);
        store.update_defaults(defaults);

        let settings = store.resolve("Cabin");
        assert_eq!(settings.utilities_estimate_percentage, dec!(10));
        assert_eq!(settings.owner_name.as_deref(), Some("Ana"));
    }

    #[test]
    fn test_add_override_rejects_duplicates_and_empty_tags() {
        let mut store = ConfigStore::default();

        let err = store
            .add_override(DEFAULT_PROPERTY_TAG, SettingsOverride::new())
            .unwrap_err();
        assert!(matches!(err, StatementError::DuplicateOverride(_)));

        let err = store.add_override("   ", SettingsOverride::new()).unwrap_err();
        assert!(matches!(err, StatementError::EmptyTag));
    }

    #[test]
    fn test_remove_override() {
        let mut store = ConfigStore::default();
        let removed = store.remove_override(DEFAULT_PROPERTY_TAG).unwrap();
        assert_eq!(removed.owner_name.as_deref(), Some("Property Owner"));
        assert_eq!(store.active_properties(), 0);

        let err = store.remove_override(DEFAULT_PROPERTY_TAG).unwrap_err();
        assert!(matches!(err, StatementError::UnknownOverride(_)));
    }

    #[test]
    fn test_tags_fall_back_to_default_tag() {
        let mut store = ConfigStore::default();
        assert_eq!(store.tags(), vec![DEFAULT_PROPERTY_TAG.to_string()]);

        store.remove_override(DEFAULT_PROPERTY_TAG).unwrap();
        store.default_settings.default_tag = "12 Elm St".to_string();
        assert_eq!(store.tags(), vec!["12 Elm St".to_string()]);

        store
            .add_override("Beach House", SettingsOverride::new())
            .unwrap();
        store.add_override("Alpine Loft", SettingsOverride::new()).unwrap();
        assert_eq!(store.tags(), vec!["Alpine Loft", "Beach House"]);
    }

    #[test]
    fn test_config_store_json_shape() {
        let json = r#"{
            "default_settings": {
                "management_fee_percentage": 20,
                "default_tag": "480 Laswell Ave",
                "supplies_estimate_percentage": 15,
                "utilities_estimate_percentage": 8
            },
            "client_overrides": {
                "Beach House": { "management_fee_percentage": 18.5 }
            }
        }"#;

        let store: ConfigStore = serde_json::from_str(json).unwrap();
        assert_eq!(store.default_settings, Settings::default());
        assert_eq!(
            store.resolve("Beach House").management_fee_percentage,
            dec!(18.5)
        );
        assert!(!store.client_overrides["Beach House"].is_empty());
    }
}
