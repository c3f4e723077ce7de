use indexmap::IndexSet;
use picmirror::{config_section, ConfigStore, DestinationId, Result};
use serde::{Deserialize, Serialize};

/// Id this plugin registers under; never a valid backup destination.
pub const PLUGIN_ID: &str = "multiple-backup";

/// Config store key holding [`BackupConfig`].
pub const CONFIG_NAMESPACE: &str = "picgo-plugin-multiple-backup";

const CURRENT_UPLOADER_KEY: &str = "picBed.uploader";
const LEGACY_CURRENT_UPLOADER_KEY: &str = "picBed.current";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupConfig {
    #[serde(default, alias = "backupUploaders")]
    pub backup_destination_ids: IndexSet<DestinationId>,
    #[serde(default = "default_verbose", alias = "enableLog")]
    pub verbose_logging: bool,
}

fn default_verbose() -> bool {
    true
}

impl Default for BackupConfig {
    fn default() -> Self {
        BackupConfig {
            backup_destination_ids: IndexSet::new(),
            verbose_logging: default_verbose(),
        }
    }
}

impl BackupConfig {
    /// Read the plugin section from the host store. A missing or malformed
    /// section yields the defaults (no destinations).
    pub fn load(store: &dyn ConfigStore) -> Self {
        match config_section::<BackupConfig>(store, CONFIG_NAMESPACE) {
            Ok(Some(config)) => config,
            Ok(None) => BackupConfig::default(),
            Err(e) => {
                tracing::error!("Failed to parse backup config: {}, using defaults", e);
                BackupConfig::default()
            }
        }
    }

    pub fn save(&self, store: &dyn ConfigStore) -> Result<()> {
        store.set(CONFIG_NAMESPACE, serde_json::to_value(self)?)
    }

    pub fn has_destinations(&self) -> bool {
        !self.backup_destination_ids.is_empty()
    }

    /// Configured destinations minus the primary uploader and this plugin,
    /// in configuration order.
    pub fn effective_destinations(&self, primary: Option<&str>) -> Vec<DestinationId> {
        self.backup_destination_ids
            .iter()
            .filter(|id| {
                let excluded = id.as_str() == PLUGIN_ID || Some(id.as_str()) == primary;
                if excluded {
                    tracing::warn!("[BACKUP] ignoring {}: not a valid backup destination", id);
                }
                !excluded
            })
            .cloned()
            .collect()
    }
}

/// The host's primary uploader: `picBed.uploader`, else `picBed.current`.
pub fn current_uploader(store: &dyn ConfigStore) -> Option<DestinationId> {
    [CURRENT_UPLOADER_KEY, LEGACY_CURRENT_UPLOADER_KEY]
        .iter()
        .find_map(|key| match store.get(key) {
            Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use picmirror::MemoryConfigStore;
    use serde_json::json;

    #[test]
    fn test_load_missing_section() {
        let store = MemoryConfigStore::new();
        let config = BackupConfig::load(&store);

        assert!(!config.has_destinations());
        assert!(config.verbose_logging);
    }

    #[test]
    fn test_load_accepts_legacy_field_names() {
        let store = MemoryConfigStore::from_value(json!({
            CONFIG_NAMESPACE: {"backupUploaders": ["smms", "github"], "enableLog": false}
        }));
        let config = BackupConfig::load(&store);

        let ids: Vec<&str> = config.backup_destination_ids.iter().map(String::as_str).collect();
        assert_eq!(ids, vec!["smms", "github"]);
        assert!(!config.verbose_logging);
    }

    #[test]
    fn test_load_invalid_section_falls_back() {
        let store = MemoryConfigStore::from_value(json!({
            CONFIG_NAMESPACE: {"backupDestinationIds": "smms"}
        }));
        let config = BackupConfig::load(&store);

        assert_eq!(config, BackupConfig::default());
    }

    #[test]
    fn test_duplicate_ids_collapse_in_order() {
        let store = MemoryConfigStore::from_value(json!({
            CONFIG_NAMESPACE: {"backupDestinationIds": ["b", "a", "b"]}
        }));
        let config = BackupConfig::load(&store);

        let ids: Vec<&str> = config.backup_destination_ids.iter().map(String::as_str).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_save_round_trips_through_store() {
        let store = MemoryConfigStore::new();
        let mut config = BackupConfig::default();
        config.backup_destination_ids.insert("imgur".to_string());
        config.verbose_logging = false;
        config.save(&store).unwrap();

        assert_eq!(
            store.get("picgo-plugin-multiple-backup.backupDestinationIds"),
            Some(json!(["imgur"]))
        );
        assert_eq!(BackupConfig::load(&store), config);
    }

    #[test]
    fn test_effective_destinations_drop_primary_and_self() {
        let mut config = BackupConfig::default();
        for id in ["github", PLUGIN_ID, "smms", "imgur"] {
            config.backup_destination_ids.insert(id.to_string());
        }

        assert_eq!(
            config.effective_destinations(Some("smms")),
            vec!["github".to_string(), "imgur".to_string()]
        );
    }

    #[test]
    fn test_current_uploader_prefers_new_key() {
        let store = MemoryConfigStore::from_value(json!({
            "picBed": {"uploader": "github", "current": "smms"}
        }));
        assert_eq!(current_uploader(&store).as_deref(), Some("github"));

        let legacy = MemoryConfigStore::from_value(json!({"picBed": {"current": "smms"}}));
        assert_eq!(current_uploader(&legacy).as_deref(), Some("smms"));

        assert_eq!(current_uploader(&MemoryConfigStore::new()), None);
    }
}
