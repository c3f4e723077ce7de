//! Declarative configuration form for the host's plugin settings UI.

use crate::config::{current_uploader, BackupConfig, PLUGIN_ID};
use picmirror::{DestinationId, HostHandles};
use serde::Serialize;

/// A destination that can be offered as a backup target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DestinationChoice {
    pub id: DestinationId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormChoice {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FormField {
    Input {
        name: String,
        default: String,
        required: bool,
        message: String,
    },
    List {
        name: String,
        choices: Vec<FormChoice>,
        default: String,
        required: bool,
        message: String,
    },
    Checkbox {
        name: String,
        choices: Vec<FormChoice>,
        default: Vec<String>,
        required: bool,
        message: String,
    },
    Confirm {
        name: String,
        default: bool,
        required: bool,
        message: String,
    },
}

impl FormField {
    pub fn name(&self) -> &str {
        match self {
            FormField::Input { name, .. }
            | FormField::List { name, .. }
            | FormField::Checkbox { name, .. }
            | FormField::Confirm { name, .. } => name,
        }
    }
}

/// Registered destinations other than the primary uploader and this plugin
/// that have a non-empty `picBed.<id>` config section.
pub fn configured_destinations(handles: &HostHandles) -> Vec<DestinationChoice> {
    let primary = current_uploader(handles.config.as_ref());

    handles
        .uploaders
        .list_ids()
        .into_iter()
        .filter(|id| id != PLUGIN_ID && Some(id) != primary.as_ref())
        .filter(|id| {
            matches!(
                handles.config.get(&format!("picBed.{}", id)),
                Some(serde_json::Value::Object(ref section)) if !section.is_empty()
            )
        })
        .map(|id| {
            let name = handles
                .uploaders
                .get(&id)
                .map(|u| u.name().to_string())
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| id.clone());
            DestinationChoice { id, name }
        })
        .collect()
}

pub fn config_form(handles: &HostHandles) -> Vec<FormField> {
    let destinations = configured_destinations(handles);
    let primary = current_uploader(handles.config.as_ref()).unwrap_or_else(|| "none".to_string());

    if destinations.is_empty() {
        return vec![FormField::Input {
            name: "notice".to_string(),
            default: format!(
                "Current uploader: {}. Configure another uploader first, then reopen this page.",
                primary
            ),
            required: false,
            message: "Setup required".to_string(),
        }];
    }

    let saved = BackupConfig::load(handles.config.as_ref());
    let selected = saved
        .backup_destination_ids
        .iter()
        .filter(|id| destinations.iter().any(|d| &d.id == *id))
        .cloned()
        .collect();

    let choices = destinations
        .into_iter()
        .map(|d| FormChoice {
            name: format!("{} ({})", d.name, d.id),
            value: d.id,
        })
        .collect();

    vec![
        FormField::List {
            name: "currentUploaderDisplay".to_string(),
            choices: vec![FormChoice {
                name: format!("{} (current uploader)", primary),
                value: primary.clone(),
            }],
            default: primary,
            required: false,
            message: "Primary uploader".to_string(),
        },
        FormField::Checkbox {
            name: "backupDestinationIds".to_string(),
            choices,
            default: selected,
            required: false,
            message: "Backup destinations (multiple allowed)".to_string(),
        },
        FormField::Confirm {
            name: "verboseLogging".to_string(),
            default: saved.verbose_logging,
            required: false,
            message: "Verbose logging".to_string(),
        },
    ]
}
