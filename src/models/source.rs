//! Source model

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use validator::Validate;

/// Priority assumed for sources that carry none (lower sorts first)
pub const DEFAULT_PRIORITY: i64 = 999;

static NON_ALNUM: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("id regex"));

/// Derive the record key of a source from its display name.
///
/// Lower-cases the name, collapses every run of non-alphanumeric
/// characters into one `_` and trims `_` from both ends.
pub fn generate_id(name: &str) -> String {
    let lowered = name.to_lowercase();
    NON_ALNUM
        .replace_all(&lowered, "_")
        .trim_matches('_')
        .to_string()
}

/// Source record as cached from the remote store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SourceRecord {
    /// Record key, derived from the name at creation
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub enabled: bool,
    pub priority: Option<i64>,
    #[serde(default)]
    pub region: Option<String>,
    /// Server-assigned epoch millis of the last write
    pub last_updated: Option<i64>,
}

impl SourceRecord {
    /// Build a record from a keyed child of the `sources` node
    pub fn from_child(key: &str, value: Value) -> Result<Self, serde_json::Error> {
        let mut record: SourceRecord = serde_json::from_value(value)?;
        record.id = key.to_string();
        Ok(record)
    }

    pub fn effective_priority(&self) -> i64 {
        self.priority.unwrap_or(DEFAULT_PRIORITY)
    }

    /// Region, if set to something other than blanks
    pub fn region_label(&self) -> Option<&str> {
        self.region.as_deref().filter(|r| !r.trim().is_empty())
    }
}

/// Create source request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSource {
    #[validate(length(min = 1, message = "Source name is required"))]
    pub name: String,
    #[validate(url(message = "Source URL must be a valid URL"))]
    pub url: String,
    #[validate(range(min = 0, message = "Priority cannot be negative"))]
    pub priority: Option<i64>,
    pub region: Option<String>,
}

/// Partial update of a source. The enabled flag is not editable here;
/// it only changes through [`SetEnabled`] so the toggle is logged.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateSource {
    #[validate(length(min = 1, message = "Source name cannot be empty"))]
    pub name: Option<String>,
    #[validate(url(message = "Source URL must be a valid URL"))]
    pub url: Option<String>,
    #[validate(range(min = 0, message = "Priority cannot be negative"))]
    pub priority: Option<i64>,
    pub region: Option<String>,
}

impl UpdateSource {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.url.is_none()
            && self.priority.is_none()
            && self.region.is_none()
    }

    /// Fields to merge into the stored record
    pub fn to_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        if let Some(ref name) = self.name {
            fields.insert("name".into(), Value::from(name.trim()));
        }
        if let Some(ref url) = self.url {
            fields.insert("url".into(), Value::from(url.trim()));
        }
        if let Some(priority) = self.priority {
            fields.insert("priority".into(), Value::from(priority));
        }
        if let Some(ref region) = self.region {
            fields.insert("region".into(), Value::from(region.trim()));
        }
        fields
    }
}

/// Request body for enabling/disabling a source
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetEnabled {
    pub enabled: bool,
}

/// Counters shown on the dashboard stat cards
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct SourceStats {
    pub total: usize,
    pub active: usize,
    pub disabled: usize,
    pub regions: usize,
}
