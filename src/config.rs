use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::MergePriority;

/// Application-level constants
pub const APP_NAME: &str = "MediVault";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Config file name inside the application data directory.
pub const CONFIG_FILE_NAME: &str = "engine.json";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "medivault_lib=info"
}

/// Get the application data directory
/// ~/MediVault/ on all platforms. `None` when the home directory is unknown.
pub fn app_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(APP_NAME))
}

/// Default location of the engine config file.
pub fn default_config_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

// ═══════════════════════════════════════════
// Field aliases
// ═══════════════════════════════════════════

/// Ordered field-name candidates per logical attribute.
///
/// Resolution always walks a list front to back and takes the first
/// usable value, so order here is preference order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldAliases {
    /// Candidates for the record instant.
    pub timestamp: Vec<String>,
    /// Candidates for the message body.
    pub text: Vec<String>,
    /// Object-valued fields whose nested `text` wins over every flat text alias.
    pub nested_text: Vec<String>,
    pub role: Vec<String>,
    pub display_name: Vec<String>,
    pub author_id: Vec<String>,
    /// Candidates for a source-assigned id inside array elements.
    pub source_id: Vec<String>,
}

impl Default for FieldAliases {
    fn default() -> Self {
        Self {
            timestamp: strings(&["createdAt", "timestamp", "time", "date"]),
            text: strings(&["text", "message", "content", "body", "msg"]),
            nested_text: strings(&["content"]),
            role: strings(&["role", "sender"]),
            display_name: strings(&["senderName", "displayName", "name", "author", "from", "sender"]),
            author_id: strings(&["uid", "userId", "memberId"]),
            source_id: strings(&["id"]),
        }
    }
}

/// Role values mapped into the closed member/team set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleRules {
    /// Exact (lower-cased) values meaning member-like.
    pub member_values: Vec<String>,
    /// Exact (lower-cased) values meaning team-like.
    pub team_values: Vec<String>,
    /// Substrings meaning member-like when no exact value matched.
    pub member_substrings: Vec<String>,
    /// Substrings meaning team-like when no exact value matched.
    pub team_substrings: Vec<String>,
}

impl Default for RoleRules {
    fn default() -> Self {
        Self {
            member_values: strings(&["patient", "user", "member"]),
            team_values: strings(&["doctor", "assistant", "coach", "team"]),
            member_substrings: strings(&["member", "patient"]),
            team_substrings: strings(&["doctor", "coach", "team", "nurse", "physician"]),
        }
    }
}

/// Which sub-fields of a document may hold records, and what makes an
/// object look like a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeRules {
    /// Sub-fields checked for an array of records, in order.
    pub array_fields: Vec<String>,
    /// Sub-fields checked for a map of records before the document itself.
    pub map_fields: Vec<String>,
    /// Extra marker fields beyond the text, timestamp and metric names.
    pub extra_markers: Vec<String>,
}

impl Default for ShapeRules {
    fn default() -> Self {
        Self {
            array_fields: strings(&["items", "series", "messages"]),
            map_fields: strings(&["series", "items", "messages"]),
            extra_markers: strings(&["title", "type", "note"]),
        }
    }
}

// ═══════════════════════════════════════════
// EngineConfig
// ═══════════════════════════════════════════

/// Immutable engine configuration, supplied once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Program epoch: day one of week one.
    pub epoch: NaiveDate,
    pub member_display_name: String,
    pub team_display_name: String,
    pub aliases: FieldAliases,
    pub roles: RoleRules,
    pub shapes: ShapeRules,
    /// Numeric fields carried by daily metric rows.
    pub metric_fields: Vec<String>,
    /// Which merge input wins when two records share a fingerprint.
    pub merge_priority: MergePriority,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            epoch: default_epoch(),
            member_display_name: "Member".into(),
            team_display_name: "Care Team".into(),
            aliases: FieldAliases::default(),
            roles: RoleRules::default(),
            shapes: ShapeRules::default(),
            metric_fields: strings(&["HRV", "RHR", "Sleep"]),
            merge_priority: MergePriority::default(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a config from a JSON string. Missing keys take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Read `~/MediVault/engine.json`, or use defaults when it does not exist.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match default_config_path() {
            Some(path) if path.exists() => {
                tracing::info!(path = %path.display(), "Loading engine config");
                Self::load(&path)
            }
            _ => {
                tracing::debug!("No engine config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.member_display_name.trim().is_empty() {
            return Err(ConfigError::Invalid("member_display_name is empty".into()));
        }
        if self.team_display_name.trim().is_empty() {
            return Err(ConfigError::Invalid("team_display_name is empty".into()));
        }
        let required = [
            ("aliases.timestamp", &self.aliases.timestamp),
            ("aliases.text", &self.aliases.text),
            ("aliases.role", &self.aliases.role),
            ("aliases.display_name", &self.aliases.display_name),
        ];
        for (name, list) in required {
            if list.iter().all(|alias| alias.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!("{name} has no aliases")));
            }
        }
        Ok(())
    }

    /// Every field whose presence makes an object look like a record.
    pub fn record_markers(&self) -> impl Iterator<Item = &str> {
        self.aliases
            .text
            .iter()
            .chain(&self.aliases.nested_text)
            .chain(&self.aliases.timestamp)
            .chain(&self.metric_fields)
            .chain(&self.shapes.extra_markers)
            .map(String::as_str)
    }
}

fn default_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, 17).unwrap_or_default()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
