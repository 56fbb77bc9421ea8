use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who produced a record. Open enumeration: unresolved raw roles pass through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AuthorRole {
    /// The member (patient/user) side of the conversation.
    Member,
    /// The care team (doctor, coach, assistant) side.
    Team,
    /// A non-empty role that matched no rule, lower-cased.
    Other(String),
    #[default]
    Unknown,
}

impl AuthorRole {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Member => "member",
            Self::Team => "team",
            Self::Other(raw) => raw,
            Self::Unknown => "",
        }
    }

    pub fn is_member(&self) -> bool {
        matches!(self, Self::Member)
    }
}

impl From<String> for AuthorRole {
    fn from(value: String) -> Self {
        match value.as_str() {
            "member" => Self::Member,
            "team" => Self::Team,
            "" => Self::Unknown,
            _ => Self::Other(value),
        }
    }
}

impl From<AuthorRole> for String {
    fn from(role: AuthorRole) -> Self {
        role.as_str().to_string()
    }
}

/// One document of a collection-shaped feed: its store-assigned id plus body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub id: String,
    pub data: Value,
}

impl StoredDocument {
    pub fn new(id: impl Into<String>, data: Value) -> Self {
        Self { id: id.into(), data }
    }
}

/// A normalized event, independent of the physical shape it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    /// Unique within one normalization pass.
    pub id: String,
    pub timestamp: Option<DateTime<Utc>>,
    /// Whitespace-collapsed; may be empty.
    pub text: String,
    pub author_role: AuthorRole,
    pub author_name: String,
    pub author_id: Option<String>,
    /// The original payload, untouched.
    pub raw: Value,
}

impl CanonicalRecord {
    pub fn timestamp_millis(&self) -> Option<i64> {
        self.timestamp.map(|ts| ts.timestamp_millis())
    }

    /// Look up a field of the original payload.
    pub fn raw_field(&self, name: &str) -> Option<&Value> {
        self.raw.get(name)
    }
}
