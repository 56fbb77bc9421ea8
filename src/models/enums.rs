use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid value for {field}: {value}")]
pub struct ParseEnumError {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ParseEnumError {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(FeedKind {
    Collection => "collection",
    Document => "document",
});

str_enum!(MergePriority {
    FirstSource => "first_source",
    SecondSource => "second_source",
});

str_enum!(RecordShape {
    Collection => "collection",
    Array => "array",
    Map => "map",
    Flat => "flat",
});

impl Default for MergePriority {
    /// The second merge input is visited first, so its copy of a duplicate survives.
    fn default() -> Self {
        Self::SecondSource
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn feed_kind_round_trip() {
        for (variant, s) in [
            (FeedKind::Collection, "collection"),
            (FeedKind::Document, "document"),
        ] {
            assert_eq!(variant.as_str(), s);
            assert_eq!(FeedKind::from_str(s).unwrap(), variant);
        }
    }

    #[test]
    fn merge_priority_serde_matches_as_str() {
        let json = serde_json::to_string(&MergePriority::FirstSource).unwrap();
        assert_eq!(json, "\"first_source\"");
        let back: MergePriority = serde_json::from_str("\"second_source\"").unwrap();
        assert_eq!(back, MergePriority::SecondSource);
    }

    #[test]
    fn merge_priority_defaults_to_second() {
        assert_eq!(MergePriority::default(), MergePriority::SecondSource);
    }

    #[test]
    fn record_shape_display() {
        assert_eq!(RecordShape::Map.to_string(), "map");
    }

    #[test]
    fn unknown_value_rejected() {
        let err = FeedKind::from_str("stream").unwrap_err();
        assert_eq!(err.field, "FeedKind");
        assert_eq!(err.value, "stream");
    }
}
