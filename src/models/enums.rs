use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::ModelError;

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Serde goes through the same strings, so the wire form matches `as_str`.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
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
            type Err = ModelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ModelError::InvalidEnum {
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

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

str_enum!(InteractionRisk {
    Moderate => "moderate",
    High => "high",
});

str_enum!(AdherenceStatus {
    Excellent => "Excellent",
    Good => "Good",
    Fair => "Fair",
    NeedsImprovement => "Needs Improvement",
});

str_enum!(RecommendationCategory {
    Adherence => "Adherence",
    Interactions => "Interactions",
    Monitoring => "Monitoring",
});

str_enum!(RecommendationPriority {
    High => "High",
    Medium => "Medium",
});

impl AdherenceStatus {
    /// Classify an adherence percentage (0–100).
    pub fn from_percentage(rate: f64) -> Self {
        if rate >= 90.0 {
            Self::Excellent
        } else if rate >= 80.0 {
            Self::Good
        } else if rate >= 70.0 {
            Self::Fair
        } else {
            Self::NeedsImprovement
        }
    }
}
