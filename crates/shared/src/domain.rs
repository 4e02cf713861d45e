use std::{fmt, str::FromStr};

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! label_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

label_newtype!(GuideId);
label_newtype!(DurationId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MysteryCategory {
    Joyful,
    Sorrowful,
    Glorious,
    Luminous,
}

impl MysteryCategory {
    pub const ALL: [MysteryCategory; 4] = [
        MysteryCategory::Joyful,
        MysteryCategory::Sorrowful,
        MysteryCategory::Glorious,
        MysteryCategory::Luminous,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            MysteryCategory::Joyful => "joyful",
            MysteryCategory::Sorrowful => "sorrowful",
            MysteryCategory::Glorious => "glorious",
            MysteryCategory::Luminous => "luminous",
        }
    }

    /// Traditional weekly schedule: Joyful on Monday and Saturday, Sorrowful on
    /// Tuesday and Friday, Glorious on Wednesday and Sunday, Luminous on Thursday.
    pub fn for_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon | Weekday::Sat => MysteryCategory::Joyful,
            Weekday::Tue | Weekday::Fri => MysteryCategory::Sorrowful,
            Weekday::Wed | Weekday::Sun => MysteryCategory::Glorious,
            Weekday::Thu => MysteryCategory::Luminous,
        }
    }
}

impl fmt::Display for MysteryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MysteryCategory::Joyful => "Joyful",
            MysteryCategory::Sorrowful => "Sorrowful",
            MysteryCategory::Glorious => "Glorious",
            MysteryCategory::Luminous => "Luminous",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown mystery category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for MysteryCategory {
    type Err = UnknownCategory;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        MysteryCategory::ALL
            .into_iter()
            .find(|category| category.slug().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownCategory(trimmed.to_string()))
    }
}

/// Position of a meditation inside its mystery set. `ordinal` is zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeditationId {
    pub category: MysteryCategory,
    pub ordinal: u8,
}

impl MeditationId {
    pub fn new(category: MysteryCategory, ordinal: u8) -> Self {
        Self { category, ordinal }
    }
}

impl fmt::Display for MeditationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category.slug(), self.ordinal + 1)
    }
}
