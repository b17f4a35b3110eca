//! PHI category enumeration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// PHI categories this scanner reports, one report file each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhiCategory {
    /// Towns, cities, states, hospitals and other places
    Location,
    /// Healthcare provider first and last names
    Name,
    /// Telephone numbers
    Phone,
    /// Numeric dates, bare years and month names
    Date,
    /// Ages over the reporting threshold
    Age,
}

impl PhiCategory {
    /// All categories in report order
    pub const ALL: [PhiCategory; 5] = [
        Self::Location,
        Self::Name,
        Self::Phone,
        Self::Date,
        Self::Age,
    ];

    /// Lowercase label used in configuration, logs and file names
    pub fn label(&self) -> &'static str {
        match self {
            Self::Location => "location",
            Self::Name => "name",
            Self::Phone => "phone",
            Self::Date => "date",
            Self::Age => "age",
        }
    }

    /// Default report file name for this category
    pub fn default_output(&self) -> String {
        format!("{}.phi", self.label())
    }

    /// Whether this category's matcher is built from lexicon files
    pub fn uses_lexicons(&self) -> bool {
        matches!(self, Self::Location | Self::Name)
    }
}

impl fmt::Display for PhiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PhiCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "location" | "loc" => Ok(Self::Location),
            "name" | "hcp" | "provider" => Ok(Self::Name),
            "phone" => Ok(Self::Phone),
            "date" => Ok(Self::Date),
            "age" => Ok(Self::Age),
            _ => Err(format!(
                "Unknown PHI category '{s}'. Must be one of: location, name, phone, date, age"
            )),
        }
    }
}
