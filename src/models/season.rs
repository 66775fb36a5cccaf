use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Mode tag selecting an alternate cadence per routine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    #[default]
    Default,
    Winter,
    Summer,
}

impl Season {
    pub const ALL: [Season; 3] = [Season::Default, Season::Winter, Season::Summer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Default => "default",
            Season::Winter => "winter",
            Season::Summer => "summer",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Season::Default => "Standard",
            Season::Winter => "Winter",
            Season::Summer => "Summer",
        }
    }

    pub fn cycle(&self) -> Self {
        match self {
            Season::Default => Season::Winter,
            Season::Winter => Season::Summer,
            Season::Summer => Season::Default,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Season {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Season::ALL
            .into_iter()
            .find(|season| season.as_str() == s.trim())
            .ok_or_else(|| format!("unknown season '{s}' (expected default, winter or summer)"))
    }
}
