use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

use crate::model::Coordinate;

/// User-facing source preference (`--source`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceOverride {
    /// Force the regional (NWS) provider.
    Nws,
    /// Force the global (wttr.in) provider.
    Wttr,
    /// Pick by coordinate.
    #[default]
    Auto,
}

impl SourceOverride {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceOverride::Nws => "nws",
            SourceOverride::Wttr => "wttr",
            SourceOverride::Auto => "auto",
        }
    }

    pub const fn all() -> &'static [SourceOverride] {
        &[SourceOverride::Nws, SourceOverride::Wttr, SourceOverride::Auto]
    }
}

impl std::fmt::Display for SourceOverride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for SourceOverride {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "nws" => Ok(SourceOverride::Nws),
            "wttr" => Ok(SourceOverride::Wttr),
            "auto" => Ok(SourceOverride::Auto),
            _ => Err(anyhow::anyhow!("Unknown source '{value}'. Supported sources: nws, wttr, auto.")),
        }
    }
}

impl std::str::FromStr for SourceOverride {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

/// Which provider family actually produced a fact set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Regional,
    Global,
}

/// `true` when the regional provider should be tried first.
pub fn select(coord: &Coordinate, preference: SourceOverride) -> bool {
    match preference {
        SourceOverride::Nws => true,
        SourceOverride::Wttr => false,
        SourceOverride::Auto => coord.in_regional_coverage(),
    }
}
