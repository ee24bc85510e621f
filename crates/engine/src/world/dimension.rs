//! Dimension identifiers.
//!
//! Every world lattice belongs to exactly one dimension, and anything that
//! records a location outside the lattice (e.g. a registry entry) must carry
//! the dimension alongside the `BlockPos`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum DimensionId {
    #[default]
    #[serde(rename = "minecraft:overworld")]
    Overworld,
    #[serde(rename = "minecraft:the_nether")]
    Nether,
    #[serde(rename = "minecraft:the_end")]
    End,
}

impl DimensionId {
    pub const ALL: [DimensionId; 3] = [Self::Overworld, Self::Nether, Self::End];

    /// Namespaced key used in save files and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Overworld => "minecraft:overworld",
            Self::Nether => "minecraft:the_nether",
            Self::End => "minecraft:the_end",
        }
    }
}

impl fmt::Display for DimensionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a dimension key is not one of the known namespaced keys.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown dimension key '{0}'")]
pub struct UnknownDimension(pub String);

impl FromStr for DimensionId {
    type Err = UnknownDimension;

    /// Accepts both the namespaced key and the bare path (`"the_nether"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let path = s.strip_prefix("minecraft:").unwrap_or(s);
        match path {
            "overworld" => Ok(Self::Overworld),
            "the_nether" | "nether" => Ok(Self::Nether),
            "the_end" | "end" => Ok(Self::End),
            _ => Err(UnknownDimension(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_parse_back() {
        for dim in DimensionId::ALL {
            assert_eq!(dim.as_str().parse::<DimensionId>(), Ok(dim));
        }
        assert_eq!("nether".parse::<DimensionId>(), Ok(DimensionId::Nether));
        let err = "minecraft:aether".parse::<DimensionId>().unwrap_err();
        assert_eq!(err.to_string(), "unknown dimension key 'minecraft:aether'");
    }
}
