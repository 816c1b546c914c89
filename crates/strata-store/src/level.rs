//! Precedence level catalogue
//!
//! Ten concrete levels, totally ordered by rank, grouped into four slots.
//! Levels sharing a slot pre-combine before the slot takes its place in the
//! between-slot merge.

use crate::error::AttrError;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Precedence level, declared lowest rank first
///
/// The derived `Ord` is the precedence order: a higher level wins on
/// scalar conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    /// Plain defaults
    Default,
    /// Environment defaults
    EnvDefault,
    /// Role defaults
    RoleDefault,
    /// Forced defaults, highest inside the default slot
    ForceDefault,
    /// Normal (persisted) attributes
    Normal,
    /// Plain overrides
    Override,
    /// Role overrides
    RoleOverride,
    /// Environment overrides
    EnvOverride,
    /// Forced overrides, highest inside the override slot
    ForceOverride,
    /// Introspected host facts
    Automatic,
}

impl Level {
    /// Every level in rank order
    pub const ALL: [Level; 10] = [
        Level::Default,
        Level::EnvDefault,
        Level::RoleDefault,
        Level::ForceDefault,
        Level::Normal,
        Level::Override,
        Level::RoleOverride,
        Level::EnvOverride,
        Level::ForceOverride,
        Level::Automatic,
    ];

    /// Canonical name
    #[inline]
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::EnvDefault => "env_default",
            Self::RoleDefault => "role_default",
            Self::ForceDefault => "force_default",
            Self::Normal => "normal",
            Self::Override => "override",
            Self::RoleOverride => "role_override",
            Self::EnvOverride => "env_override",
            Self::ForceOverride => "force_override",
            Self::Automatic => "automatic",
        }
    }

    /// Slot this level pre-combines into
    #[inline]
    #[must_use]
    pub fn slot(self) -> Slot {
        match self {
            Self::Default | Self::EnvDefault | Self::RoleDefault | Self::ForceDefault => {
                Slot::Default
            }
            Self::Normal => Slot::Normal,
            Self::Override | Self::RoleOverride | Self::EnvOverride | Self::ForceOverride => {
                Slot::Override
            }
            Self::Automatic => Slot::Automatic,
        }
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Level {
    type Err = AttrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim_start_matches(':');
        Level::ALL
            .into_iter()
            .find(|level| level.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AttrError::UnknownLevel(s.to_string()))
    }
}

/// Group of levels occupying one place in the between-slot merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    /// Default sub-levels
    Default,
    /// Normal level
    Normal,
    /// Override sub-levels
    Override,
    /// Automatic level
    Automatic,
}

impl Slot {
    /// Every slot in rank order
    pub const ALL: [Slot; 4] = [Slot::Default, Slot::Normal, Slot::Override, Slot::Automatic];

    /// Levels of this slot in rank order
    #[must_use]
    pub fn levels(self) -> &'static [Level] {
        match self {
            Self::Default => &[
                Level::Default,
                Level::EnvDefault,
                Level::RoleDefault,
                Level::ForceDefault,
            ],
            Self::Normal => &[Level::Normal],
            Self::Override => &[
                Level::Override,
                Level::RoleOverride,
                Level::EnvOverride,
                Level::ForceOverride,
            ],
            Self::Automatic => &[Level::Automatic],
        }
    }

    /// Whether this slot has sub-levels that pre-combine
    #[inline]
    #[must_use]
    pub fn is_composite(self) -> bool {
        self.levels().len() > 1
    }
}

impl Display for Slot {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Default => "default",
            Self::Normal => "normal",
            Self::Override => "override",
            Self::Automatic => "automatic",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_order_matches_declaration() {
        let mut sorted = Level::ALL;
        sorted.sort();
        assert_eq!(sorted, Level::ALL);
        assert!(Level::Default < Level::Normal);
        assert!(Level::Normal < Level::Override);
        assert!(Level::ForceOverride < Level::Automatic);
        assert!(Level::EnvDefault < Level::RoleDefault);
        assert!(Level::RoleOverride < Level::EnvOverride);
    }

    #[test]
    fn slots_partition_levels() {
        let flattened: Vec<Level> = Slot::ALL
            .iter()
            .flat_map(|slot| slot.levels().iter().copied())
            .collect();
        assert_eq!(flattened, Level::ALL.to_vec());
        for level in Level::ALL {
            assert!(level.slot().levels().contains(&level));
        }
        assert!(Slot::Default.is_composite());
        assert!(!Slot::Automatic.is_composite());
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!("role_default".parse::<Level>().unwrap(), Level::RoleDefault);
        assert_eq!("AUTOMATIC".parse::<Level>().unwrap(), Level::Automatic);
        assert_eq!(":override".parse::<Level>().unwrap(), Level::Override);
        for level in Level::ALL {
            assert_eq!(level.to_string().parse::<Level>().unwrap(), level);
        }
    }

    #[test]
    fn unknown_name_is_unknown_level() {
        let err = "sideways".parse::<Level>().unwrap_err();
        assert!(matches!(err, AttrError::UnknownLevel(name) if name == "sideways"));
    }
}
