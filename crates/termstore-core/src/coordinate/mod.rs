//! # Coordinates
//!
//! Value types describing a view onto the version history.
//!
//! - [`StampCoordinate`]: which statuses, which point in time on which path,
//!   which modules to ignore.
//! - [`StampPath`]: a path and the positions it branched from.
//! - [`LanguageCoordinate`]: how to pick one description among many.
//!
//! All of them are plain data: cheap to clone, `Send + Sync`, serde-ready.

pub mod presets;

use crate::primitives::LATEST_TIME;
use crate::{Nid, Status, TermstoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// STATE SET
// =============================================================================

/// Statuses a view accepts for the latest version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateSet(BTreeSet<Status>);

impl StateSet {
    #[must_use]
    pub fn active_only() -> Self {
        Self::of(&[Status::Active])
    }

    #[must_use]
    pub fn active_and_inactive() -> Self {
        Self::of(&[Status::Active, Status::Inactive])
    }

    #[must_use]
    pub fn any() -> Self {
        Self::of(&Status::ALL)
    }

    #[must_use]
    pub fn of(statuses: &[Status]) -> Self {
        Self(statuses.iter().copied().collect())
    }

    #[must_use]
    pub fn contains(&self, status: Status) -> bool {
        self.0.contains(&status)
    }

    pub fn iter(&self) -> impl Iterator<Item = Status> + '_ {
        self.0.iter().copied()
    }
}

impl fmt::Display for StateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = self.iter().map(|s| s.to_string()).collect();
        f.write_str(&names.join(","))
    }
}

/// Comma-separated statuses, e.g. `active,inactive`.
impl FromStr for StateSet {
    type Err = TermstoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let statuses = s
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(str::parse)
            .collect::<Result<BTreeSet<Status>, _>>()?;
        if statuses.is_empty() {
            return Err(TermstoreError::InvalidConfig(
                "A state set needs at least one status".to_string(),
            ));
        }
        Ok(Self(statuses))
    }
}

// =============================================================================
// POSITION & PATH
// =============================================================================

/// A point in time on a path.
///
/// `time == LATEST_TIME` means "no upper bound".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StampPosition {
    pub time: i64,
    pub path: Nid,
}

impl StampPosition {
    #[must_use]
    pub const fn new(time: i64, path: Nid) -> Self {
        Self { time, path }
    }

    #[must_use]
    pub const fn latest_on(path: Nid) -> Self {
        Self::new(LATEST_TIME, path)
    }

    #[must_use]
    pub const fn is_latest(&self) -> bool {
        self.time == LATEST_TIME
    }
}

/// A path and the positions on other paths it inherits from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StampPath {
    pub path: Nid,
    #[serde(default)]
    pub origins: BTreeSet<StampPosition>,
}

impl StampPath {
    #[must_use]
    pub fn new(path: Nid, origins: impl IntoIterator<Item = StampPosition>) -> Self {
        Self {
            path,
            origins: origins.into_iter().collect(),
        }
    }

    /// A path that inherits nothing.
    #[must_use]
    pub fn root(path: Nid) -> Self {
        Self::new(path, [])
    }
}

// =============================================================================
// STAMP COORDINATE
// =============================================================================

/// A bitemporal view: allowed statuses, a position, excluded modules.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StampCoordinate {
    pub states: StateSet,
    pub position: StampPosition,
    #[serde(default)]
    pub excluded_modules: BTreeSet<Nid>,
}

impl StampCoordinate {
    #[must_use]
    pub fn new(states: StateSet, position: StampPosition) -> Self {
        Self {
            states,
            position,
            excluded_modules: BTreeSet::new(),
        }
    }

    /// Same view at another time.
    #[must_use]
    pub fn at_time(&self, time: i64) -> Self {
        Self {
            position: StampPosition::new(time, self.position.path),
            ..self.clone()
        }
    }

    /// Same view on another path.
    #[must_use]
    pub fn on_path(&self, path: Nid) -> Self {
        Self {
            position: StampPosition::new(self.position.time, path),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_states(&self, states: StateSet) -> Self {
        Self {
            states,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn excluding_modules(&self, modules: impl IntoIterator<Item = Nid>) -> Self {
        let mut excluded_modules = self.excluded_modules.clone();
        excluded_modules.extend(modules);
        Self {
            excluded_modules,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn allows(&self, status: Status) -> bool {
        self.states.contains(status)
    }

    #[must_use]
    pub fn excludes_module(&self, module: Nid) -> bool {
        self.excluded_modules.contains(&module)
    }
}

// =============================================================================
// LANGUAGE COORDINATE
// =============================================================================

/// Preference lists for description selection. Earlier entries win.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LanguageCoordinate {
    /// Required description language; `terms::LANGUAGE` accepts any.
    pub language: Nid,
    pub description_patterns: Vec<Nid>,
    pub description_types: Vec<Nid>,
    #[serde(default)]
    pub dialect_patterns: Vec<Nid>,
    #[serde(default)]
    pub module_order: Vec<Nid>,
}
