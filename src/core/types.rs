//! Core data types for RaptorAlloc.

use std::borrow::Borrow;
use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Investor risk tier (e.g. Aggressive, Moderate, Conservative).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Profile(String);

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Profile {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Profile {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Stable identifier of an asset class or sub-class (e.g. `fixed_income`).
///
/// Identifiers are never derived from display labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(String);

impl ClassId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ClassId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ClassId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Percentage-point weights keyed by class (baselines and active weights).
pub type Weights = IndexMap<ClassId, f64>;

/// Per-profile tilt sensitivity. Key order defines the profile order.
pub type Multipliers = IndexMap<Profile, f64>;

/// Level-1 table: class -> one percentage per profile, aligned to profile order.
pub type ProfileTable = IndexMap<ClassId, Vec<f64>>;

/// Display labels keyed by stable id.
pub type Labels = IndexMap<ClassId, String>;

/// Kind of value held by a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AllocationType {
    /// Long-run baseline.
    Strategic,
    /// Baseline plus active-weight tilt.
    Tactical,
    /// Tactical minus strategic.
    Difference,
}

impl AllocationType {
    pub fn as_str(self) -> &'static str {
        match self {
            AllocationType::Strategic => "Strategic",
            AllocationType::Tactical => "Tactical",
            AllocationType::Difference => "Difference",
        }
    }
}

impl fmt::Display for AllocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column key of an allocation grid: (Profile, Type).
///
/// Level-2 tables are not profile-specific and use `profile: None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnKey {
    pub profile: Option<Profile>,
    pub kind: AllocationType,
}

impl ColumnKey {
    pub fn new(profile: Option<Profile>, kind: AllocationType) -> Self {
        Self { profile, kind }
    }

    /// Column for a specific profile.
    pub fn profiled(profile: &Profile, kind: AllocationType) -> Self {
        Self::new(Some(profile.clone()), kind)
    }

    /// Column without a profile (level-2 tables).
    pub fn unprofiled(kind: AllocationType) -> Self {
        Self::new(None, kind)
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.profile {
            Some(profile) => write!(f, "{}/{}", profile, self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Hierarchy level of a table row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowLevel {
    /// Top-level asset class.
    Class,
    /// Sub-class nested under a top-level class.
    SubClass,
}

/// Row header of an allocation grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowKey {
    pub id: ClassId,
    pub label: String,
    pub level: RowLevel,
    /// Parent class for sub-class rows.
    pub parent: Option<ClassId>,
}

impl RowKey {
    pub fn class(id: ClassId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            level: RowLevel::Class,
            parent: None,
        }
    }

    pub fn sub_class(id: ClassId, label: impl Into<String>, parent: ClassId) -> Self {
        Self {
            id,
            label: label.into(),
            level: RowLevel::SubClass,
            parent: Some(parent),
        }
    }

    #[inline]
    pub fn is_class(&self) -> bool {
        self.level == RowLevel::Class
    }
}

/// Resolve the display label for an id, falling back to the id itself.
pub fn label_for(labels: &Labels, id: &ClassId) -> String {
    labels
        .get(id)
        .cloned()
        .unwrap_or_else(|| id.as_str().to_string())
}
