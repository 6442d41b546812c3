//! Catalog entities and their version slots

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Independent version slot on an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VersionKind {
    Current,
    Lts,
    Edition,
    Standard,
    LivingStandard,
}

impl VersionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionKind::Current => "current",
            VersionKind::Lts => "lts",
            VersionKind::Edition => "edition",
            VersionKind::Standard => "standard",
            VersionKind::LivingStandard => "livingStandard",
        }
    }
}

impl std::fmt::Display for VersionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VersionKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "current" => Ok(VersionKind::Current),
            "lts" => Ok(VersionKind::Lts),
            "edition" => Ok(VersionKind::Edition),
            "standard" => Ok(VersionKind::Standard),
            "livingStandard" => Ok(VersionKind::LivingStandard),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionRecord {
    pub kind: VersionKind,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_of_support: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support_duration_months: Option<u32>,
}

impl VersionRecord {
    pub fn new(kind: VersionKind, label: &str, release_date: Option<DateTime<Utc>>) -> Self {
        Self {
            kind,
            label: label.to_string(),
            release_date,
            end_of_support: None,
            support_duration_months: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntity {
    pub name: String,
    pub versions: Vec<VersionRecord>,
}

impl CatalogEntity {
    pub fn version(&self, kind: VersionKind) -> Option<&VersionRecord> {
        self.versions.iter().find(|v| v.kind == kind)
    }
}
