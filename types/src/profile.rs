//! Organization profile records.
//!
//! These are static facts edited by hand in a TOML file; nothing here mutates
//! them after load.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrganizationKind {
    Nonprofit,
    Company,
}

impl OrganizationKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Nonprofit => "Nonprofit",
            Self::Company => "Company",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringEvent {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Free-form cadence ("monthly", "every spring").
    pub schedule: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    /// Short stable key referenced by [`Channel::owner`].
    pub id: String,
    pub name: String,
    pub kind: OrganizationKind,
    pub founded: Option<i32>,
    pub representative: Option<String>,
    pub address: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub events: Vec<RecurringEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    #[serde(alias = "twitter")]
    X,
    Note,
    Line,
}

impl Platform {
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Instagram => "Instagram",
            Self::X => "X",
            Self::Note => "note",
            Self::Line => "LINE",
        }
    }
}

/// A planned SNS channel and the content style intended for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub platform: Platform,
    pub handle: Option<String>,
    #[serde(default)]
    pub style: String,
    pub cadence: Option<String>,
    pub owner: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default, rename = "organization")]
    pub organizations: Vec<Organization>,
    #[serde(default, rename = "channel")]
    pub channels: Vec<Channel>,
    #[serde(default)]
    pub glossary: BTreeMap<String, String>,
}

impl Profile {
    #[must_use]
    pub fn organization(&self, id: &str) -> Option<&Organization> {
        self.organizations.iter().find(|org| org.id == id)
    }
}
