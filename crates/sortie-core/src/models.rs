//! Domain models for Sortie
//!
//! Identities hold permission grants, optionally belong to one community, and
//! create missions. Missions carry exactly one [`Visibility`] which, together
//! with ownership and community affiliation, decides who may list them.

use crate::error::{Result, SortieError};
use crate::ids::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Identity & Community Models
// =============================================================================

/// Identity represents a registered principal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub uid: UserId,
    pub nickname: String,
    /// Set when joining a community, cleared on leave
    pub community_uid: Option<CommunityId>,
    pub active: bool,
    /// Raw grant strings as stored; parsing and matching happen at check time
    #[serde(default)]
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Community represents a named group of identities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    pub uid: CommunityId,
    pub name: String,
    pub tag: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Mission Models
// =============================================================================

/// Resource-level disclosure scope of a mission
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Listed for everyone, including anonymous callers
    Public,
    /// Only the creator and mission editors
    Hidden,
    /// Members of the mission's community
    Community,
    /// Only the creator
    Private,
}

impl Visibility {
    pub const ALL: [Visibility; 4] = [
        Visibility::Public,
        Visibility::Hidden,
        Visibility::Community,
        Visibility::Private,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Hidden => "hidden",
            Self::Community => "community",
            Self::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Visibility {
    type Err = SortieError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "public" => Ok(Self::Public),
            "hidden" => Ok(Self::Hidden),
            "community" => Ok(Self::Community),
            "private" => Ok(Self::Private),
            other => Err(SortieError::invalid_input(format!(
                "unknown visibility '{}'",
                other
            ))),
        }
    }
}

/// Returns true if `segment` is a non-empty run of ASCII letters, digits and hyphens.
///
/// This is the shape of every concrete segment in a permission string and of
/// every mission slug.
pub fn is_permission_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

/// URL-safe mission slug, usable as a single permission segment
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MissionSlug(String);

impl MissionSlug {
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if is_permission_segment(&value) {
            Ok(Self(value))
        } else {
            Err(SortieError::invalid_input(format!(
                "mission slug '{}' must consist of ASCII letters, digits and hyphens",
                value
            )))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MissionSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MissionSlug {
    type Err = SortieError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MissionSlug {
    type Error = SortieError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<MissionSlug> for String {
    fn from(slug: MissionSlug) -> Self {
        slug.0
    }
}

/// Mission is the shared resource collection whose listing is visibility-filtered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mission {
    pub uid: MissionId,
    pub slug: MissionSlug,
    pub title: String,
    pub creator_uid: UserId,
    pub community_uid: Option<CommunityId>,
    pub visibility: Visibility,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}
