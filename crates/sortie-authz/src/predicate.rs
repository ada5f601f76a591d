//! Storage-independent filter predicates over missions
//!
//! A [`Predicate`] is an immutable boolean expression tree. The visibility
//! builder produces one, the data-access layer translates it into a query, and
//! [`Predicate::matches`] evaluates it in memory against a [`Mission`].
//!
//! The `and`/`or` constructors fold constants and flatten nested nodes of the
//! same kind, so the trees handed to a translator stay small.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use sortie_core::{CommunityId, Mission, MissionSlug, UserId, Visibility};

use crate::permission::GrantSet;

// =============================================================================
// Editor Scope
// =============================================================================

/// The missions a caller may edit, derived from their grant snapshot
///
/// Folding the grants into slugs up front lets a store pre-filter on the
/// mission slug column instead of joining against the grant table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorScope {
    None,
    AllMissions,
    Slugs(BTreeSet<MissionSlug>),
}

impl EditorScope {
    /// Derive the scope of `mission.<slug>.editor` requirements the grants authorize
    pub fn from_grants(grants: &GrantSet) -> Self {
        let mut slugs = BTreeSet::new();

        for grant in grants.iter() {
            let prefix = grant.prefix();
            match prefix.len() {
                // `*`
                0 => return Self::AllMissions,
                // `mission` or `mission.*`
                1 if prefix[0] == "mission" => return Self::AllMissions,
                // `mission.<slug>` or `mission.<slug>.*`
                2 if prefix[0] == "mission" => {
                    if let Ok(slug) = MissionSlug::parse(prefix[1].as_str()) {
                        slugs.insert(slug);
                    }
                }
                // `mission.<slug>.editor`
                3 if prefix[0] == "mission" && prefix[2] == "editor" && !grant.is_wildcard() => {
                    if let Ok(slug) = MissionSlug::parse(prefix[1].as_str()) {
                        slugs.insert(slug);
                    }
                }
                _ => {}
            }
        }

        if slugs.is_empty() {
            Self::None
        } else {
            Self::Slugs(slugs)
        }
    }

    /// Whether the scope includes the mission with `slug`
    pub fn covers(&self, slug: &MissionSlug) -> bool {
        match self {
            Self::None => false,
            Self::AllMissions => true,
            Self::Slugs(slugs) => slugs.contains(slug),
        }
    }
}

// =============================================================================
// Predicate Tree
// =============================================================================

/// Boolean filter expression over mission attributes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
pub enum Predicate {
    True,
    False,
    VisibilityIs(Visibility),
    CreatorIs(UserId),
    CommunityIs(CommunityId),
    /// The caller holds `mission.<slug>.editor` for the row's slug
    EditorOf(EditorScope),
    /// `end_time` is strictly after the instant
    EndsAfter(DateTime<Utc>),
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    pub fn visibility_is(visibility: Visibility) -> Self {
        Self::VisibilityIs(visibility)
    }

    pub fn creator_is(uid: UserId) -> Self {
        Self::CreatorIs(uid)
    }

    pub fn community_is(uid: CommunityId) -> Self {
        Self::CommunityIs(uid)
    }

    pub fn ends_after(instant: DateTime<Utc>) -> Self {
        Self::EndsAfter(instant)
    }

    /// Editor leaf, folded to a constant when the scope is trivial
    pub fn editor_of(scope: EditorScope) -> Self {
        match scope {
            EditorScope::None => Self::False,
            EditorScope::AllMissions => Self::True,
            EditorScope::Slugs(slugs) if slugs.is_empty() => Self::False,
            scope => Self::EditorOf(scope),
        }
    }

    /// Conjunction; empty is `True`
    pub fn and(parts: impl IntoIterator<Item = Predicate>) -> Self {
        let mut terms = Vec::new();
        for part in parts {
            match part {
                Self::True => {}
                Self::False => return Self::False,
                Self::And(nested) => terms.extend(nested),
                other => terms.push(other),
            }
        }
        match terms.len() {
            0 => Self::True,
            1 => terms.remove(0),
            _ => Self::And(terms),
        }
    }

    /// Disjunction; empty is `False`
    pub fn or(parts: impl IntoIterator<Item = Predicate>) -> Self {
        let mut terms = Vec::new();
        for part in parts {
            match part {
                Self::False => {}
                Self::True => return Self::True,
                Self::Or(nested) => terms.extend(nested),
                other => terms.push(other),
            }
        }
        match terms.len() {
            0 => Self::False,
            1 => terms.remove(0),
            _ => Self::Or(terms),
        }
    }

    /// Evaluate against a single mission
    pub fn matches(&self, mission: &Mission) -> bool {
        match self {
            Self::True => true,
            Self::False => false,
            Self::VisibilityIs(visibility) => mission.visibility == *visibility,
            Self::CreatorIs(uid) => mission.creator_uid == *uid,
            Self::CommunityIs(uid) => mission.community_uid == Some(*uid),
            Self::EditorOf(scope) => scope.covers(&mission.slug),
            Self::EndsAfter(instant) => mission.end_time > *instant,
            Self::And(terms) => terms.iter().all(|t| t.matches(mission)),
            Self::Or(terms) => terms.iter().any(|t| t.matches(mission)),
        }
    }

    /// Keep the missions this predicate admits
    pub fn filter<'a>(&'a self, missions: &'a [Mission]) -> impl Iterator<Item = &'a Mission> + 'a {
        missions.iter().filter(move |m| self.matches(m))
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => f.write_str("true"),
            Self::False => f.write_str("false"),
            Self::VisibilityIs(visibility) => write!(f, "visibility = {}", visibility),
            Self::CreatorIs(uid) => write!(f, "creator = {}", uid),
            Self::CommunityIs(uid) => write!(f, "community = {}", uid),
            Self::EditorOf(EditorScope::None) => f.write_str("editor of none"),
            Self::EditorOf(EditorScope::AllMissions) => f.write_str("editor of any"),
            Self::EditorOf(EditorScope::Slugs(slugs)) => {
                let slugs: Vec<&str> = slugs.iter().map(MissionSlug::as_str).collect();
                write!(f, "slug in [{}]", slugs.join(", "))
            }
            Self::EndsAfter(instant) => write!(f, "end_time > {}", instant.to_rfc3339()),
            Self::And(terms) => write_joined(f, terms, " AND "),
            Self::Or(terms) => write_joined(f, terms, " OR "),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, terms: &[Predicate], separator: &str) -> fmt::Result {
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        match term {
            Predicate::And(_) | Predicate::Or(_) => write!(f, "({})", term)?,
            _ => write!(f, "{}", term)?,
        }
    }
    Ok(())
}
