//! Hierarchical permission matching
//!
//! Permissions are dot-delimited strings such as `admin.user` or
//! `mission.alpha.editor`. A held [`Grant`] authorizes a required
//! [`Permission`] when it is equal to it, when it is a dot-prefix of it
//! (`admin` authorizes `admin.user`), or when it ends in the `*` wildcard
//! segment and its concrete part is a prefix of the requirement with at least
//! one segment left over (`mission.*` authorizes `mission.alpha.editor`).
//! The lone grant `*` authorizes everything.
//!
//! Specificity only flows downward: `admin.user.extra` does not authorize
//! `admin.user`.
//!
//! Malformed grants are kept out of matching entirely so that a corrupted
//! store can never widen access. [`GrantSet`] remembers the rejected raw
//! strings so the boundary can report them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use sortie_core::{is_permission_segment, MissionSlug, Result, SortieError};

/// Segment separator
pub const SEPARATOR: char = '.';

/// Full-segment wildcard, valid only as a grant's final segment
pub const WILDCARD: &str = "*";

/// Root of all administrative permissions
pub const ADMIN: &str = "admin";

/// May act on other administrators
pub const ADMIN_SUPERADMIN: &str = "admin.superadmin";

/// May manage identities and see their administrative details
pub const ADMIN_USER: &str = "admin.user";

// =============================================================================
// Required Permission
// =============================================================================

/// A concrete permission an action demands
///
/// Every segment is a non-empty run of ASCII letters, digits and hyphens.
/// Wildcards are not allowed in requirements.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permission(String);

impl Permission {
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(SortieError::invalid_permission(value, "empty permission"));
        }
        if let Some(segment) = value.split(SEPARATOR).find(|s| !is_permission_segment(s)) {
            let reason = if segment.is_empty() {
                "empty segment".to_string()
            } else if segment == WILDCARD {
                "wildcards are not allowed in a required permission".to_string()
            } else {
                format!("invalid segment '{}'", segment)
            };
            return Err(SortieError::invalid_permission(value, reason));
        }
        Ok(Self(value))
    }

    /// `admin`
    pub fn admin() -> Self {
        Self(ADMIN.to_string())
    }

    /// `admin.superadmin`
    pub fn superadmin() -> Self {
        Self(ADMIN_SUPERADMIN.to_string())
    }

    /// `admin.user`
    pub fn user_admin() -> Self {
        Self(ADMIN_USER.to_string())
    }

    /// `mission.<slug>.editor`
    pub fn mission_editor(slug: &MissionSlug) -> Self {
        Self(format!("mission{SEPARATOR}{slug}{SEPARATOR}editor"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Permission {
    type Err = SortieError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Permission {
    type Error = SortieError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<Permission> for String {
    fn from(permission: Permission) -> Self {
        permission.0
    }
}

// =============================================================================
// Held Grant
// =============================================================================

/// A permission grant held by an identity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Grant {
    raw: String,
    /// Concrete leading segments
    prefix: Vec<String>,
    /// Whether the grant ends in `*`
    wildcard: bool,
}

impl Grant {
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let raw = value.into();
        if raw.is_empty() {
            return Err(SortieError::invalid_permission(raw, "empty grant"));
        }

        let segments: Vec<&str> = raw.split(SEPARATOR).collect();
        let last = segments.len() - 1;
        let mut prefix = Vec::with_capacity(segments.len());
        let mut wildcard = false;

        for (i, segment) in segments.iter().enumerate() {
            if *segment == WILDCARD {
                if i != last {
                    return Err(SortieError::invalid_permission(
                        raw.clone(),
                        "wildcard must be the final segment",
                    ));
                }
                wildcard = true;
            } else if is_permission_segment(segment) {
                prefix.push((*segment).to_string());
            } else if segment.is_empty() {
                return Err(SortieError::invalid_permission(raw.clone(), "empty segment"));
            } else {
                return Err(SortieError::invalid_permission(
                    raw.clone(),
                    format!("invalid segment '{}'", segment),
                ));
            }
        }

        Ok(Self {
            raw,
            prefix,
            wildcard,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The concrete segments before any trailing wildcard
    pub fn prefix(&self) -> &[String] {
        &self.prefix
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// The lone `*` grant, which authorizes every requirement
    pub fn is_unconditional(&self) -> bool {
        self.wildcard && self.prefix.is_empty()
    }

    /// Whether this grant authorizes `required`
    pub fn matches(&self, required: &Permission) -> bool {
        let mut remaining = required.segments();
        for granted in &self.prefix {
            match remaining.next() {
                Some(segment) if segment == granted => {}
                _ => return false,
            }
        }
        // A wildcard covers at least one more segment
        !self.wildcard || remaining.next().is_some()
    }

    /// Whether this grant names `required` itself rather than an ancestor of it
    ///
    /// Exact grants must be equal to the requirement; wildcard grants match as
    /// in [`matches`](Self::matches). `admin` does not explicitly cover
    /// `admin.superadmin`, but `admin.*` and `*` do.
    pub fn covers_explicitly(&self, required: &Permission) -> bool {
        if self.wildcard {
            return self.matches(required);
        }
        self.prefix.iter().map(String::as_str).eq(required.segments())
    }
}

impl fmt::Display for Grant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Grant {
    type Err = SortieError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// =============================================================================
// Grant Set
// =============================================================================

/// The grants held by one identity, parsed once per snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantSet {
    grants: Vec<Grant>,
    rejected: Vec<String>,
}

impl GrantSet {
    pub const fn empty() -> Self {
        Self {
            grants: Vec::new(),
            rejected: Vec::new(),
        }
    }

    /// Parse raw grant strings; malformed ones are set aside and never match
    pub fn from_raw<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = Self::empty();
        for value in raw {
            let value = value.into();
            match Grant::parse(value.as_str()) {
                Ok(grant) => {
                    if !set.grants.contains(&grant) {
                        set.grants.push(grant);
                    }
                }
                Err(_) => set.rejected.push(value),
            }
        }
        set
    }

    /// Whether any held grant authorizes `required`
    pub fn satisfies(&self, required: &Permission) -> bool {
        self.grants.iter().any(|grant| grant.matches(required))
    }

    /// Whether any held grant explicitly covers `required`, see [`Grant::covers_explicitly`]
    pub fn covers_explicitly(&self, required: &Permission) -> bool {
        self.grants.iter().any(|grant| grant.covers_explicitly(required))
    }

    /// Like [`satisfies`](Self::satisfies) for an unparsed requirement.
    ///
    /// A malformed requirement is never satisfied.
    pub fn satisfies_str(&self, required: &str) -> bool {
        match Permission::parse(required) {
            Ok(required) => self.satisfies(&required),
            Err(_) => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Grant> {
        self.grants.iter()
    }

    /// Raw strings that failed to parse
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for GrantSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::from_raw(iter)
    }
}

/// Whether any of `held` authorizes `required`.
///
/// Total over arbitrary strings: malformed grants never match and a malformed
/// requirement is never satisfied.
pub fn satisfies<I, S>(held: I, required: &str) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let Ok(required) = Permission::parse(required) else {
        return false;
    };
    held.into_iter()
        .filter_map(|raw| Grant::parse(raw.as_ref()).ok())
        .any(|grant| grant.matches(&required))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: [&str; 0] = [];

    #[test]
    fn test_empty_grants_never_satisfy() {
        assert!(!satisfies(NONE, "admin"));
        assert!(!satisfies(NONE, "mission.alpha.editor"));
        assert!(!GrantSet::empty().satisfies(&Permission::admin()));
    }

    #[test]
    fn test_exact_match() {
        assert!(satisfies(["admin"], "admin"));
        assert!(satisfies(["admin.user"], "admin.user"));
    }

    #[test]
    fn test_shorter_grant_is_prefix() {
        for grant in ["a", "a.b", "a.b.c"] {
            assert!(satisfies([grant], "a.b.c"), "{grant} should satisfy a.b.c");
        }
    }

    #[test]
    fn test_longer_grant_never_matches() {
        assert!(!satisfies(["a.b.c.d"], "a.b.c"));
        assert!(!satisfies(["admin.user.extra"], "admin.user"));
    }

    #[test]
    fn test_divergent_segment() {
        assert!(!satisfies(["a.x"], "a.b.c"));
        assert!(!satisfies(["mission.bravo.editor"], "mission.alpha.editor"));
    }

    #[test]
    fn test_prefix_is_segment_wise_not_textual() {
        assert!(!satisfies(["adm"], "admin"));
        assert!(!satisfies(["admin"], "administrator.user"));
    }

    #[test]
    fn test_full_wildcard() {
        assert!(satisfies(["*"], "admin"));
        assert!(satisfies(["*"], "admin.superadmin"));
        assert!(satisfies(["*"], "mission.alpha.editor"));
    }

    #[test]
    fn test_trailing_wildcard() {
        assert!(satisfies(["mission.*"], "mission.alpha.editor"));
        assert!(satisfies(["mission.alpha.*"], "mission.alpha.editor"));
        assert!(!satisfies(["mission.*"], "mission"));
        assert!(!satisfies(["mission.*"], "admin.user"));
    }

    #[test]
    fn test_case_sensitive_and_untrimmed() {
        assert!(!satisfies(["Admin"], "admin"));
        assert!(!satisfies([" admin"], "admin"));
        assert!(!satisfies(["admin "], "admin"));
    }

    #[test]
    fn test_malformed_grants_fail_closed() {
        assert!(!satisfies(["admin..user"], "admin.user"));
        assert!(!satisfies(["*.user"], "admin.user"));
        assert!(!satisfies(["admin.*.editor"], "admin.x.editor"));
        assert!(!satisfies([""], "admin"));
        assert!(!satisfies(["."], "admin"));
        assert!(!satisfies(["admin."], "admin.user"));
    }

    #[test]
    fn test_malformed_requirement_never_satisfied() {
        assert!(!satisfies(["*"], ""));
        assert!(!satisfies(["*"], "admin..user"));
        assert!(!satisfies(["*"], "mission.*"));
    }

    #[test]
    fn test_one_good_grant_among_malformed() {
        assert!(satisfies(["admin..user", "admin"], "admin.user"));
    }

    #[test]
    fn test_grant_set_records_rejected() {
        let set = GrantSet::from_raw(["admin", "admin..user", "*.x", "admin"]);
        assert_eq!(set.len(), 1);
        assert_eq!(set.rejected(), &["admin..user".to_string(), "*.x".to_string()]);
        assert!(set.satisfies_str("admin.superadmin"));
        assert!(!set.satisfies_str("admin..superadmin"));
    }

    #[test]
    fn test_permission_parse_errors() {
        assert!(Permission::parse("").is_err());
        assert!(Permission::parse("admin.").is_err());
        assert!(Permission::parse("admin.*").is_err());
        assert!(Permission::parse("admin user").is_err());
        assert_eq!(Permission::parse("admin.user").unwrap(), Permission::user_admin());
    }

    #[test]
    fn test_mission_editor_permission() {
        let slug = MissionSlug::parse("alpha-strike").unwrap();
        assert_eq!(
            Permission::mission_editor(&slug).as_str(),
            "mission.alpha-strike.editor"
        );
    }

    #[test]
    fn test_grant_shape() {
        let grant = Grant::parse("*").unwrap();
        assert!(grant.is_unconditional());

        let grant = Grant::parse("mission.alpha.*").unwrap();
        assert!(grant.is_wildcard());
        assert!(!grant.is_unconditional());
        assert_eq!(grant.prefix(), &["mission".to_string(), "alpha".to_string()]);
    }

    #[test]
    fn test_explicit_coverage_ignores_ancestors() {
        let superadmin = Permission::superadmin();
        assert!(Grant::parse("admin").unwrap().matches(&superadmin));
        assert!(!Grant::parse("admin").unwrap().covers_explicitly(&superadmin));

        assert!(Grant::parse("admin.superadmin").unwrap().covers_explicitly(&superadmin));
        assert!(Grant::parse("admin.*").unwrap().covers_explicitly(&superadmin));
        assert!(Grant::parse("*").unwrap().covers_explicitly(&superadmin));
        assert!(!Grant::parse("admin.superadmin.*").unwrap().covers_explicitly(&superadmin));
        assert!(!Grant::parse("admin.superadmin.x").unwrap().covers_explicitly(&superadmin));
    }

    #[test]
    fn test_grant_set_explicit_coverage() {
        let superadmin = Permission::superadmin();
        assert!(!GrantSet::from_raw(["admin", "admin.user"]).covers_explicitly(&superadmin));
        assert!(GrantSet::from_raw(["admin", "admin.superadmin"]).covers_explicitly(&superadmin));
        assert!(!GrantSet::empty().covers_explicitly(&superadmin));
    }
}
