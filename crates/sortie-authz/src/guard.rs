//! Escalation guard for actions on other identities
//!
//! Administrators may manage identities, but only a superadmin may modify or
//! delete another administrator. The guard is only that veto. The baseline
//! capability (`admin.user`) is a separate check, and
//! [`decide_identity_action`] combines the two as
//! `has_capability AND NOT vetoed`.

use serde::{Deserialize, Serialize};
use std::fmt;

use sortie_core::{Result, SortieError};

use crate::caller::CallerContext;
use crate::permission::{GrantSet, Permission};

/// Protected action on another identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityAction {
    Modify,
    Delete,
}

impl IdentityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Modify => "modify",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for IdentityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Escalation veto: false when a non-superadmin acts on an administrator
///
/// Any grant that implies `admin` makes the target an administrator. The
/// actor only counts as a superadmin when a grant names `admin.superadmin`
/// explicitly; the plain `admin` grant implies it by prefix but does not
/// lift the veto.
pub fn may_act_on_identity(actor: &GrantSet, target: &GrantSet, _action: IdentityAction) -> bool {
    !(target.satisfies(&Permission::admin()) && !actor.covers_explicitly(&Permission::superadmin()))
}

/// Outcome of the combined capability and escalation checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDecision {
    Allowed,
    /// Actor lacks `admin.user`
    MissingCapability,
    /// Target is an administrator and the actor is not a superadmin
    EscalationVeto,
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Combine the baseline capability with the escalation veto
pub fn decide_identity_action(
    actor: &GrantSet,
    target: &GrantSet,
    action: IdentityAction,
) -> AccessDecision {
    if !actor.satisfies(&Permission::user_admin()) {
        AccessDecision::MissingCapability
    } else if !may_act_on_identity(actor, target, action) {
        AccessDecision::EscalationVeto
    } else {
        AccessDecision::Allowed
    }
}

/// [`decide_identity_action`] as a `Result` for the request boundary
pub fn authorize_identity_action(
    actor: &GrantSet,
    target: &GrantSet,
    action: IdentityAction,
) -> Result<()> {
    match decide_identity_action(actor, target, action) {
        AccessDecision::Allowed => Ok(()),
        AccessDecision::MissingCapability => Err(SortieError::permission_denied(
            action.as_str(),
            format!("identity (requires {})", Permission::user_admin()),
        )),
        AccessDecision::EscalationVeto => Err(SortieError::permission_denied(
            action.as_str(),
            format!("administrator identity (requires {})", Permission::superadmin()),
        )),
    }
}

/// Whether listings and detail views may include administrative fields
pub fn may_view_admin_details(caller: &CallerContext) -> bool {
    caller.is_authenticated() && caller.satisfies(&Permission::user_admin())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grants(raw: &[&str]) -> GrantSet {
        GrantSet::from_raw(raw.iter().copied())
    }

    #[test]
    fn test_admin_cannot_act_on_admin() {
        let actor = grants(&["admin"]);
        let target = grants(&["admin"]);
        assert!(!may_act_on_identity(&actor, &target, IdentityAction::Modify));
        assert!(!may_act_on_identity(&actor, &target, IdentityAction::Delete));
    }

    #[test]
    fn test_superadmin_can_act_on_admin() {
        let actor = grants(&["admin.superadmin"]);
        let target = grants(&["admin"]);
        assert!(may_act_on_identity(&actor, &target, IdentityAction::Modify));
        assert!(may_act_on_identity(&actor, &target, IdentityAction::Delete));
    }

    #[test]
    fn test_target_with_sub_admin_grant_is_not_admin() {
        // `admin.user` does not imply `admin`
        let actor = grants(&["admin.user"]);
        let target = grants(&["admin.user"]);
        assert!(may_act_on_identity(&actor, &target, IdentityAction::Modify));
    }

    #[test]
    fn test_wildcard_target_is_admin() {
        let actor = grants(&["admin"]);
        let target = grants(&["*"]);
        assert!(!may_act_on_identity(&actor, &target, IdentityAction::Delete));

        let actor = grants(&["*"]);
        assert!(may_act_on_identity(&actor, &target, IdentityAction::Delete));
    }

    #[test]
    fn test_admin_wildcard_counts_as_superadmin() {
        let target = grants(&["admin"]);
        assert!(may_act_on_identity(&grants(&["admin.*"]), &target, IdentityAction::Modify));
        assert!(!may_act_on_identity(
            &grants(&["admin", "admin.user"]),
            &target,
            IdentityAction::Modify
        ));
    }

    #[test]
    fn test_ordinary_target_is_never_vetoed() {
        let target = grants(&["mission.alpha.editor"]);
        assert!(may_act_on_identity(&GrantSet::empty(), &target, IdentityAction::Modify));
    }

    #[test]
    fn test_decision_reports_missing_capability_first() {
        let decision = decide_identity_action(
            &grants(&["mission.*"]),
            &grants(&["admin"]),
            IdentityAction::Modify,
        );
        assert_eq!(decision, AccessDecision::MissingCapability);
    }

    #[test]
    fn test_decision_veto_for_plain_admin() {
        let decision =
            decide_identity_action(&grants(&["admin"]), &grants(&["admin"]), IdentityAction::Delete);
        assert_eq!(decision, AccessDecision::EscalationVeto);

        let err = authorize_identity_action(&grants(&["admin"]), &grants(&["admin"]), IdentityAction::Delete)
            .unwrap_err();
        assert!(err.is_forbidden());
        assert!(err.to_string().contains("admin.superadmin"));
    }

    #[test]
    fn test_decision_allows_user_admin_on_member() {
        let decision = decide_identity_action(
            &grants(&["admin.user"]),
            &grants(&["mission.alpha.editor"]),
            IdentityAction::Modify,
        );
        assert!(decision.is_allowed());
        assert!(authorize_identity_action(
            &grants(&["admin"]),
            &GrantSet::empty(),
            IdentityAction::Delete
        )
        .is_ok());
    }
}
