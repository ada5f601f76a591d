//! Collaborator traits consumed by the authorization engine
//!
//! The engine never reads storage itself. The boundary resolves snapshots of
//! grants and community membership through these traits and hands them to the
//! pure checks in `sortie-authz`.

use crate::{error::Result, ids::*};
use async_trait::async_trait;

// =============================================================================
// Grant & Membership Lookups
// =============================================================================

/// Read access to the permission grants held by identities
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// Current grant strings of an identity, or `None` if the identity does not exist
    async fn grants_for(&self, uid: UserId) -> Result<Option<Vec<String>>>;
}

/// Read access to community membership
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Community the identity currently belongs to, if any
    async fn community_of(&self, uid: UserId) -> Result<Option<CommunityId>>;
}
