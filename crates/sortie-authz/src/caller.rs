//! Caller identity as seen by the engine
//!
//! The boundary authenticates the request, then either builds a
//! [`CallerContext`] from its own credential fields or asks a
//! [`CallerResolver`] to load grants and membership from the stores.

use std::sync::Arc;
use tracing::{debug, instrument, warn};

use sortie_core::{CommunityId, GrantStore, MembershipStore, Result, SortieError, UserId};

use crate::permission::{GrantSet, Permission};

static NO_GRANTS: GrantSet = GrantSet::empty();

/// Who is asking
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallerContext {
    Anonymous,
    Authenticated(AuthenticatedCaller),
}

/// A signed-in caller with a consistent snapshot of grants and membership
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedCaller {
    pub uid: UserId,
    pub community_uid: Option<CommunityId>,
    pub grants: GrantSet,
}

impl CallerContext {
    pub fn anonymous() -> Self {
        Self::Anonymous
    }

    pub fn authenticated(
        uid: UserId,
        community_uid: Option<CommunityId>,
        grants: GrantSet,
    ) -> Self {
        Self::Authenticated(AuthenticatedCaller {
            uid,
            community_uid,
            grants,
        })
    }

    /// Build a context from raw boundary credential fields.
    ///
    /// An authenticated request without a uid is a bug in the boundary: debug
    /// builds panic, release builds deny with [`SortieError::InvalidCaller`].
    pub fn from_credentials(
        is_authenticated: bool,
        uid: Option<UserId>,
        community_uid: Option<CommunityId>,
        grants: GrantSet,
    ) -> Result<Self> {
        if !is_authenticated {
            return Ok(Self::Anonymous);
        }
        match uid {
            Some(uid) => Ok(Self::authenticated(uid, community_uid, grants)),
            None => {
                if cfg!(debug_assertions) {
                    panic!("authenticated caller context without a uid");
                }
                Err(SortieError::invalid_caller(
                    "authenticated caller context without a uid",
                ))
            }
        }
    }

    pub fn uid(&self) -> Option<UserId> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(caller) => Some(caller.uid),
        }
    }

    pub fn community_uid(&self) -> Option<CommunityId> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(caller) => caller.community_uid,
        }
    }

    /// Held grants; empty for anonymous callers
    pub fn grants(&self) -> &GrantSet {
        match self {
            Self::Anonymous => &NO_GRANTS,
            Self::Authenticated(caller) => &caller.grants,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    pub fn satisfies(&self, required: &Permission) -> bool {
        self.grants().satisfies(required)
    }
}

// =============================================================================
// Resolution from Stores
// =============================================================================

/// Loads caller and target snapshots from the grant and membership stores
#[derive(Clone)]
pub struct CallerResolver {
    grants: Arc<dyn GrantStore>,
    membership: Arc<dyn MembershipStore>,
}

impl CallerResolver {
    pub fn new(grants: Arc<dyn GrantStore>, membership: Arc<dyn MembershipStore>) -> Self {
        Self { grants, membership }
    }

    /// Resolve the caller for an optionally authenticated request
    #[instrument(skip(self))]
    pub async fn resolve(&self, uid: Option<UserId>) -> Result<CallerContext> {
        let Some(uid) = uid else {
            debug!("Resolved anonymous caller");
            return Ok(CallerContext::Anonymous);
        };

        let grants = self.grants_of(uid).await?;
        let community_uid = self.membership.community_of(uid).await?;

        debug!(
            %uid,
            grants = grants.len(),
            community = ?community_uid,
            "Resolved authenticated caller"
        );

        Ok(CallerContext::authenticated(uid, community_uid, grants))
    }

    /// Grant snapshot of an existing identity, e.g. the target of a modify or delete
    #[instrument(skip(self))]
    pub async fn grants_of(&self, uid: UserId) -> Result<GrantSet> {
        let raw = self
            .grants
            .grants_for(uid)
            .await?
            .ok_or_else(|| SortieError::not_found(UserId::KIND, uid.to_string()))?;

        let grants = GrantSet::from_raw(raw);
        if !grants.rejected().is_empty() {
            warn!(
                %uid,
                rejected = ?grants.rejected(),
                "Ignoring malformed permission grants"
            );
        }
        Ok(grants)
    }
}
