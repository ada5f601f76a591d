//! In-memory grant and membership directory
//!
//! Backs [`CallerResolver`](crate::CallerResolver) in tests and fixtures.
//! Revocation deletes a grant; removing an identity drops all of its grants.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use sortie_core::{CommunityId, GrantStore, MembershipStore, Result, SortieError, UserId};

#[derive(Debug, Clone, Default)]
struct DirectoryEntry {
    grants: Vec<String>,
    community_uid: Option<CommunityId>,
}

/// Identity directory held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryDirectory {
    entries: Arc<RwLock<HashMap<UserId, DirectoryEntry>>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an identity, replacing any previous entry
    pub async fn insert_identity<I, S>(
        &self,
        uid: UserId,
        community_uid: Option<CommunityId>,
        grants: I,
    ) where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = DirectoryEntry {
            grants: grants.into_iter().map(Into::into).collect(),
            community_uid,
        };
        self.entries.write().await.insert(uid, entry);
    }

    /// Remove an identity together with its grants
    pub async fn remove_identity(&self, uid: UserId) -> bool {
        self.entries.write().await.remove(&uid).is_some()
    }

    pub async fn grant(&self, uid: UserId, permission: impl Into<String>) -> Result<()> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(&uid)
            .ok_or_else(|| SortieError::not_found(UserId::KIND, uid.to_string()))?;
        let permission = permission.into();
        if !entry.grants.contains(&permission) {
            entry.grants.push(permission);
        }
        Ok(())
    }

    /// Returns whether the grant was held
    pub async fn revoke(&self, uid: UserId, permission: &str) -> Result<bool> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(&uid)
            .ok_or_else(|| SortieError::not_found(UserId::KIND, uid.to_string()))?;
        let before = entry.grants.len();
        entry.grants.retain(|g| g != permission);
        Ok(entry.grants.len() != before)
    }

    pub async fn join_community(&self, uid: UserId, community_uid: CommunityId) -> Result<()> {
        self.set_community(uid, Some(community_uid)).await
    }

    pub async fn leave_community(&self, uid: UserId) -> Result<()> {
        self.set_community(uid, None).await
    }

    async fn set_community(&self, uid: UserId, community_uid: Option<CommunityId>) -> Result<()> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .get_mut(&uid)
            .ok_or_else(|| SortieError::not_found(UserId::KIND, uid.to_string()))?;
        entry.community_uid = community_uid;
        Ok(())
    }
}

#[async_trait]
impl GrantStore for InMemoryDirectory {
    async fn grants_for(&self, uid: UserId) -> Result<Option<Vec<String>>> {
        Ok(self
            .entries
            .read()
            .await
            .get(&uid)
            .map(|entry| entry.grants.clone()))
    }
}

#[async_trait]
impl MembershipStore for InMemoryDirectory {
    async fn community_of(&self, uid: UserId) -> Result<Option<CommunityId>> {
        Ok(self
            .entries
            .read()
            .await
            .get(&uid)
            .and_then(|entry| entry.community_uid))
    }
}
