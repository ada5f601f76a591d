//! Community membership lookups

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use sortie_core::{CommunityId, MembershipStore, Result, SortieError, UserId};

/// PostgreSQL implementation of MembershipStore
pub struct PgMembershipStore {
    pool: PgPool,
}

impl PgMembershipStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipStore for PgMembershipStore {
    #[instrument(skip(self))]
    async fn community_of(&self, uid: UserId) -> Result<Option<CommunityId>> {
        let row = sqlx::query("SELECT community_uid FROM users WHERE uid = $1")
            .bind(uid.into_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| SortieError::database_error(e.to_string()))?;

        match row {
            Some(row) => {
                let community_uid: Option<Uuid> = row
                    .try_get("community_uid")
                    .map_err(|e| SortieError::database_error(e.to_string()))?;
                Ok(community_uid.map(CommunityId::from_uuid))
            }
            None => Ok(None),
        }
    }
}
