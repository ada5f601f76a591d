//! Permission grant lookups

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{debug, instrument};

use sortie_core::{GrantStore, Result, SortieError, UserId};

/// PostgreSQL implementation of GrantStore
///
/// Reads the `permissions` table joined against `users` so that an identity
/// without grants is distinguishable from an unknown identity.
pub struct PgGrantStore {
    pool: PgPool,
}

impl PgGrantStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GrantStore for PgGrantStore {
    #[instrument(skip(self))]
    async fn grants_for(&self, uid: UserId) -> Result<Option<Vec<String>>> {
        let rows = sqlx::query(
            r#"
            SELECT p.permission
            FROM users u
            LEFT JOIN permissions p ON p.user_uid = u.uid
            WHERE u.uid = $1
            "#,
        )
        .bind(uid.into_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| SortieError::database_error(e.to_string()))?;

        if rows.is_empty() {
            debug!("Identity not found");
            return Ok(None);
        }

        let mut grants = Vec::with_capacity(rows.len());
        for row in rows {
            let permission: Option<String> = row
                .try_get("permission")
                .map_err(|e| SortieError::database_error(e.to_string()))?;
            grants.extend(permission);
        }

        Ok(Some(grants))
    }
}
