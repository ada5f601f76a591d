//! Visibility-filtered mission listing

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use sortie_core::{
    CommunityId, Mission, MissionId, MissionSlug, Result, SortieError, UserId, Visibility,
};

use crate::filter::{MissionListQuery, Page};

/// Read-only mission listing backed by PostgreSQL
pub struct PgMissionRepository {
    pool: PgPool,
}

impl PgMissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// One page of the missions admitted by the query's predicate
    #[instrument(skip(self, query), fields(limit = query.limit, offset = query.offset))]
    pub async fn list_visible(&self, query: &MissionListQuery) -> Result<Page<Mission>> {
        debug!(predicate = %query.predicate, "Listing visible missions");

        let total: i64 = query
            .count_query()
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| SortieError::database_error(e.to_string()))?;

        let rows = query
            .select_query()
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SortieError::database_error(e.to_string()))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.extend(mission_from_row(row)?);
        }
        // skipped rows are not counted as available
        let skipped = (rows.len() - items.len()) as i64;

        Ok(Page {
            limit: query.limit,
            offset: query.offset,
            total: total - skipped,
            items,
        })
    }
}

/// Decode one row; `None` when its slug or visibility no longer validates.
///
/// Such a row is left out of the page instead of failing it, so it can never
/// be matched against an editor grant.
fn mission_from_row(row: &PgRow) -> Result<Option<Mission>> {
    let column = |e: sqlx::Error| SortieError::database_error(e.to_string());

    let uid = MissionId::from_uuid(row.try_get("uid").map_err(column)?);
    let slug: String = row.try_get("slug").map_err(column)?;
    let visibility: String = row.try_get("visibility").map_err(column)?;

    let Some((slug, visibility)) = decode_labels(uid, &slug, &visibility) else {
        return Ok(None);
    };

    let community_uid: Option<Uuid> = row.try_get("community_uid").map_err(column)?;

    Ok(Some(Mission {
        uid,
        slug,
        title: row.try_get("title").map_err(column)?,
        creator_uid: UserId::from_uuid(row.try_get("creator_uid").map_err(column)?),
        community_uid: community_uid.map(CommunityId::from_uuid),
        visibility,
        start_time: row.try_get("start_time").map_err(column)?,
        end_time: row.try_get("end_time").map_err(column)?,
    }))
}

fn decode_labels(uid: MissionId, slug: &str, visibility: &str) -> Option<(MissionSlug, Visibility)> {
    let slug = match MissionSlug::parse(slug) {
        Ok(slug) => slug,
        Err(e) => {
            warn!(mission = %uid, slug, error = %e, "Skipping mission with an invalid stored slug");
            return None;
        }
    };
    let visibility = match visibility.parse::<Visibility>() {
        Ok(visibility) => visibility,
        Err(e) => {
            warn!(mission = %uid, visibility, error = %e, "Skipping mission with an unknown visibility");
            return None;
        }
    };
    Some((slug, visibility))
}
