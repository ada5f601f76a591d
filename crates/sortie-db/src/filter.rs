//! Translation of visibility predicates into PostgreSQL
//!
//! Every leaf is rendered with a bound parameter; compound nodes are
//! parenthesised. The editor leaf becomes `slug = ANY($n)` over the slugs the
//! caller's grants cover, so no join against the permission table is needed.

use sqlx::{Postgres, QueryBuilder};

use sortie_authz::{EditorScope, Predicate};

/// Columns selected for a mission row
pub const MISSION_COLUMNS: &str =
    "uid, slug, title, creator_uid, community_uid, visibility, start_time, end_time";

/// Default page size for mission listings
pub const DEFAULT_LIMIT: i64 = 10;

/// Append `predicate` as a boolean SQL expression
pub fn push_predicate(builder: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
    match predicate {
        Predicate::True => {
            builder.push("TRUE");
        }
        Predicate::False => {
            builder.push("FALSE");
        }
        Predicate::VisibilityIs(visibility) => {
            builder.push("visibility = ").push_bind(visibility.as_str());
        }
        Predicate::CreatorIs(uid) => {
            builder.push("creator_uid = ").push_bind(*uid.as_uuid());
        }
        Predicate::CommunityIs(uid) => {
            builder.push("community_uid = ").push_bind(*uid.as_uuid());
        }
        Predicate::EditorOf(EditorScope::None) => {
            builder.push("FALSE");
        }
        Predicate::EditorOf(EditorScope::AllMissions) => {
            builder.push("TRUE");
        }
        Predicate::EditorOf(EditorScope::Slugs(slugs)) => {
            let slugs: Vec<String> = slugs.iter().map(|s| s.as_str().to_string()).collect();
            builder.push("slug = ANY(").push_bind(slugs).push(")");
        }
        Predicate::EndsAfter(instant) => {
            builder.push("end_time > ").push_bind(*instant);
        }
        Predicate::And(terms) => push_joined(builder, terms, " AND ", "TRUE"),
        Predicate::Or(terms) => push_joined(builder, terms, " OR ", "FALSE"),
    }
}

fn push_joined(
    builder: &mut QueryBuilder<'_, Postgres>,
    terms: &[Predicate],
    separator: &str,
    identity: &str,
) {
    if terms.is_empty() {
        builder.push(identity);
        return;
    }
    builder.push("(");
    for (i, term) in terms.iter().enumerate() {
        if i > 0 {
            builder.push(separator);
        }
        push_predicate(builder, term);
    }
    builder.push(")");
}

// =============================================================================
// Mission Listing
// =============================================================================

/// A paginated, visibility-filtered mission listing
#[derive(Debug, Clone)]
pub struct MissionListQuery {
    pub predicate: Predicate,
    pub limit: i64,
    pub offset: i64,
}

impl MissionListQuery {
    pub fn new(predicate: Predicate) -> Self {
        Self {
            predicate,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }

    pub fn page(mut self, limit: i64, offset: i64) -> Self {
        self.limit = limit.max(1);
        self.offset = offset.max(0);
        self
    }

    /// `SELECT` of one page, ordered by start time then case-insensitive title
    pub fn select_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::new("SELECT ");
        builder.push(MISSION_COLUMNS).push(" FROM missions WHERE ");
        push_predicate(&mut builder, &self.predicate);
        builder
            .push(" ORDER BY start_time ASC, UPPER(title) ASC LIMIT ")
            .push_bind(self.limit)
            .push(" OFFSET ")
            .push_bind(self.offset);
        builder
    }

    /// `COUNT(*)` over every matching mission
    pub fn count_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM missions WHERE ");
        push_predicate(&mut builder, &self.predicate);
        builder
    }
}

/// One page of results with the total match count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub limit: i64,
    pub offset: i64,
    pub total: i64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn more_available(&self) -> bool {
        self.offset + (self.items.len() as i64) < self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use sortie_authz::{build_filter, CallerContext, GrantSet, VisibilityFilter};
    use sortie_core::{CommunityId, MissionSlug, UserId, Visibility};

    fn render(predicate: &Predicate) -> String {
        let mut builder = QueryBuilder::<Postgres>::new("");
        push_predicate(&mut builder, predicate);
        builder.sql().to_string()
    }

    #[test]
    fn test_constants() {
        assert_eq!(render(&Predicate::True), "TRUE");
        assert_eq!(render(&Predicate::False), "FALSE");
        assert_eq!(render(&Predicate::And(vec![])), "TRUE");
        assert_eq!(render(&Predicate::Or(vec![])), "FALSE");
    }

    #[test]
    fn test_anonymous_filter() {
        let predicate = build_filter(&CallerContext::anonymous(), None);
        assert_eq!(render(&predicate), "visibility = $1");
    }

    #[test]
    fn test_authenticated_filter() {
        let caller = CallerContext::authenticated(
            UserId::new(),
            Some(CommunityId::new()),
            GrantSet::from_raw(["mission.alpha.editor"]),
        );
        let predicate = build_filter(&caller, None);
        assert_eq!(
            render(&predicate),
            "(creator_uid = $1 OR visibility = $2 \
             OR (visibility = $3 AND (creator_uid = $4 OR slug = ANY($5))) \
             OR (visibility = $6 AND creator_uid = $7) \
             OR (visibility = $8 AND community_uid = $9))"
        );
    }

    #[test]
    fn test_wildcard_editor_has_no_slug_filter() {
        let caller =
            CallerContext::authenticated(UserId::new(), None, GrantSet::from_raw(["*"]));
        let predicate = build_filter(&caller, None);
        let sql = render(&predicate);
        assert!(!sql.contains("slug"));
        assert!(sql.contains("visibility = $3"));
    }

    #[test]
    fn test_scoped_and_ending_filter() {
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 12, 0, 0).unwrap();
        let predicate = VisibilityFilter::for_caller(&CallerContext::anonymous())
            .created_by(UserId::new())
            .ending_after(now)
            .build();
        assert_eq!(
            render(&predicate),
            "(visibility = $1 AND creator_uid = $2 AND end_time > $3)"
        );
    }

    #[test]
    fn test_editor_scope_rendering() {
        let slugs = [MissionSlug::parse("alpha").unwrap()].into_iter().collect();
        assert_eq!(
            render(&Predicate::EditorOf(EditorScope::Slugs(slugs))),
            "slug = ANY($1)"
        );
        assert_eq!(render(&Predicate::EditorOf(EditorScope::None)), "FALSE");
        assert_eq!(render(&Predicate::EditorOf(EditorScope::AllMissions)), "TRUE");
    }

    #[test]
    fn test_select_query() {
        let query = MissionListQuery::new(Predicate::VisibilityIs(Visibility::Public)).page(25, 50);
        assert_eq!(
            query.select_query().sql(),
            "SELECT uid, slug, title, creator_uid, community_uid, visibility, start_time, end_time \
             FROM missions WHERE visibility = $1 \
             ORDER BY start_time ASC, UPPER(title) ASC LIMIT $2 OFFSET $3"
        );
        assert_eq!(
            query.count_query().sql(),
            "SELECT COUNT(*) FROM missions WHERE visibility = $1"
        );
    }

    #[test]
    fn test_page_bounds() {
        let query = MissionListQuery::new(Predicate::True).page(0, -5);
        assert_eq!(query.limit, 1);
        assert_eq!(query.offset, 0);
    }

    #[test]
    fn test_more_available() {
        let page = Page {
            limit: 2,
            offset: 2,
            total: 5,
            items: vec![1, 2],
        };
        assert_eq!(page.count(), 2);
        assert!(page.more_available());

        let last = Page {
            limit: 2,
            offset: 4,
            total: 5,
            items: vec![5],
        };
        assert!(!last.more_available());
    }
}
