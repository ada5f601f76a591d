//! Mission visibility filters
//!
//! A mission is visible to a caller when any of these hold:
//!
//! | Caller | Disjuncts |
//! |--------|-----------|
//! | anonymous | `visibility = public` |
//! | authenticated | `creator = caller`; `visibility = public`; `visibility = hidden AND (creator = caller OR caller edits slug)`; `visibility = private AND creator = caller`; with a community: `visibility = community AND community = caller's` |
//!
//! Scoping to a creator and excluding ended missions are conjoined on top and
//! can only narrow the result.

use chrono::{DateTime, Utc};

use sortie_core::{UserId, Visibility};

use crate::caller::CallerContext;
use crate::predicate::{EditorScope, Predicate};

/// Builder for the visibility predicate of a mission listing
#[derive(Debug, Clone)]
pub struct VisibilityFilter<'a> {
    caller: &'a CallerContext,
    created_by: Option<UserId>,
    ending_after: Option<DateTime<Utc>>,
}

impl<'a> VisibilityFilter<'a> {
    pub fn for_caller(caller: &'a CallerContext) -> Self {
        Self {
            caller,
            created_by: None,
            ending_after: None,
        }
    }

    /// Only list missions created by `uid`
    pub fn created_by(mut self, uid: impl Into<Option<UserId>>) -> Self {
        self.created_by = uid.into();
        self
    }

    /// Only list missions whose end time is after `now`
    pub fn ending_after(mut self, now: impl Into<Option<DateTime<Utc>>>) -> Self {
        self.ending_after = now.into();
        self
    }

    /// The OR of everything the caller is entitled to see
    pub fn visibility_scope(&self) -> Predicate {
        let caller = match self.caller {
            CallerContext::Anonymous => {
                return Predicate::visibility_is(Visibility::Public);
            }
            CallerContext::Authenticated(caller) => caller,
        };

        let is_creator = || Predicate::creator_is(caller.uid);
        let editor = Predicate::editor_of(EditorScope::from_grants(&caller.grants));

        let mut disjuncts = vec![
            is_creator(),
            Predicate::visibility_is(Visibility::Public),
            Predicate::and([
                Predicate::visibility_is(Visibility::Hidden),
                Predicate::or([is_creator(), editor]),
            ]),
            Predicate::and([Predicate::visibility_is(Visibility::Private), is_creator()]),
        ];

        if let Some(community_uid) = caller.community_uid {
            disjuncts.push(Predicate::and([
                Predicate::visibility_is(Visibility::Community),
                Predicate::community_is(community_uid),
            ]));
        }

        Predicate::or(disjuncts)
    }

    pub fn build(&self) -> Predicate {
        Predicate::and([
            self.visibility_scope(),
            self.created_by.map_or(Predicate::True, Predicate::creator_is),
            self.ending_after.map_or(Predicate::True, Predicate::ends_after),
        ])
    }
}

/// Predicate for listing missions as `caller`, optionally only those created by `scoped_to_creator`
pub fn build_filter(caller: &CallerContext, scoped_to_creator: Option<UserId>) -> Predicate {
    VisibilityFilter::for_caller(caller)
        .created_by(scoped_to_creator)
        .build()
}
