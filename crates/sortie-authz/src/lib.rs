//! Sortie authorization engine
//!
//! Three pure components, each built on the one before it:
//!
//! - [`permission`]: does a set of held grants satisfy a required permission
//! - [`guard`]: may an actor modify or delete a target identity
//! - [`visibility`]: which missions may a caller list, as a [`Predicate`]
//!
//! None of them perform I/O. [`CallerResolver`] loads the grant and
//! membership snapshots they consume from the collaborator stores.

pub mod caller;
pub mod guard;
pub mod memory;
pub mod permission;
pub mod predicate;
pub mod visibility;


pub use caller::{AuthenticatedCaller, CallerContext, CallerResolver};
pub use guard::{
    authorize_identity_action, decide_identity_action, may_act_on_identity,
    may_view_admin_details, AccessDecision, IdentityAction,
};
pub use memory::InMemoryDirectory;
pub use permission::{satisfies, Grant, GrantSet, Permission};
pub use predicate::{EditorScope, Predicate};
pub use visibility::{build_filter, VisibilityFilter};
