//! PostgreSQL data access for Sortie
//!
//! Translates visibility predicates into SQL and implements the grant and
//! membership stores consumed by the authorization engine.

pub mod filter;
pub mod pool;
pub mod repositories;

pub use filter::{push_predicate, MissionListQuery, Page};
pub use pool::{create_pool, DatabaseConfig};
pub use repositories::*;
