//! Sortie Core - Domain types and collaborator traits for the authorization engine

pub mod error;
pub mod ids;
pub mod models;
pub mod traits;

pub use error::*;
pub use ids::*;
pub use models::*;
pub use traits::*;
