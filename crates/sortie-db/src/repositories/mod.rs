//! Repository implementations for PostgreSQL

pub mod grant;
pub mod membership;
pub mod mission;

pub use grant::*;
pub use membership::*;
pub use mission::*;
