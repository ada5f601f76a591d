//! Strongly-typed identifiers for domain entities

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{Result, SortieError};

/// Macro to generate strongly-typed ID wrappers
macro_rules! define_id {
    ($name:ident, $kind:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Entity kind used in error messages and logs
            pub const KIND: &'static str = $kind;

            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            pub fn into_uuid(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = SortieError;

            fn from_str(s: &str) -> Result<Self> {
                Uuid::parse_str(s.trim()).map(Self).map_err(|e| {
                    SortieError::invalid_input(format!("invalid {} id '{}': {}", $kind, s, e))
                })
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }
    };
}

define_id!(UserId, "user");
define_id!(CommunityId, "community");
define_id!(MissionId, "mission");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_generation() {
        let id1 = UserId::new();
        let id2 = UserId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_id_parsing() {
        let id = CommunityId::new();
        let s = id.to_string();
        let parsed: CommunityId = s.parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_id_parsing_rejects_garbage() {
        let err = "not-a-uuid".parse::<MissionId>().unwrap_err();
        assert!(matches!(err, SortieError::InvalidInput { .. }));
        assert!(err.to_string().contains("mission id 'not-a-uuid'"));
    }

    #[test]
    fn test_id_kind() {
        assert_eq!(UserId::KIND, "user");
        assert_eq!(CommunityId::KIND, "community");
        assert_eq!(MissionId::KIND, "mission");
    }
}
