//! Error types for Sortie

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SortieError {
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Permission denied: {action} on {resource}")]
    PermissionDenied { action: String, resource: String },

    #[error("Invalid permission '{value}': {reason}")]
    InvalidPermission { value: String, reason: String },

    #[error("Invalid caller context: {message}")]
    InvalidCaller { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Database error: {message}")]
    DatabaseError { message: String },
}

impl SortieError {
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    pub fn permission_denied(action: impl Into<String>, resource: impl Into<String>) -> Self {
        Self::PermissionDenied {
            action: action.into(),
            resource: resource.into(),
        }
    }

    pub fn invalid_permission(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPermission {
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_caller(message: impl Into<String>) -> Self {
        Self::InvalidCaller {
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::DatabaseError {
            message: message.into(),
        }
    }

    /// True for outcomes the HTTP boundary reports as "403 forbidden"
    pub fn is_forbidden(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied { .. } | Self::InvalidCaller { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, SortieError>;
