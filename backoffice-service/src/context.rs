//! Per-request user context.
//!
//! Audit fields (created-by / modified-by) and role checks are driven by an
//! explicit context extracted from the `x-user-id` / `x-user-role` headers
//! the authenticating front end forwards, never by ambient state.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use backoffice_core::error::AppError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
    Viewer,
}

impl Role {
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "editor" => Some(Role::Editor),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }
}

/// Authenticated caller identity, threaded through service calls.
#[derive(Debug, Clone, Copy)]
pub struct UserContext {
    pub user_id: Uuid,
    pub role: Role,
}

impl UserContext {
    /// Editors and admins may create and modify records.
    pub fn require_editor(&self) -> Result<(), AppError> {
        match self.role {
            Role::Admin | Role::Editor => Ok(()),
            Role::Viewer => Err(AppError::Forbidden(anyhow::anyhow!(
                "Editor role required for this operation"
            ))),
        }
    }

    /// Only admins may delete or deactivate records.
    pub fn require_admin(&self) -> Result<(), AppError> {
        match self.role {
            Role::Admin => Ok(()),
            _ => Err(AppError::Forbidden(anyhow::anyhow!(
                "Admin role required for this operation"
            ))),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok());

        let role = parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|h| h.to_str().ok())
            .and_then(Role::from_str_opt);

        match (user_id, role) {
            (Some(user_id), Some(role)) => Ok(UserContext { user_id, role }),
            _ => Err(AppError::Unauthorized(anyhow::anyhow!(
                "Missing or invalid {} / {} headers",
                USER_ID_HEADER,
                USER_ROLE_HEADER
            ))
            .into_response()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_permissions() {
        let admin = UserContext {
            user_id: Uuid::new_v4(),
            role: Role::Admin,
        };
        let editor = UserContext {
            user_id: Uuid::new_v4(),
            role: Role::Editor,
        };
        let viewer = UserContext {
            user_id: Uuid::new_v4(),
            role: Role::Viewer,
        };

        assert!(admin.require_editor().is_ok());
        assert!(admin.require_admin().is_ok());
        assert!(editor.require_editor().is_ok());
        assert!(editor.require_admin().is_err());
        assert!(viewer.require_editor().is_err());
        assert!(viewer.require_admin().is_err());
    }

    #[test]
    fn role_parsing() {
        assert_eq!(Role::from_str_opt("admin"), Some(Role::Admin));
        assert_eq!(Role::from_str_opt("manager"), None);
    }
}
