/*!
 * Session
 * Signed-in user with the role derived at login
 */

use crate::permissions::manager::AccessControl;
use crate::permissions::types::{Permission, PermissionError, PermissionResult, Role};
use serde::{Deserialize, Serialize};

/// Authenticated session
///
/// The role is fixed for the session's lifetime; a different role needs a new
/// login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Session {
    user_id: String,
    role: Role,
}

impl Session {
    /// Derive the role from the backend's user-type string
    pub fn new(user_id: impl Into<String>, user_type: &str) -> PermissionResult<Self> {
        let role = Role::from_user_type(user_type).ok_or_else(|| PermissionError::UnknownUserType {
            user_type: user_type.to_string(),
        })?;
        Ok(Self {
            user_id: user_id.into(),
            role,
        })
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn can(&self, access: &AccessControl, permission: Permission) -> bool {
        access.has_permission(self.role, permission)
    }

    pub fn can_access_route(&self, access: &AccessControl, route: &str) -> bool {
        access.can_access_route(self.role, route)
    }

    /// Routes to offer in the navigation menu
    pub fn navigation(&self, access: &AccessControl) -> Vec<String> {
        access.accessible_routes(self.role)
    }
}
