/*!
 * Access Control
 * Central engine answering role, permission and route queries
 */

use crate::permissions::audit::{AuditEvent, AuditLogger, AuditStats};
use crate::permissions::policy::{RolePermissionTable, RouteTable};
use crate::permissions::types::{
    AccessDecision, AccessRequest, AccessTarget, Permission, PermissionChecker, Role,
};
use log::{debug, warn};
use std::sync::Arc;

/// Permission engine over an injected role table and route table
///
/// Every query is a pure lookup. Unknown roles, routes and permission names
/// resolve to `false`; nothing here returns an error.
#[derive(Clone)]
pub struct AccessControl {
    table: Arc<RolePermissionTable>,
    routes: Arc<RouteTable>,
    audit: Arc<AuditLogger>,
}

impl AccessControl {
    pub fn new(table: RolePermissionTable, routes: RouteTable) -> Self {
        debug!(
            "Initializing access control with {} roles and {} routes",
            table.roles().len(),
            routes.len()
        );
        Self {
            table: Arc::new(table),
            routes: Arc::new(routes),
            audit: Arc::new(AuditLogger::new()),
        }
    }

    /// Engine over the standard role and route tables
    pub fn standard() -> Self {
        Self::new(RolePermissionTable::standard(), RouteTable::standard())
    }

    pub fn table(&self) -> &RolePermissionTable {
        &self.table
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    pub fn audit_stats(&self) -> AuditStats {
        self.audit.stats()
    }

    pub fn has_permission(&self, role: Role, permission: Permission) -> bool {
        self.table.contains(role, permission)
    }

    /// False for an empty list
    pub fn has_any_permission(&self, role: Role, permissions: &[Permission]) -> bool {
        permissions.iter().any(|p| self.has_permission(role, *p))
    }

    /// Vacuously true for an empty list
    pub fn has_all_permissions(&self, role: Role, permissions: &[Permission]) -> bool {
        permissions.iter().all(|p| self.has_permission(role, *p))
    }

    /// Owned copy of the role's granted set, in declaration order
    pub fn permissions(&self, role: Role) -> Vec<Permission> {
        match self.table.grants(role) {
            Some(set) => set.iter().copied().collect(),
            None => Vec::new(),
        }
    }

    pub fn can_access_route(&self, role: Role, route: &str) -> bool {
        match self.routes.required(route) {
            Some(permission) => self.has_permission(role, permission),
            None => {
                debug!("Route '{}' has no permission mapping, denying {}", route, role);
                false
            }
        }
    }

    /// Raw-string form for callers holding backend user types and permission names
    pub fn has_permission_for(&self, user_type: &str, permission_name: &str) -> bool {
        let Some(role) = Role::from_user_type(user_type) else {
            warn!("Unknown user type '{}' in permission check", user_type);
            return false;
        };
        match permission_name.parse::<Permission>() {
            Ok(permission) => self.has_permission(role, permission),
            Err(_) => {
                warn!("Unknown permission '{}' requested for {}", permission_name, role);
                false
            }
        }
    }

    /// Every declared route the role can reach, sorted by path
    pub fn accessible_routes(&self, role: Role) -> Vec<String> {
        self.routes
            .entries()
            .into_iter()
            .filter(|(_, permission)| self.has_permission(role, *permission))
            .map(|(route, _)| route.to_string())
            .collect()
    }
}

impl Default for AccessControl {
    fn default() -> Self {
        Self::standard()
    }
}

impl PermissionChecker for AccessControl {
    fn check(&self, request: &AccessRequest) -> AccessDecision {
        let role = request.role;
        match &request.target {
            AccessTarget::Permission(permission) => {
                if self.has_permission(role, *permission) {
                    AccessDecision::allow(request.clone(), format!("{} holds '{}'", role, permission))
                } else {
                    AccessDecision::deny(
                        request.clone(),
                        format!("{} lacks '{}'", role, permission),
                    )
                }
            }
            AccessTarget::Route(route) => match self.routes.required(route) {
                Some(permission) if self.has_permission(role, permission) => AccessDecision::allow(
                    request.clone(),
                    format!("Route '{}' requires '{}'", route, permission),
                ),
                Some(permission) => AccessDecision::deny(
                    request.clone(),
                    format!("Route '{}' requires '{}' which {} lacks", route, permission, role),
                ),
                None => AccessDecision::deny(
                    request.clone(),
                    format!("Route '{}' is not declared", route),
                ),
            },
        }
    }

    fn check_and_audit(&self, request: &AccessRequest) -> AccessDecision {
        let decision = self.check(request);
        if !decision.is_allowed() {
            debug!("Access denied: {}", decision.reason());
        }
        self.audit.log(AuditEvent::new(decision.clone()));
        decision
    }
}
