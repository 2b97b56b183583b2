/*!
 * Permissions Module
 * Role-based access control for the LMS shell
 *
 * A static role table decides which actions each role may take, and a route
 * table maps every protected view to the one permission it requires. Both are
 * built once and injected into [`AccessControl`]; lookups fail closed.
 *
 * ## Usage
 * ```ignore
 * use lms_core::permissions::{AccessControl, Permission, Role};
 *
 * let access = AccessControl::standard();
 *
 * if access.has_permission(Role::Teacher, Permission::CreateHomework) {
 *     // Render the "new homework" button
 * }
 *
 * if !access.can_access_route(role, "/payments/verify") {
 *     // Redirect
 * }
 * ```
 */

pub mod audit;
pub mod manager;
pub mod policy;
pub mod session;
pub mod types;

pub use audit::{AuditEvent, AuditLogger, AuditSeverity, AuditStats};
pub use manager::AccessControl;
pub use policy::{normalize_route, RolePermissionTable, RouteTable};
pub use session::Session;
pub use types::{
    AccessDecision, AccessRequest, AccessTarget, Permission, PermissionChecker, PermissionError,
    PermissionResult, Role,
};
