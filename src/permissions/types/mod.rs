/*!
 * Permission Types Module
 * Core types and traits for the permission engine
 */

mod core;
mod traits;

pub use self::core::{
    AccessDecision, AccessRequest, AccessTarget, Permission, PermissionError, PermissionResult,
    Role,
};
pub use traits::PermissionChecker;
