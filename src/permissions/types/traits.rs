/*!
 * Permission Traits
 * Interfaces for access checking
 */

use super::core::{AccessDecision, AccessRequest};

/// Core access checking interface
pub trait PermissionChecker: Send + Sync {
    /// Check if an access request is allowed
    fn check(&self, request: &AccessRequest) -> AccessDecision;

    /// Check with audit logging
    fn check_and_audit(&self, request: &AccessRequest) -> AccessDecision;

    /// Batch check multiple requests
    fn check_batch(&self, requests: &[AccessRequest]) -> Vec<AccessDecision> {
        requests.iter().map(|req| self.check(req)).collect()
    }
}
