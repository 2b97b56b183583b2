/*!
 * Limits and Defaults
 *
 * Centralized location for cache defaults, transport limits and audit bounds.
 * Organized by domain.
 */

// =============================================================================
// CACHE
// =============================================================================

/// Default freshness window for cached GETs (5 minutes)
pub const DEFAULT_CACHE_TTL_MINUTES: u64 = 5;

// =============================================================================
// TRANSPORT
// =============================================================================

/// Base URL used when none is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/";

/// Per-request timeout (30 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Characters of a non-success response body kept in the error
pub const MAX_ERROR_BODY_CHARS: usize = 512;

// =============================================================================
// SECURITY & AUDIT
// =============================================================================

/// Maximum audit events stored globally (10,000 events)
/// [SECURITY] Bounds audit memory
pub const MAX_AUDIT_EVENTS: usize = 10_000;

/// Maximum audit events per role (100 events)
pub const MAX_AUDIT_EVENTS_PER_ROLE: usize = 100;
