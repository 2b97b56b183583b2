/*!
 * Access Audit Trail
 * Tracks access checks and denials per role
 */

use crate::core::limits::{MAX_AUDIT_EVENTS, MAX_AUDIT_EVENTS_PER_ROLE as MAX_ROLE_EVENTS};
use crate::permissions::types::{AccessDecision, AccessTarget, Role};
use ahash::RandomState;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, TimestampSeconds};
use std::collections::VecDeque;
use std::time::SystemTime;

/// Audit event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    Info,
    Warning,
    Critical,
}

/// Access audit event
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AuditEvent {
    pub decision: AccessDecision,
    pub severity: AuditSeverity,
    #[serde_as(as = "TimestampSeconds<i64>")]
    pub logged_at: SystemTime,
}

impl AuditEvent {
    pub fn new(decision: AccessDecision) -> Self {
        let severity = if decision.is_allowed() {
            AuditSeverity::Info
        } else {
            match &decision.request.target {
                // A privileged account bouncing off a route is worth a look
                AccessTarget::Route(_) if decision.request.role.is_privileged() => {
                    AuditSeverity::Critical
                }
                _ => AuditSeverity::Warning,
            }
        };

        Self {
            decision,
            severity,
            logged_at: SystemTime::now(),
        }
    }

    pub fn with_severity(mut self, severity: AuditSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn role(&self) -> Role {
        self.decision.request.role
    }
}

/// Audit logger for access checks
pub struct AuditLogger {
    /// Global event log (ring buffer)
    events: parking_lot::RwLock<VecDeque<AuditEvent>>,
    /// Per-role event logs
    role_events: DashMap<Role, VecDeque<AuditEvent>, RandomState>,
    /// Denial counters
    denial_counts: DashMap<Role, u64, RandomState>,
}

impl AuditLogger {
    pub fn new() -> Self {
        Self {
            events: parking_lot::RwLock::new(VecDeque::with_capacity(MAX_AUDIT_EVENTS)),
            role_events: DashMap::with_hasher(RandomState::new()),
            denial_counts: DashMap::with_hasher(RandomState::new()),
        }
    }

    /// Record an access check
    pub fn log(&self, event: AuditEvent) {
        let role = event.role();
        let is_denied = !event.decision.is_allowed();

        {
            let mut events = self.events.write();
            if events.len() >= MAX_AUDIT_EVENTS {
                events.pop_front();
            }
            events.push_back(event.clone());
        }

        {
            let mut entry = self
                .role_events
                .entry(role)
                .or_insert_with(|| VecDeque::with_capacity(MAX_ROLE_EVENTS));
            if entry.len() >= MAX_ROLE_EVENTS {
                entry.pop_front();
            }
            entry.push_back(event);
        }

        if is_denied {
            self.denial_counts
                .entry(role)
                .and_modify(|count| *count += 1)
                .or_insert(1);
        }
    }

    /// Most recent events, newest first
    pub fn recent(&self, limit: usize) -> Vec<AuditEvent> {
        let events = self.events.read();
        events.iter().rev().take(limit).cloned().collect()
    }

    /// Most recent events for one role, newest first
    pub fn for_role(&self, role: Role, limit: usize) -> Vec<AuditEvent> {
        if let Some(entry) = self.role_events.get(&role) {
            entry.iter().rev().take(limit).cloned().collect()
        } else {
            Vec::new()
        }
    }

    pub fn denial_count(&self, role: Role) -> u64 {
        self.denial_counts.get(&role).map(|e| *e).unwrap_or(0)
    }

    pub fn roles_with_denials(&self) -> Vec<(Role, u64)> {
        let mut roles: Vec<(Role, u64)> = self
            .denial_counts
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();
        roles.sort();
        roles
    }

    pub fn clear_role(&self, role: Role) {
        self.role_events.remove(&role);
        self.denial_counts.remove(&role);
    }

    pub fn clear_all(&self) {
        self.events.write().clear();
        self.role_events.clear();
        self.denial_counts.clear();
    }

    pub fn stats(&self) -> AuditStats {
        AuditStats {
            total_events: self.events.read().len(),
            total_denials: self.denial_counts.iter().map(|e| *e.value()).sum(),
            roles_tracked: self.role_events.len(),
        }
    }
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// Audit statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditStats {
    pub total_events: usize,
    pub total_denials: u64,
    pub roles_tracked: usize,
}
