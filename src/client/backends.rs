/*!
 * Backends
 * Main LMS API and the secondary lectures/transport API
 */

use super::cached::CachedClient;
use super::config::ClientConfig;
use super::errors::ClientResult;
use serde::{Deserialize, Serialize};

/// Feature area a request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    Organizations,
    Institutes,
    Classes,
    Subjects,
    Users,
    Homework,
    Exams,
    Attendance,
    Payments,
    Lectures,
    Transport,
}

impl Service {
    /// Served by the secondary backend
    pub fn uses_secondary(&self) -> bool {
        matches!(self, Service::Lectures | Service::Transport)
    }
}

/// Cached clients for both backends, each with its own store
#[derive(Clone)]
pub struct Backends {
    primary: CachedClient,
    secondary: CachedClient,
}

impl Backends {
    pub fn new(primary: CachedClient, secondary: CachedClient) -> Self {
        Self { primary, secondary }
    }

    /// HTTP clients for both backends
    ///
    /// Without a secondary URL both clients talk to the main API but still
    /// keep separate stores.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        Ok(Self {
            primary: CachedClient::from_config(config)?,
            secondary: CachedClient::from_config(&config.secondary())?,
        })
    }

    pub fn primary(&self) -> &CachedClient {
        &self.primary
    }

    pub fn secondary(&self) -> &CachedClient {
        &self.secondary
    }

    pub fn for_service(&self, service: Service) -> &CachedClient {
        if service.uses_secondary() {
            &self.secondary
        } else {
            &self.primary
        }
    }

    /// Drop cached data on both backends, e.g. on logout
    pub fn clear(&self) {
        self.primary.clear();
        self.secondary.clear();
    }
}
