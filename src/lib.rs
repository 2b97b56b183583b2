/*!
 * LMS Core Library
 * Role-based access control and cached backend access for the LMS client
 */

pub mod client;
pub mod core;
pub mod monitoring;
pub mod permissions;

// Re-exports
pub use client::{
    Backends, CachedClient, ClientConfig, ClientError, ClientResult, HttpTransport, QueryParams,
    RequestOptions, Service, Transport, TransportError, WriteMethod,
};
pub use crate::core::{LmsError, LmsResult};
pub use monitoring::{generate_request_id, init_tracing};
pub use permissions::{
    AccessControl, Permission, PermissionChecker, PermissionError, Role, RolePermissionTable,
    RouteTable, Session,
};
