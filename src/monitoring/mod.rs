/*!
 * Monitoring Module
 * Tracing initialization and request correlation
 */

mod tracer;

pub use tracer::{generate_request_id, init_tracing};
