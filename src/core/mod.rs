/*!
 * Core Module
 * Crate-wide error type and limits
 */

pub mod errors;
pub mod limits;

pub use errors::*;
