/*!
 * Policy Module
 * Role permission table and route table
 */

mod routes;
mod table;

pub use routes::{normalize_route, RouteTable};
pub use table::RolePermissionTable;
