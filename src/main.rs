/*!
 * LMS Gate - Main Entry Point
 *
 * Operator tool that shows:
 * - The permissions and reachable routes of a user type
 * - A backend resource fetched through the cached client
 */

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::info;

use lms_core::{
    init_tracing, AccessControl, CachedClient, ClientConfig, QueryParams, RequestOptions,
    RolePermissionTable, RouteTable, Session,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let table = match std::env::var("LMS_ROLE_TABLE") {
        Ok(path) => {
            info!(path = %path, "Loading role permission table");
            RolePermissionTable::from_json_file(&path)
                .with_context(|| format!("loading role table from {}", path))?
        }
        Err(_) => RolePermissionTable::standard(),
    };
    let access = AccessControl::new(table, RouteTable::standard());

    let user_type = std::env::var("LMS_USER_TYPE").unwrap_or_else(|_| "STUDENT".to_string());
    let user_id = std::env::var("LMS_USER_ID").unwrap_or_else(|_| "local".to_string());
    let session = Session::new(user_id, &user_type).context("resolving user type")?;

    println!("role: {}", session.role());
    println!("permissions:");
    for permission in access.permissions(session.role()) {
        println!("  {}", permission);
    }
    println!("routes:");
    for route in session.navigation(&access) {
        println!("  {}", route);
    }

    if let Ok(path) = std::env::var("LMS_FETCH_PATH") {
        let config = ClientConfig::from_env().context("reading client configuration")?;
        info!(base_url = %config.base_url, path = %path, "Fetching resource");

        let client = CachedClient::from_config(&config).context("building client")?;
        let payload: Value = client
            .get(&path, &QueryParams::new(), RequestOptions::new())
            .await
            .with_context(|| format!("fetching {}", path))?;

        println!("{}", serde_json::to_string_pretty(&payload)?);
    }

    Ok(())
}
