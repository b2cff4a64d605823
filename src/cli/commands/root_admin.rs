use serde_json::json;
use tracing::info;

use crate::cli::utils::{output_empty_collection, output_success, print_table, yes_no};
use crate::cli::OutputFormat;
use crate::compliance::error::ComplianceError;
use crate::compliance::store::AdminStore;
use crate::config::config;
use crate::database::models::AdminRecord;
use crate::state::AppState;

/// Which admin becomes root: the only admin if there is exactly one, otherwise the requested id.
pub fn choose_root(admins: &[AdminRecord], requested: Option<i64>) -> Result<i64, ComplianceError> {
    match (admins, requested) {
        ([only], _) => Ok(only.id),
        (_, Some(id)) => Ok(id),
        (_, None) => Err(ComplianceError::invalid_payload(
            "More than one admin exists, pass --admin-id to pick the root admin",
        )),
    }
}

/// Promote an admin to root, demoting any previous root.
pub async fn promote(admins: &dyn AdminStore, requested: Option<i64>) -> Result<AdminRecord, ComplianceError> {
    let listed = admins.list_admins().await?;
    let id = choose_root(&listed, requested)?;
    let root = admins.set_root(id).await?;
    info!("'{}' (id {}) is now root admin", root.email, root.id);
    Ok(root)
}

fn print_admins(admins: &[AdminRecord]) {
    let rows: Vec<Vec<String>> = admins
        .iter()
        .map(|a| {
            vec![
                a.id.to_string(),
                a.email.clone(),
                a.display_name(),
                a.first_name.clone().unwrap_or_default(),
                a.last_name.clone().unwrap_or_default(),
                yes_no(a.is_active),
                yes_no(a.is_root_admin),
                a.created_date.map(|d| d.format("%Y-%m-%d %H:%M").to_string()).unwrap_or_default(),
            ]
        })
        .collect();

    print_table(
        &["ID", "EMAIL", "DISPLAY NAME", "FIRST NAME", "LAST NAME", "ACTIVE", "ROOT", "REGISTERED"],
        &[6, 30, 20, 15, 15, 7, 5],
        &rows,
    );
}

pub async fn handle(admin_id: Option<i64>, output_format: OutputFormat) -> anyhow::Result<()> {
    let stores = AppState::connect_stores(config()).await?;
    let admins = stores.admins.list_admins().await?;

    if admins.is_empty() {
        return output_empty_collection(&output_format, "admins", "No admins found");
    }

    if let OutputFormat::Text = output_format {
        print_admins(&admins);
        println!();
    }

    let root = promote(stores.admins.as_ref(), admin_id).await?;

    output_success(
        &output_format,
        &format!("'{}' is now root admin", root.email),
        Some(json!({ "root_admin": root, "admins": admins })),
    )
}
