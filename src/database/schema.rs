use sqlx::PgPool;
use tracing::info;

use crate::database::manager::DatabaseError;

/// Statements that add the compliance columns, tables and indexes to the host schema.
/// Every statement is idempotent.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    r#"ALTER TABLE "user" ADD COLUMN IF NOT EXISTS is_root_admin BOOLEAN NOT NULL DEFAULT false"#,
    r#"CREATE UNIQUE INDEX IF NOT EXISTS user_single_root_admin ON "user" (is_root_admin) WHERE is_root_admin"#,
    r#"CREATE UNIQUE INDEX IF NOT EXISTS role_name_unique ON role (name)"#,
    r#"CREATE TABLE IF NOT EXISTS service_report (
        id BIGSERIAL PRIMARY KEY,
        service_name TEXT NOT NULL DEFAULT '',
        user_email TEXT NOT NULL DEFAULT '',
        action TEXT,
        request_verb TEXT NOT NULL,
        created_date TIMESTAMPTZ DEFAULT NOW(),
        last_modified_date TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )"#,
];

/// Bring the compliance schema up to date
pub async fn ensure_schema(pool: &PgPool) -> Result<(), DatabaseError> {
    let mut tx = pool.begin().await?;
    for statement in SCHEMA_STATEMENTS {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;
    info!("Compliance schema is up to date");
    Ok(())
}
