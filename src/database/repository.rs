use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::compliance::acl::AclEntry;
use crate::compliance::error::ComplianceError;
use crate::compliance::gate::{ADMIN_NOT_FOUND, ONLY_ADMINS_CAN_BE_ROOT};
use crate::compliance::reconciler::AclChangeSet;
use crate::compliance::store::{
    AclEntryStore, AdminStore, AppLinkStore, AppLookup, RoleStore, ServiceLookup, ServiceReportStore,
};
use crate::database::models::{AdminRecord, AppLink, NewRole, NewServiceReport, Role, ServiceReport};

// Host tables use INT keys and plain timestamps; everything is widened on the way out.
const ROLE_COLUMNS: &str = "id::bigint AS id, name, description, is_active";

const ACL_COLUMNS: &str = "id::bigint AS id, role_id::bigint AS role_id, service_id::bigint AS service_id, \
     component, verb_mask, requestor_mask, \
     COALESCE(NULLIF(filters, ''), '[]')::jsonb AS filters, COALESCE(filter_op, 'AND') AS filter_op";

const LINK_COLUMNS: &str =
    "id::bigint AS id, user_id::bigint AS user_id, app_id::bigint AS app_id, role_id::bigint AS role_id";

const ADMIN_COLUMNS: &str = "id::bigint AS id, email, name, first_name, last_name, is_active, is_sys_admin, \
     is_root_admin, created_date::timestamptz AS created_date";

const REPORT_COLUMNS: &str = "id::bigint AS id, service_name, user_email, action, request_verb, \
     created_date, last_modified_date";

/// Postgres implementation of every compliance store, over the host platform's tables
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

async fn insert_entry<'e, E>(executor: E, role_id: i64, entry: &AclEntry) -> Result<(), sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO role_service_access
             (role_id, service_id, component, verb_mask, requestor_mask, filters, filter_op)
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(role_id)
    .bind(entry.service_id)
    .bind(&entry.component)
    .bind(entry.verb_mask)
    .bind(entry.requestor_mask)
    .bind(entry.filters.to_string())
    .bind(&entry.filter_op)
    .execute(executor)
    .await?;
    Ok(())
}

#[async_trait]
impl ServiceLookup for PgRepository {
    async fn id_by_name(&self, name: &str) -> Result<i64, ComplianceError> {
        sqlx::query_scalar::<_, i64>("SELECT id::bigint FROM service WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ComplianceError::not_found(format!("Service '{}' not found", name)))
    }

    async fn name_by_id(&self, id: i64) -> Result<String, ComplianceError> {
        sqlx::query_scalar::<_, String>("SELECT name FROM service WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ComplianceError::not_found(format!("Service {} not found", id)))
    }
}

#[async_trait]
impl AppLookup for PgRepository {
    async fn app_id_by_name(&self, name: &str) -> Result<i64, ComplianceError> {
        sqlx::query_scalar::<_, i64>("SELECT id::bigint FROM app WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ComplianceError::not_found(format!("App '{}' not found", name)))
    }
}

#[async_trait]
impl RoleStore for PgRepository {
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, ComplianceError> {
        let sql = format!("SELECT {} FROM role WHERE name = $1", ROLE_COLUMNS);
        Ok(sqlx::query_as::<_, Role>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Role>, ComplianceError> {
        let sql = format!("SELECT {} FROM role WHERE id = $1", ROLE_COLUMNS);
        Ok(sqlx::query_as::<_, Role>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_with_access(
        &self,
        role: NewRole,
        entries: Vec<AclEntry>,
    ) -> Result<Option<Role>, ComplianceError> {
        let mut tx = self.pool.begin().await?;

        // role_name_unique turns a concurrent create into an empty insert
        let sql = format!(
            "INSERT INTO role (name, description, is_active, created_date, last_modified_date)
             VALUES ($1, $2, true, NOW(), NOW())
             ON CONFLICT (name) DO NOTHING
             RETURNING {}",
            ROLE_COLUMNS
        );
        let created = sqlx::query_as::<_, Role>(&sql)
            .bind(&role.name)
            .bind(&role.description)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(created) = created else {
            tx.rollback().await?;
            debug!("Role '{}' already exists", role.name);
            return Ok(None);
        };

        for entry in &entries {
            insert_entry(&mut *tx, created.id, entry).await?;
        }
        tx.commit().await?;

        Ok(Some(created))
    }

    async fn delete(&self, id: i64) -> Result<(), ComplianceError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM user_to_app_to_role WHERE role_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM role_service_access WHERE role_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM role WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl AclEntryStore for PgRepository {
    async fn entries_for_role(&self, role_id: i64) -> Result<Vec<AclEntry>, ComplianceError> {
        let sql = format!(
            "SELECT {} FROM role_service_access WHERE role_id = $1 ORDER BY id",
            ACL_COLUMNS
        );
        Ok(sqlx::query_as::<_, AclEntry>(&sql)
            .bind(role_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn apply(&self, role_id: i64, changes: &AclChangeSet) -> Result<(), ComplianceError> {
        let detached: Vec<i64> = changes.detached.iter().filter_map(|e| e.id).collect();

        let mut tx = self.pool.begin().await?;
        if !detached.is_empty() {
            sqlx::query("DELETE FROM role_service_access WHERE role_id = $1 AND id = ANY($2)")
                .bind(role_id)
                .bind(&detached)
                .execute(&mut *tx)
                .await?;
        }
        for entry in &changes.added {
            insert_entry(&mut *tx, role_id, entry).await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl AppLinkStore for PgRepository {
    async fn links_for_role(&self, role_id: i64) -> Result<Vec<AppLink>, ComplianceError> {
        let sql = format!(
            "SELECT {} FROM user_to_app_to_role WHERE role_id = $1 ORDER BY id",
            LINK_COLUMNS
        );
        Ok(sqlx::query_as::<_, AppLink>(&sql)
            .bind(role_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn find(
        &self,
        user_id: i64,
        app_id: i64,
        role_id: i64,
    ) -> Result<Option<AppLink>, ComplianceError> {
        let sql = format!(
            "SELECT {} FROM user_to_app_to_role WHERE user_id = $1 AND app_id = $2 AND role_id = $3",
            LINK_COLUMNS
        );
        Ok(sqlx::query_as::<_, AppLink>(&sql)
            .bind(user_id)
            .bind(app_id)
            .bind(role_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create(&self, user_id: i64, app_id: i64, role_id: i64) -> Result<AppLink, ComplianceError> {
        let sql = format!(
            "INSERT INTO user_to_app_to_role (user_id, app_id, role_id) VALUES ($1, $2, $3) RETURNING {}",
            LINK_COLUMNS
        );
        Ok(sqlx::query_as::<_, AppLink>(&sql)
            .bind(user_id)
            .bind(app_id)
            .bind(role_id)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn delete(&self, id: i64) -> Result<(), ComplianceError> {
        sqlx::query("DELETE FROM user_to_app_to_role WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl AdminStore for PgRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<AdminRecord>, ComplianceError> {
        let sql = format!(r#"SELECT {} FROM "user" WHERE id = $1"#, ADMIN_COLUMNS);
        Ok(sqlx::query_as::<_, AdminRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<AdminRecord>, ComplianceError> {
        let sql = format!(r#"SELECT {} FROM "user" WHERE email = $1"#, ADMIN_COLUMNS);
        Ok(sqlx::query_as::<_, AdminRecord>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_admins(&self) -> Result<Vec<AdminRecord>, ComplianceError> {
        let sql = format!(
            r#"SELECT {} FROM "user" WHERE is_sys_admin = true ORDER BY id"#,
            ADMIN_COLUMNS
        );
        Ok(sqlx::query_as::<_, AdminRecord>(&sql).fetch_all(&self.pool).await?)
    }

    async fn current_root(&self) -> Result<Option<AdminRecord>, ComplianceError> {
        let sql = format!(
            r#"SELECT {} FROM "user" WHERE is_root_admin = true LIMIT 1"#,
            ADMIN_COLUMNS
        );
        Ok(sqlx::query_as::<_, AdminRecord>(&sql)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn set_root(&self, id: i64) -> Result<AdminRecord, ComplianceError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(r#"SELECT {} FROM "user" WHERE id = $1 FOR UPDATE"#, ADMIN_COLUMNS);
        let admin = sqlx::query_as::<_, AdminRecord>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ComplianceError::not_found(ADMIN_NOT_FOUND))?;
        if !admin.is_sys_admin {
            return Err(ComplianceError::forbidden(ONLY_ADMINS_CAN_BE_ROOT));
        }

        // Clear first: user_single_root_admin allows one flagged row at any moment
        sqlx::query(r#"UPDATE "user" SET is_root_admin = false WHERE is_root_admin = true AND id <> $1"#)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let sql = format!(
            r#"UPDATE "user" SET is_root_admin = true WHERE id = $1 RETURNING {}"#,
            ADMIN_COLUMNS
        );
        let root = sqlx::query_as::<_, AdminRecord>(&sql)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("Admin '{}' is now root admin", root.email);
        Ok(root)
    }
}

#[async_trait]
impl ServiceReportStore for PgRepository {
    async fn append(&self, report: NewServiceReport) -> Result<ServiceReport, ComplianceError> {
        let sql = format!(
            "INSERT INTO service_report (service_name, user_email, action, request_verb)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            REPORT_COLUMNS
        );
        Ok(sqlx::query_as::<_, ServiceReport>(&sql)
            .bind(&report.service_name)
            .bind(&report.user_email)
            .bind(report.action.label())
            .bind(&report.request_verb)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<ServiceReport>, ComplianceError> {
        let sql = format!(
            "SELECT {} FROM service_report ORDER BY id DESC LIMIT $1 OFFSET $2",
            REPORT_COLUMNS
        );
        Ok(sqlx::query_as::<_, ServiceReport>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn delete_all(&self) -> Result<u64, ComplianceError> {
        let result = sqlx::query("DELETE FROM service_report").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
