//! PostgreSQL store implementation.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;

use crate::error::{ControlError, ControlResult};
use crate::types::{
    DeploymentRecord, DeploymentStatus, EnvVariable, PlatformSettings, RecordId, Tenant, TenantId,
};

use super::{DeploymentFilter, PlatformStore};

/// PostgreSQL-backed platform store.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect to PostgreSQL and create a new store.
    ///
    /// The required tables are created if they don't exist.
    pub async fn new(url: &str) -> ControlResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(url)
            .await?;

        let store = Self { pool };
        store.ensure_schema().await?;

        Ok(store)
    }

    /// Create a store from an existing connection pool.
    pub async fn from_pool(pool: PgPool) -> ControlResult<Self> {
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Ensure the required tables exist.
    async fn ensure_schema(&self) -> ControlResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tenants (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                slug TEXT NOT NULL,
                project_id TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS env_variables (
                id TEXT PRIMARY KEY,
                tenant_id TEXT NOT NULL REFERENCES tenants(id) ON DELETE CASCADE,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                remote_id TEXT,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS deployments (
                id TEXT PRIMARY KEY,
                tenant_id TEXT,
                deployment_id TEXT,
                url TEXT,
                status TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS platform_settings (
                id INT PRIMARY KEY CHECK (id = 1),
                credentials JSONB NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_env_variables_tenant
            ON env_variables (tenant_id)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_deployments_tenant_status
            ON deployments (tenant_id, status)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_deployments_created_at
            ON deployments (created_at DESC)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn row_to_tenant(row: &sqlx::postgres::PgRow) -> Tenant {
        Tenant {
            id: TenantId::new(row.get::<String, _>("id")),
            name: row.get("name"),
            slug: row.get("slug"),
            project_id: row.get("project_id"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    fn row_to_env_variable(row: &sqlx::postgres::PgRow) -> EnvVariable {
        EnvVariable {
            id: RecordId::new(row.get::<String, _>("id")),
            tenant_id: TenantId::new(row.get::<String, _>("tenant_id")),
            key: row.get("key"),
            value: row.get("value"),
            remote_id: row.get("remote_id"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    fn row_to_deployment(row: &sqlx::postgres::PgRow) -> ControlResult<DeploymentRecord> {
        let status_str: String = row.get("status");
        let status: DeploymentStatus = status_str.parse().map_err(|e| {
            ControlError::Serialisation(format!("failed to parse status '{status_str}': {e}"))
        })?;

        Ok(DeploymentRecord {
            id: RecordId::new(row.get::<String, _>("id")),
            tenant_id: row
                .get::<Option<String>, _>("tenant_id")
                .map(TenantId::new),
            deployment_id: row.get("deployment_id"),
            url: row.get("url"),
            status,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl PlatformStore for PostgresStore {
    async fn insert_tenant(&self, tenant: &Tenant) -> ControlResult<()> {
        sqlx::query(
            r#"
            INSERT INTO tenants (id, name, slug, project_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(tenant.id.as_str())
        .bind(&tenant.name)
        .bind(&tenant.slug)
        .bind(&tenant.project_id)
        .bind(tenant.created_at)
        .bind(tenant.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_tenant(&self, id: &TenantId) -> ControlResult<Option<Tenant>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, slug, project_id, created_at, updated_at
            FROM tenants
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Self::row_to_tenant))
    }

    async fn list_tenants(&self) -> ControlResult<Vec<Tenant>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, slug, project_id, created_at, updated_at
            FROM tenants
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::row_to_tenant).collect())
    }

    async fn set_tenant_project(&self, id: &TenantId, project_id: &str) -> ControlResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE tenants
            SET project_id = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(project_id)
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ControlError::TenantNotFound(id.to_string()));
        }

        Ok(())
    }

    async fn delete_tenant(&self, id: &TenantId) -> ControlResult<()> {
        // Detach deployments first so cancellation history survives; env
        // variables cascade via the foreign key.
        sqlx::query(
            r#"
            UPDATE deployments
            SET tenant_id = NULL, updated_at = NOW()
            WHERE tenant_id = $1
            "#,
        )
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        let result = sqlx::query(r#"DELETE FROM tenants WHERE id = $1"#)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ControlError::TenantNotFound(id.to_string()));
        }

        Ok(())
    }

    async fn insert_env_variable(&self, variable: &EnvVariable) -> ControlResult<()> {
        sqlx::query(
            r#"
            INSERT INTO env_variables (id, tenant_id, key, value, remote_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(variable.id.as_str())
        .bind(variable.tenant_id.as_str())
        .bind(&variable.key)
        .bind(&variable.value)
        .bind(&variable.remote_id)
        .bind(variable.created_at)
        .bind(variable.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_env_variables(&self, tenant_id: &TenantId) -> ControlResult<Vec<EnvVariable>> {
        let rows = sqlx::query(
            r#"
            SELECT id, tenant_id, key, value, remote_id, created_at, updated_at
            FROM env_variables
            WHERE tenant_id = $1
            ORDER BY key
            "#,
        )
        .bind(tenant_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::row_to_env_variable).collect())
    }

    async fn mark_env_pushed(&self, id: &RecordId, remote_id: &str) -> ControlResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE env_variables
            SET remote_id = $1, updated_at = NOW()
            WHERE id = $2
            "#,
        )
        .bind(remote_id)
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ControlError::EnvVariableNotFound(id.to_string()));
        }

        Ok(())
    }

    async fn delete_env_variable(&self, id: &RecordId) -> ControlResult<()> {
        let result = sqlx::query(r#"DELETE FROM env_variables WHERE id = $1"#)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ControlError::EnvVariableNotFound(id.to_string()));
        }

        Ok(())
    }

    async fn insert_deployment(&self, record: &DeploymentRecord) -> ControlResult<()> {
        sqlx::query(
            r#"
            INSERT INTO deployments (id, tenant_id, deployment_id, url, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(record.id.as_str())
        .bind(record.tenant_id.as_ref().map(TenantId::as_str))
        .bind(&record.deployment_id)
        .bind(&record.url)
        .bind(record.status.as_str())
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_deployment(&self, id: &RecordId) -> ControlResult<Option<DeploymentRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, tenant_id, deployment_id, url, status, created_at, updated_at
            FROM deployments
            WHERE id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(Self::row_to_deployment(&r)?)),
            None => Ok(None),
        }
    }

    async fn list_deployments(
        &self,
        filter: &DeploymentFilter,
    ) -> ControlResult<Vec<DeploymentRecord>> {
        let mut query = String::from(
            r#"
            SELECT id, tenant_id, deployment_id, url, status, created_at, updated_at
            FROM deployments
            WHERE 1=1
            "#,
        );

        let mut params: Vec<String> = Vec::new();

        if let Some(ref tenant_id) = filter.tenant_id {
            params.push(tenant_id.as_str().to_owned());
            query.push_str(&format!(" AND tenant_id = ${}", params.len()));
        }

        if let Some(status) = filter.status {
            params.push(status.as_str().to_owned());
            query.push_str(&format!(" AND status = ${}", params.len()));
        }

        query.push_str(" ORDER BY created_at DESC");

        if let Some(limit) = filter.limit {
            query.push_str(&format!(" LIMIT {limit}"));
        }

        if let Some(offset) = filter.offset {
            query.push_str(&format!(" OFFSET {offset}"));
        }

        let mut sqlx_query = sqlx::query(&query);
        for param in &params {
            sqlx_query = sqlx_query.bind(param);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;

        rows.iter().map(Self::row_to_deployment).collect()
    }

    async fn update_deployment_status(
        &self,
        id: &RecordId,
        status: DeploymentStatus,
        url: Option<&str>,
    ) -> ControlResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE deployments
            SET status = $1, url = COALESCE($2, url), updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(status.as_str())
        .bind(url)
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ControlError::DeploymentNotFound(id.to_string()));
        }

        Ok(())
    }

    async fn delete_deployment(&self, id: &RecordId) -> ControlResult<()> {
        let result = sqlx::query(r#"DELETE FROM deployments WHERE id = $1"#)
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ControlError::DeploymentNotFound(id.to_string()));
        }

        Ok(())
    }

    async fn get_settings(&self) -> ControlResult<PlatformSettings> {
        let row = sqlx::query(r#"SELECT credentials FROM platform_settings WHERE id = 1"#)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => {
                let credentials_json: serde_json::Value = r.get("credentials");
                let credentials = serde_json::from_value(credentials_json).map_err(|e| {
                    ControlError::Serialisation(format!("failed to deserialise credentials: {e}"))
                })?;
                Ok(PlatformSettings { credentials })
            }
            None => Ok(PlatformSettings::default()),
        }
    }

    async fn put_settings(&self, settings: &PlatformSettings) -> ControlResult<()> {
        let credentials_json = serde_json::to_value(&settings.credentials).map_err(|e| {
            ControlError::Serialisation(format!("failed to serialise credentials: {e}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO platform_settings (id, credentials)
            VALUES (1, $1)
            ON CONFLICT (id) DO UPDATE
            SET credentials = EXCLUDED.credentials
            "#,
        )
        .bind(&credentials_json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl std::fmt::Debug for PostgresStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Credential;

    fn get_database_url() -> Option<String> {
        std::env::var("DATABASE_URL").ok()
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL (set DATABASE_URL)"]
    async fn tenant_lifecycle() {
        let url = get_database_url().expect("DATABASE_URL not set");
        let store = PostgresStore::new(&url).await.expect("failed to connect");

        let tenant = Tenant::new("Acme Corp", "acme-corp");
        let id = tenant.id.clone();

        store.insert_tenant(&tenant).await.expect("insert failed");

        let retrieved = store
            .get_tenant(&id)
            .await
            .expect("get failed")
            .expect("tenant not found");
        assert_eq!(retrieved.name, "Acme Corp");

        store
            .set_tenant_project(&id, "prj_123")
            .await
            .expect("update failed");
        let retrieved = store
            .get_tenant(&id)
            .await
            .expect("get failed")
            .expect("not found");
        assert_eq!(retrieved.project_id.as_deref(), Some("prj_123"));

        store.delete_tenant(&id).await.expect("delete failed");
        assert!(store.get_tenant(&id).await.expect("get failed").is_none());
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL (set DATABASE_URL)"]
    async fn deployment_lifecycle() {
        let url = get_database_url().expect("DATABASE_URL not set");
        let store = PostgresStore::new(&url).await.expect("failed to connect");

        let record = DeploymentRecord::new(None, Some("dpl_pg_test".to_owned()), None);
        let id = record.id.clone();

        store.insert_deployment(&record).await.expect("insert failed");

        let queued = store
            .list_deployments(&DeploymentFilter::new().with_status(DeploymentStatus::Queued))
            .await
            .expect("list failed");
        assert!(queued.iter().any(|r| r.id == id));

        store
            .update_deployment_status(&id, DeploymentStatus::Canceled, None)
            .await
            .expect("update failed");

        let retrieved = store
            .get_deployment(&id)
            .await
            .expect("get failed")
            .expect("not found");
        assert_eq!(retrieved.status, DeploymentStatus::Canceled);

        store.delete_deployment(&id).await.expect("delete failed");
        assert!(store.delete_deployment(&id).await.is_err());
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL (set DATABASE_URL)"]
    async fn settings_round_trip() {
        let url = get_database_url().expect("DATABASE_URL not set");
        let store = PostgresStore::new(&url).await.expect("failed to connect");

        let settings = PlatformSettings {
            credentials: vec![Credential {
                account_name: "Acme".to_owned(),
                vercel_token: "tok".to_owned(),
                vercel_team_id: Some("team_1".to_owned()),
                active: true,
            }],
        };
        store.put_settings(&settings).await.expect("put failed");

        let stored = store.get_settings().await.expect("get failed");
        assert_eq!(stored.credentials.len(), 1);
        assert_eq!(stored.credentials[0].vercel_token, "tok");
    }
}
