//! Document store collaborator for form records.
//!
//! `FormStore` is the seam the handlers talk through; production runs on
//! PostgreSQL with one JSONB column per section, tests run on an in-memory
//! map. Read projections (`find_view`, `list_views`) exclude the password at
//! the store level, so the transform never leaves the database on read paths.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::errors::AppError;
use crate::forms::models::{
    ContactInfo, EmploymentInfo, FinancialInfo, FormRecord, FormView, PersonalInfo, PersonalView,
    Preferences,
};

#[async_trait]
pub trait FormStore: Send + Sync {
    async fn insert(&self, record: &FormRecord) -> Result<(), AppError>;

    /// Full record, password transform included (the merge and secret paths
    /// need it). Not for serving to callers.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<FormRecord>, AppError>;

    /// Redacted single-record projection.
    async fn find_view(&self, id: Uuid) -> Result<Option<FormView>, AppError>;

    /// Redacted list projection.
    async fn list_views(&self) -> Result<Vec<FormView>, AppError>;

    /// Whole-record replace. Returns false when the id does not exist.
    async fn replace(&self, record: &FormRecord) -> Result<bool, AppError>;

    /// Returns false when the id does not exist.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

pub struct PgFormStore {
    pool: PgPool,
}

impl PgFormStore {
    pub fn new(pool: PgPool) -> Self {
        PgFormStore { pool }
    }
}

#[derive(FromRow)]
struct FormRow {
    id: Uuid,
    personal: Json<PersonalInfo>,
    contact: Json<ContactInfo>,
    employment: Json<EmploymentInfo>,
    financial: Json<FinancialInfo>,
    preferences: Json<Preferences>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<FormRow> for FormRecord {
    fn from(row: FormRow) -> Self {
        FormRecord {
            id: row.id,
            personal: row.personal.0,
            contact: row.contact.0,
            employment: row.employment.0,
            financial: row.financial.0,
            preferences: row.preferences.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(FromRow)]
struct FormViewRow {
    id: Uuid,
    personal: Json<PersonalView>,
    contact: Json<ContactInfo>,
    employment: Json<EmploymentInfo>,
    financial: Json<FinancialInfo>,
    preferences: Json<Preferences>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<FormViewRow> for FormView {
    fn from(row: FormViewRow) -> Self {
        FormView {
            id: row.id,
            personal: row.personal.0,
            contact: row.contact.0,
            employment: row.employment.0,
            financial: row.financial.0,
            preferences: row.preferences.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const VIEW_COLUMNS: &str = "id, personal - 'password' AS personal, contact, employment, \
                            financial, preferences, created_at, updated_at";

#[async_trait]
impl FormStore for PgFormStore {
    async fn insert(&self, record: &FormRecord) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO forms
                (id, personal, contact, employment, financial, preferences,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id)
        .bind(Json(&record.personal))
        .bind(Json(&record.contact))
        .bind(Json(&record.employment))
        .bind(Json(&record.financial))
        .bind(Json(&record.preferences))
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<FormRecord>, AppError> {
        let row: Option<FormRow> = sqlx::query_as(
            "SELECT id, personal, contact, employment, financial, preferences, \
             created_at, updated_at FROM forms WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(FormRecord::from))
    }

    async fn find_view(&self, id: Uuid) -> Result<Option<FormView>, AppError> {
        let row: Option<FormViewRow> =
            sqlx::query_as(&format!("SELECT {VIEW_COLUMNS} FROM forms WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(FormView::from))
    }

    async fn list_views(&self) -> Result<Vec<FormView>, AppError> {
        let rows: Vec<FormViewRow> =
            sqlx::query_as(&format!("SELECT {VIEW_COLUMNS} FROM forms ORDER BY created_at"))
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(FormView::from).collect())
    }

    async fn replace(&self, record: &FormRecord) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE forms
            SET personal = $2, contact = $3, employment = $4, financial = $5,
                preferences = $6, updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(record.id)
        .bind(Json(&record.personal))
        .bind(Json(&record.contact))
        .bind(Json(&record.employment))
        .bind(Json(&record.financial))
        .bind(Json(&record.preferences))
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM forms WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
pub mod memory {
    //! In-memory `FormStore` for router-level tests.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct MemoryFormStore {
        inner: Mutex<HashMap<Uuid, FormRecord>>,
    }

    impl MemoryFormStore {
        pub fn get(&self, id: Uuid) -> Option<FormRecord> {
            self.inner.lock().unwrap().get(&id).cloned()
        }

        pub fn len(&self) -> usize {
            self.inner.lock().unwrap().len()
        }

        pub fn ids(&self) -> Vec<Uuid> {
            self.inner.lock().unwrap().keys().copied().collect()
        }
    }

    #[async_trait]
    impl FormStore for MemoryFormStore {
        async fn insert(&self, record: &FormRecord) -> Result<(), AppError> {
            self.inner
                .lock()
                .unwrap()
                .insert(record.id, record.clone());
            Ok(())
        }

        async fn find_by_id(&self, id: Uuid) -> Result<Option<FormRecord>, AppError> {
            Ok(self.get(id))
        }

        async fn find_view(&self, id: Uuid) -> Result<Option<FormView>, AppError> {
            Ok(self.get(id).map(|r| r.redacted()))
        }

        async fn list_views(&self) -> Result<Vec<FormView>, AppError> {
            let mut views: Vec<FormView> = self
                .inner
                .lock()
                .unwrap()
                .values()
                .map(FormRecord::redacted)
                .collect();
            views.sort_by_key(|v| v.created_at);
            Ok(views)
        }

        async fn replace(&self, record: &FormRecord) -> Result<bool, AppError> {
            let mut inner = self.inner.lock().unwrap();
            if !inner.contains_key(&record.id) {
                return Ok(false);
            }
            inner.insert(record.id, record.clone());
            Ok(true)
        }

        async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
            Ok(self.inner.lock().unwrap().remove(&id).is_some())
        }
    }
}
