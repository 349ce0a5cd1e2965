use crate::adapters::database::records::UserRecord;
use crate::adapters::database::violated_unique_constraint;
use crate::domain::user::{NewUser, User, UserUpdate};
use crate::error::{AppError, Result};
use sqlx::PgConnection;
use uuid::Uuid;

pub const EMAIL_UNIQUE_CONSTRAINT: &str = "users_email_key";
pub const PROVIDER_UID_UNIQUE_CONSTRAINT: &str = "users_provider_uid_key";

const USER_COLUMNS: &str = "id, email, provider_uid, email_verified, is_active, created_at, updated_at";

#[derive(Clone, Debug, Default)]
pub struct UserRepository {}

impl UserRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self {}
    }

    /// Inserts a new, active user.
    ///
    /// # Errors
    /// Returns `AppError::Conflict` if the email or provider id is taken,
    /// `AppError::Database` for any other failure.
    #[tracing::instrument(level = "debug", skip(self, conn, user), err)]
    pub(crate) async fn create(&self, conn: &mut PgConnection, user: &NewUser) -> Result<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            INSERT INTO users (id, email, provider_uid, email_verified, is_active)
            VALUES ($1, $2, $3, $4, TRUE)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(&user.email)
        .bind(user.provider_uid.as_deref())
        .bind(user.email_verified)
        .fetch_one(conn)
        .await
        .map_err(map_write_error)?;

        Ok(record.into())
    }

    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn), err)]
    pub(crate) async fn find_by_id(&self, conn: &mut PgConnection, id: Uuid) -> Result<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(conn)
            .await?;

        Ok(record.map(Into::into))
    }

    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn, email), err)]
    pub(crate) async fn find_by_email(&self, conn: &mut PgConnection, email: &str) -> Result<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(conn)
            .await?;

        Ok(record.map(Into::into))
    }

    /// Lists users newest first. `page` is 1-based; a page past the
    /// addressable range is empty.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn), err)]
    pub(crate) async fn list(&self, conn: &mut PgConnection, page: i64, limit: i64) -> Result<Vec<User>> {
        let Some(offset) = page_offset(page, limit) else {
            return Ok(Vec::new());
        };

        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(conn)
        .await?;

        Ok(records.into_iter().map(Into::into).collect())
    }

    /// # Errors
    /// Returns `AppError::Database` if the query fails.
    #[tracing::instrument(level = "debug", skip(self, conn), err)]
    pub(crate) async fn count(&self, conn: &mut PgConnection) -> Result<i64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users").fetch_one(conn).await?;
        Ok(total)
    }

    /// Applies a partial update and always bumps `updated_at`.
    /// Returns `None` if no user has the given id.
    ///
    /// # Errors
    /// Returns `AppError::Conflict` if the new email is taken.
    #[tracing::instrument(level = "debug", skip(self, conn, update), err)]
    pub(crate) async fn update(&self, conn: &mut PgConnection, id: Uuid, update: &UserUpdate) -> Result<Option<User>> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            r#"
            UPDATE users
            SET email = COALESCE($2, email),
                is_active = COALESCE($3, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.email.as_deref())
        .bind(update.is_active)
        .fetch_optional(conn)
        .await
        .map_err(map_write_error)?;

        Ok(record.map(Into::into))
    }

    /// Returns `false` if no user has the given id.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the update fails.
    #[tracing::instrument(level = "debug", skip(self, conn), err)]
    pub(crate) async fn set_email_verified(&self, conn: &mut PgConnection, id: Uuid, verified: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE users SET email_verified = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(verified)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Returns `false` if no user has the given id.
    ///
    /// # Errors
    /// Returns `AppError::Database` if the deletion fails.
    #[tracing::instrument(level = "debug", skip(self, conn), err)]
    pub(crate) async fn delete(&self, conn: &mut PgConnection, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(conn).await?;
        Ok(result.rows_affected() > 0)
    }
}

fn page_offset(page: i64, limit: i64) -> Option<i64> {
    page.checked_sub(1)?.checked_mul(limit)
}

fn map_write_error(err: sqlx::Error) -> AppError {
    match violated_unique_constraint(&err).as_deref() {
        Some(EMAIL_UNIQUE_CONSTRAINT) => AppError::Conflict("Email already exists".to_string()),
        Some(PROVIDER_UID_UNIQUE_CONSTRAINT) => {
            AppError::Conflict("User already exists in authentication system".to_string())
        }
        _ => AppError::Database(err),
    }
}
