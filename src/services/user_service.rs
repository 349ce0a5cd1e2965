use crate::adapters::database::DbPool;
use crate::adapters::database::user_repo::UserRepository;
use crate::domain::user::{NewUser, User, UserUpdate};
use crate::error::{AppError, Result};
use uuid::Uuid;

pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Page of users plus the total row count.
#[derive(Debug, Clone)]
pub struct UserPage {
    pub users: Vec<User>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
}

/// Normalizes pagination input: pages start at 1, limits outside
/// `1..=MAX_PAGE_LIMIT` fall back to the default.
#[must_use]
pub fn clamp_pagination(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let page = page.filter(|p| *p >= 1).unwrap_or(1);
    let limit = limit.filter(|l| (1..=MAX_PAGE_LIMIT).contains(l)).unwrap_or(DEFAULT_PAGE_LIMIT);
    (page, limit)
}

/// Direct CRUD over local account records.
#[derive(Clone, Debug)]
pub struct UserService {
    pool: DbPool,
    user_repo: UserRepository,
}

impl UserService {
    #[must_use]
    pub const fn new(pool: DbPool, user_repo: UserRepository) -> Self {
        Self { pool, user_repo }
    }

    /// # Errors
    /// `Conflict` if the email is taken.
    #[tracing::instrument(skip(self, email), err(level = "warn"))]
    pub async fn create(&self, email: &str) -> Result<User> {
        let mut conn = self.pool.acquire().await?;
        self.user_repo
            .create(&mut conn, &NewUser { email: email.to_string(), provider_uid: None, email_verified: false })
            .await
    }

    /// # Errors
    /// `NotFound` for unknown or malformed ids.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn get(&self, id: &str) -> Result<User> {
        let id = parse_id(id)?;
        let mut conn = self.pool.acquire().await?;
        self.user_repo.find_by_id(&mut conn, id).await?.ok_or_else(not_found)
    }

    /// # Errors
    /// `NotFound` if no user has this email.
    #[tracing::instrument(skip(self, email), err(level = "warn"))]
    pub async fn get_by_email(&self, email: &str) -> Result<User> {
        let mut conn = self.pool.acquire().await?;
        self.user_repo.find_by_email(&mut conn, email).await?.ok_or_else(not_found)
    }

    /// # Errors
    /// `Database` if either query fails.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn list(&self, page: i64, limit: i64) -> Result<UserPage> {
        let mut conn = self.pool.acquire().await?;
        let users = self.user_repo.list(&mut conn, page, limit).await?;
        let total = self.user_repo.count(&mut conn).await?;
        Ok(UserPage { users, page, limit, total })
    }

    /// # Errors
    /// `NotFound` for unknown ids, `Conflict` if the new email is taken.
    #[tracing::instrument(skip(self, update), err(level = "warn"))]
    pub async fn update(&self, id: &str, update: &UserUpdate) -> Result<User> {
        let id = parse_id(id)?;
        let mut conn = self.pool.acquire().await?;
        self.user_repo.update(&mut conn, id, update).await?.ok_or_else(not_found)
    }

    /// # Errors
    /// `NotFound` for unknown ids.
    #[tracing::instrument(skip(self), err(level = "warn"))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        let id = parse_id(id)?;
        let mut conn = self.pool.acquire().await?;
        if self.user_repo.delete(&mut conn, id).await? { Ok(()) } else { Err(not_found()) }
    }
}

fn not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id).map_err(|_| not_found())
}
