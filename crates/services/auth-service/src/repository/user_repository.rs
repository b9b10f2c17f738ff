//! User repository backed by PostgreSQL.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr,
};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use common::{AppError, AppResult};
use domain::User;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by exact email address
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Find user by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Persist a new user.
    ///
    /// Fails with `DuplicateUser` if the email is already taken.
    async fn insert(&self, user: User) -> AppResult<User>;

    /// Overwrite the mutable fields of an existing user.
    async fn update(&self, user: User) -> AppResult<User>;
}

/// SeaORM implementation of UserRepository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// Map a unique-index violation to `DuplicateUser`.
fn insert_error(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::DuplicateUser,
        _ => AppError::from(err),
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;

        Ok(result.map(User::from))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id).one(&self.db).await?;

        Ok(result.map(User::from))
    }

    async fn insert(&self, user: User) -> AppResult<User> {
        let active_model = ActiveModel {
            id: Set(user.id),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            is_verified: Set(user.is_verified),
            created_at: Set(user.created_at),
            updated_at: Set(user.updated_at),
        };

        let model = active_model.insert(&self.db).await.map_err(insert_error)?;
        Ok(User::from(model))
    }

    async fn update(&self, user: User) -> AppResult<User> {
        let existing = UserEntity::find_by_id(user.id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: ActiveModel = existing.into();
        active.password_hash = Set(user.password_hash);
        active.is_verified = Set(user.is_verified);
        active.updated_at = Set(user.updated_at);

        let model = active.update(&self.db).await?;
        Ok(User::from(model))
    }
}
