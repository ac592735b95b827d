use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::repo_types::{DuplicateUser, NewUser, UniqueField, User};

const USER_COLUMNS: &str = r#"
    id, username, email, password_hash, avatar, bio, location,
    rating, review_count, created_at, updated_at
"#;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    /// First user holding either the email or the username.
    async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> anyhow::Result<Option<User>>;
    /// Fails with a [`DuplicateUser`] error when a unique column collides.
    async fn create(&self, new: NewUser) -> anyhow::Result<User>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    db: PgPool,
}

impl PgUserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await
        .context("find user by id")?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .context("find user by email")?;
        Ok(user)
    }

    async fn find_by_email_or_username(
        &self,
        email: &str,
        username: &str,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE email = $1 OR username = $2
            ORDER BY (email = $1) DESC
            LIMIT 1
            "#
        ))
        .bind(email)
        .bind(username)
        .fetch_optional(&self.db)
        .await
        .context("find user by email or username")?;
        Ok(user)
    }

    async fn create(&self, new: NewUser) -> anyhow::Result<User> {
        let res = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .fetch_one(&self.db)
        .await;

        match res {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                let field = match db_err.constraint() {
                    Some("users_email_key") => UniqueField::Email,
                    _ => UniqueField::Username,
                };
                Err(DuplicateUser(field).into())
            }
            Err(e) => Err(anyhow::Error::new(e).context("insert user")),
        }
    }
}
