use async_trait::async_trait;
use gate::Role;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{NewUser, PushSubscription, User};

/// Async storage for user records.
///
/// Mutations return the updated record, or `None` when no user has that id.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find(&self, id: Uuid) -> Result<Option<User>, sqlx::Error>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error>;

    /// Insert a new user. Returns `None` when the email is already taken.
    async fn create(&self, user: NewUser) -> Result<Option<User>, sqlx::Error>;

    async fn list(&self) -> Result<Vec<User>, sqlx::Error>;

    async fn complete_onboarding(
        &self,
        id: Uuid,
        display_name: &str,
        bio: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error>;

    async fn set_banned(&self, id: Uuid, is_banned: bool) -> Result<Option<User>, sqlx::Error>;

    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<User>, sqlx::Error>;

    /// Insert or re-assign a subscription; the endpoint is unique.
    async fn save_push_subscription(
        &self,
        user_id: Uuid,
        subscription: &PushSubscription,
    ) -> Result<(), sqlx::Error>;

    /// Returns whether a subscription owned by `user_id` was removed.
    async fn delete_push_subscription(
        &self,
        user_id: Uuid,
        endpoint: &str,
    ) -> Result<bool, sqlx::Error>;
}

/// PostgreSQL-backed [`UserStore`].
#[derive(Clone, Debug)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
    }

    async fn create(&self, user: NewUser) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(
            r#"
            INSERT INTO users (email, name, password_hash, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_optional(&self.pool)
        .await
    }

    async fn list(&self) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM users ORDER BY created_at")
            .fetch_all(&self.pool)
            .await
    }

    async fn complete_onboarding(
        &self,
        id: Uuid,
        display_name: &str,
        bio: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(
            r#"
            UPDATE users
            SET display_name = $2, bio = $3, onboarding_complete = TRUE, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(display_name)
        .bind(bio)
        .fetch_optional(&self.pool)
        .await
    }

    async fn set_banned(&self, id: Uuid, is_banned: bool) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as(
            "UPDATE users SET is_banned = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(is_banned)
        .fetch_optional(&self.pool)
        .await
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as("UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(role.as_str())
            .fetch_optional(&self.pool)
            .await
    }

    async fn save_push_subscription(
        &self,
        user_id: Uuid,
        subscription: &PushSubscription,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO push_subscriptions (endpoint, user_id, p256dh, auth)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (endpoint) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                p256dh = EXCLUDED.p256dh,
                auth = EXCLUDED.auth
            "#,
        )
        .bind(&subscription.endpoint)
        .bind(user_id)
        .bind(&subscription.keys.p256dh)
        .bind(&subscription.keys.auth)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_push_subscription(
        &self,
        user_id: Uuid,
        endpoint: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM push_subscriptions WHERE user_id = $1 AND endpoint = $2")
                .bind(user_id)
                .bind(endpoint)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
