//! # User Repository
//!
//! Staff accounts. Sales are attributed to users and the performance
//! report rolls up per user. Passwords and sessions live outside this
//! store entirely - rows here carry identity, not credentials.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use shop_core::{Role, User};

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Lists all users, newest first.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, name, role, created_at
            FROM users
            ORDER BY created_at DESC, username
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, name, role, created_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Creates a user.
    ///
    /// ## Errors
    /// * `UniqueViolation` - username already taken
    pub async fn create(
        &self,
        username: &str,
        name: Option<&str>,
        role: Role,
    ) -> DbResult<User> {
        debug!(username = %username, "Creating user");

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.trim().to_string(),
            name: name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
            role,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO users (id, username, name, role, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.name)
        .bind(user.role)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use shop_core::DEFAULT_USER_ID;

    #[tokio::test]
    async fn test_default_users_are_seeded() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let admin = db.users().get_by_id(DEFAULT_USER_ID).await.unwrap().unwrap();
        assert_eq!(admin.username, "admin");
        assert_eq!(admin.role, Role::Admin);

        assert_eq!(db.users().list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_and_fetch() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let user = db
            .users()
            .create("carol", Some("Carol"), Role::Staff)
            .await
            .unwrap();

        let found = db.users().get_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(found.username, "carol");
        assert_eq!(found.role, Role::Staff);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let err = db
            .users()
            .create("admin", None, Role::Staff)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
