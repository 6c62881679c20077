//! # Category Repository
//!
//! Categories are created on demand: product creation (manual or bulk)
//! names a category and gets the existing row or a fresh one. `name` is
//! the natural key; there is no delete path.

use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use shop_core::Category;

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Finds a category by its exact name.
    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name
            FROM categories
            WHERE name = ?1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Idempotent upsert-by-name.
    ///
    /// ## Race Safety
    /// Two concurrent creators both succeed: the insert ignores the unique
    /// conflict and the follow-up select returns whichever row won.
    pub async fn find_or_create(&self, name: &str) -> DbResult<Category> {
        let name = name.trim();

        if let Some(category) = self.find_by_name(name).await? {
            return Ok(category);
        }

        debug!(name = %name, "Creating category");

        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO categories (id, name) VALUES (?1, ?2)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(&id)
        .bind(name)
        .execute(&self.pool)
        .await?;

        self.find_by_name(name)
            .await?
            .ok_or_else(|| DbError::not_found("Category", name))
    }

    /// Lists all categories, alphabetically.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name
            FROM categories
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    #[tokio::test]
    async fn test_find_or_create_is_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.categories();

        let first = repo.find_or_create("Beverages").await.unwrap();
        let second = repo.find_or_create("Beverages").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Beverages");
    }

    #[tokio::test]
    async fn test_default_category_is_seeded() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let others = db
            .categories()
            .find_by_name(shop_core::DEFAULT_CATEGORY)
            .await
            .unwrap();

        assert!(others.is_some());
    }

    #[tokio::test]
    async fn test_list_is_sorted() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.categories();

        repo.find_or_create("Snacks").await.unwrap();
        repo.find_or_create("Beverages").await.unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|c| c.name).collect();
        // 'Others' is seeded by migration
        assert_eq!(names, vec!["Beverages", "Others", "Snacks"]);
    }
}
