//! SQLite User Directory
//!
//! 账户体系属于外部系统，本地表只镜像 ID 与昵称

use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};
use std::collections::HashMap;

use super::{db_error, DbPool};
use crate::application::ports::{RepositoryError, UserDirectoryPort};

/// SQLite User Directory
pub struct SqliteUserDirectory {
    pool: DbPool,
}

impl SqliteUserDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectoryPort for SqliteUserDirectory {
    async fn exists(&self, user_id: i64) -> Result<bool, RepositoryError> {
        let (found,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM users WHERE id = ?)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(found)
    }

    async fn find_nicknames(
        &self,
        user_ids: &[i64],
    ) -> Result<HashMap<i64, String>, RepositoryError> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT id, nickname FROM users WHERE id IN (");
        let mut separated = builder.separated(", ");
        for id in user_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let rows: Vec<(i64, String)> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        Ok(rows.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::sqlite::{create_pool, run_migrations, DatabaseConfig};
    use crate::test_support::{delete_user, seed_user};

    #[tokio::test]
    async fn test_exists_and_nicknames() {
        let pool = create_pool(&DatabaseConfig::in_memory()).await.unwrap();
        run_migrations(&pool).await.unwrap();
        seed_user(&pool, 1, "alice").await;
        seed_user(&pool, 2, "bob").await;
        seed_user(&pool, 1, "alice2").await;
        let users = SqliteUserDirectory::new(pool.clone());

        assert!(users.exists(1).await.unwrap());
        assert!(!users.exists(3).await.unwrap());

        let names = users.find_nicknames(&[1, 2, 3]).await.unwrap();
        assert_eq!(names.len(), 2);
        assert_eq!(names.get(&1).map(String::as_str), Some("alice2"));
        assert!(users.find_nicknames(&[]).await.unwrap().is_empty());

        delete_user(&pool, 2).await;
        assert!(!users.exists(2).await.unwrap());
    }
}
