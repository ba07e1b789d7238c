//! SQLite Novel Repository

use async_trait::async_trait;
use sqlx::FromRow;

use super::{db_error, decode_ts, decode_u32, DbPool};
use crate::application::ports::{NovelRecord, NovelRepositoryPort, RepositoryError};

/// SQLite Novel Repository
pub struct SqliteNovelRepository {
    pool: DbPool,
}

impl SqliteNovelRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct NovelRow {
    id: i64,
    title: String,
    chapter_count: i64,
    created_at: String,
}

impl TryFrom<NovelRow> for NovelRecord {
    type Error = RepositoryError;

    fn try_from(row: NovelRow) -> Result<Self, Self::Error> {
        Ok(NovelRecord {
            id: row.id,
            title: row.title,
            chapter_count: decode_u32(row.chapter_count, "chapter_count")?,
            created_at: decode_ts(&row.created_at)?,
        })
    }
}

#[async_trait]
impl NovelRepositoryPort for SqliteNovelRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<NovelRecord>, RepositoryError> {
        let row: Option<NovelRow> = sqlx::query_as(
            r#"
            SELECT n.id, n.title, n.created_at,
                   (SELECT COUNT(*) FROM chapters c WHERE c.novel_id = n.id) AS chapter_count
            FROM novels n
            WHERE n.id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(NovelRecord::try_from).transpose()
    }
}
