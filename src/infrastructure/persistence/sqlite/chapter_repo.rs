//! SQLite Chapter Repository

use async_trait::async_trait;
use sqlx::{FromRow, SqliteConnection};

use super::{db_error, decode_ts, decode_u32, encode_ts, is_unique_violation, DbPool};
use crate::application::ports::{
    ChapterCreationPort, ChapterRecord, ChapterRepositoryPort, CreatedChapter, NewChapter,
    RepositoryError,
};

const CHAPTER_COLUMNS: &str =
    "id, novel_id, chapter_number, author_id, title, content, from_proposal_id, created_at";

/// SQLite Chapter Repository
pub struct SqliteChapterRepository {
    pool: DbPool,
}

impl SqliteChapterRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ChapterRow {
    id: i64,
    novel_id: i64,
    chapter_number: i64,
    author_id: i64,
    title: String,
    content: String,
    from_proposal_id: Option<i64>,
    created_at: String,
}

impl TryFrom<ChapterRow> for ChapterRecord {
    type Error = RepositoryError;

    fn try_from(row: ChapterRow) -> Result<Self, Self::Error> {
        Ok(ChapterRecord {
            id: row.id,
            novel_id: row.novel_id,
            chapter_number: decode_u32(row.chapter_number, "chapter_number")?,
            author_id: row.author_id,
            title: row.title,
            content: row.content,
            from_proposal_id: row.from_proposal_id,
            created_at: decode_ts(&row.created_at)?,
        })
    }
}

/// 插入章节并分配序号（单条语句完成 `max + 1` 与写入）
///
/// 结算事务与独立创建共用，序号冲突或同一提案重复晋升都返回 `Duplicate`
pub(super) async fn insert_chapter(
    conn: &mut SqliteConnection,
    chapter: &NewChapter,
) -> Result<CreatedChapter, RepositoryError> {
    let (id, chapter_number): (i64, i64) = sqlx::query_as(
        r#"
        INSERT INTO chapters (novel_id, chapter_number, author_id, title, content, from_proposal_id, created_at)
        SELECT ?, COALESCE(MAX(chapter_number), 0) + 1, ?, ?, ?, ?, ?
        FROM chapters
        WHERE novel_id = ?
        RETURNING id, chapter_number
        "#,
    )
    .bind(chapter.novel_id)
    .bind(chapter.author_id)
    .bind(&chapter.title)
    .bind(&chapter.content)
    .bind(chapter.from_proposal_id)
    .bind(encode_ts(&chapter.created_at))
    .bind(chapter.novel_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            RepositoryError::Duplicate(format!(
                "chapter for novel {} (from proposal {:?}): {}",
                chapter.novel_id, chapter.from_proposal_id, e
            ))
        } else {
            db_error(e)
        }
    })?;

    Ok(CreatedChapter {
        id,
        chapter_number: decode_u32(chapter_number, "chapter_number")?,
    })
}

#[async_trait]
impl ChapterRepositoryPort for SqliteChapterRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<ChapterRecord>, RepositoryError> {
        let row: Option<ChapterRow> =
            sqlx::query_as(&format!("SELECT {} FROM chapters WHERE id = ?", CHAPTER_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        row.map(ChapterRecord::try_from).transpose()
    }

    async fn find_latest_by_novel(
        &self,
        novel_id: i64,
    ) -> Result<Option<ChapterRecord>, RepositoryError> {
        let row: Option<ChapterRow> = sqlx::query_as(&format!(
            "SELECT {} FROM chapters WHERE novel_id = ? ORDER BY chapter_number DESC LIMIT 1",
            CHAPTER_COLUMNS
        ))
        .bind(novel_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(ChapterRecord::try_from).transpose()
    }

    async fn find_by_origin_proposal(
        &self,
        proposal_id: i64,
    ) -> Result<Option<ChapterRecord>, RepositoryError> {
        let row: Option<ChapterRow> = sqlx::query_as(&format!(
            "SELECT {} FROM chapters WHERE from_proposal_id = ?",
            CHAPTER_COLUMNS
        ))
        .bind(proposal_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(ChapterRecord::try_from).transpose()
    }

    async fn find_by_novel(&self, novel_id: i64) -> Result<Vec<ChapterRecord>, RepositoryError> {
        let rows: Vec<ChapterRow> = sqlx::query_as(&format!(
            "SELECT {} FROM chapters WHERE novel_id = ? ORDER BY chapter_number ASC",
            CHAPTER_COLUMNS
        ))
        .bind(novel_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        rows.into_iter().map(ChapterRecord::try_from).collect()
    }
}

#[async_trait]
impl ChapterCreationPort for SqliteChapterRepository {
    async fn create_chapter(&self, chapter: &NewChapter) -> Result<CreatedChapter, RepositoryError> {
        let mut conn = self.pool.acquire().await.map_err(db_error)?;
        insert_chapter(&mut *conn, chapter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TestContext;

    fn draft(novel_id: i64, from_proposal_id: Option<i64>, ctx: &TestContext) -> NewChapter {
        NewChapter {
            novel_id,
            author_id: 1,
            title: "下一章".to_string(),
            content: "正文".to_string(),
            from_proposal_id,
            created_at: ctx.clock_now(),
        }
    }

    #[tokio::test]
    async fn test_chapter_numbers_are_sequential_per_novel() {
        let ctx = TestContext::new().await;
        let (novel_a, first) = ctx.novel_with_chapter().await;
        let novel_b = ctx.novel().await;

        let second = ctx.chapters.create_chapter(&draft(novel_a, None, &ctx)).await.unwrap();
        let other = ctx.chapters.create_chapter(&draft(novel_b, None, &ctx)).await.unwrap();

        assert_eq!(first.chapter_number, 1);
        assert_eq!(second.chapter_number, 2);
        assert_eq!(other.chapter_number, 1);

        let latest = ctx.chapters.find_latest_by_novel(novel_a).await.unwrap().unwrap();
        assert_eq!(latest.id, second.id);
        assert_eq!(ctx.chapters.find_by_novel(novel_a).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_one_chapter_per_origin_proposal() {
        let ctx = TestContext::new().await;
        let (novel_id, chapter) = ctx.novel_with_chapter().await;
        let proposal_id = ctx.proposal(&chapter, 1).await;

        let created = ctx
            .chapters
            .create_chapter(&draft(novel_id, Some(proposal_id), &ctx))
            .await
            .unwrap();
        let err = ctx
            .chapters
            .create_chapter(&draft(novel_id, Some(proposal_id), &ctx))
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Duplicate(_)));
        let origin = ctx
            .chapters
            .find_by_origin_proposal(proposal_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(origin.id, created.id);
    }
}
