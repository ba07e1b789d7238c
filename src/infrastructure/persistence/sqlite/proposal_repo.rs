//! SQLite Proposal Repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::chapter_repo::insert_chapter;
use super::{db_error, decode_ts, decode_u32, encode_ts, DbPool};
use crate::application::ports::{
    CreatedChapter, NewChapter, NewProposal, ProposalRecord, ProposalRepositoryPort,
    RepositoryError, StatusChange,
};
use crate::domain::ProposalStatus;

const PROPOSAL_COLUMNS: &str = "id, chapter_id, proposer_id, title, content, vote_count, \
     vote_deadline, status, ai_generated, created_at";

/// SQLite Proposal Repository
pub struct SqliteProposalRepository {
    pool: DbPool,
}

impl SqliteProposalRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct ProposalRow {
    id: i64,
    chapter_id: i64,
    proposer_id: i64,
    title: String,
    content: String,
    vote_count: i64,
    vote_deadline: String,
    status: String,
    ai_generated: bool,
    created_at: String,
}

impl TryFrom<ProposalRow> for ProposalRecord {
    type Error = RepositoryError;

    fn try_from(row: ProposalRow) -> Result<Self, Self::Error> {
        Ok(ProposalRecord {
            id: row.id,
            chapter_id: row.chapter_id,
            proposer_id: row.proposer_id,
            title: row.title,
            content: row.content,
            vote_count: decode_u32(row.vote_count, "vote_count")?,
            vote_deadline: decode_ts(&row.vote_deadline)?,
            status: ProposalStatus::parse(&row.status)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            ai_generated: row.ai_generated,
            created_at: decode_ts(&row.created_at)?,
        })
    }
}

fn into_records(rows: Vec<ProposalRow>) -> Result<Vec<ProposalRecord>, RepositoryError> {
    rows.into_iter().map(ProposalRecord::try_from).collect()
}

#[async_trait]
impl ProposalRepositoryPort for SqliteProposalRepository {
    async fn insert(&self, proposal: &NewProposal) -> Result<i64, RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO proposals (chapter_id, proposer_id, title, content, vote_count, vote_deadline, status, ai_generated, created_at)
            VALUES (?, ?, ?, ?, 0, ?, ?, ?, ?)
            "#,
        )
        .bind(proposal.chapter_id)
        .bind(proposal.proposer_id)
        .bind(&proposal.title)
        .bind(&proposal.content)
        .bind(encode_ts(&proposal.vote_deadline))
        .bind(ProposalStatus::Voting.as_str())
        .bind(proposal.ai_generated)
        .bind(encode_ts(&proposal.created_at))
        .execute(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(result.last_insert_rowid())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ProposalRecord>, RepositoryError> {
        let row: Option<ProposalRow> =
            sqlx::query_as(&format!("SELECT {} FROM proposals WHERE id = ?", PROPOSAL_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_error)?;

        row.map(ProposalRecord::try_from).transpose()
    }

    async fn find_by_chapter(
        &self,
        chapter_id: i64,
    ) -> Result<Vec<ProposalRecord>, RepositoryError> {
        let rows: Vec<ProposalRow> = sqlx::query_as(&format!(
            "SELECT {} FROM proposals WHERE chapter_id = ? ORDER BY created_at ASC, id ASC",
            PROPOSAL_COLUMNS
        ))
        .bind(chapter_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        into_records(rows)
    }

    async fn find_by_chapter_ranked(
        &self,
        chapter_id: i64,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<ProposalRecord>, RepositoryError> {
        let offset = i64::try_from(offset)
            .map_err(|_| RepositoryError::SerializationError(format!("offset out of range: {}", offset)))?;

        let rows: Vec<ProposalRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM proposals
            WHERE chapter_id = ?
            ORDER BY vote_count DESC, created_at ASC, id ASC
            LIMIT ? OFFSET ?
            "#,
            PROPOSAL_COLUMNS
        ))
        .bind(chapter_id)
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        into_records(rows)
    }

    async fn count_by_chapter(&self, chapter_id: i64) -> Result<u64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM proposals WHERE chapter_id = ?")
            .bind(chapter_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        u64::try_from(count)
            .map_err(|_| RepositoryError::SerializationError(format!("negative count: {}", count)))
    }

    async fn find_expired_voting(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<ProposalRecord>, RepositoryError> {
        let rows: Vec<ProposalRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM proposals
            WHERE status = ? AND vote_deadline < ?
            ORDER BY chapter_id ASC, id ASC
            "#,
            PROPOSAL_COLUMNS
        ))
        .bind(ProposalStatus::Voting.as_str())
        .bind(encode_ts(&now))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        into_records(rows)
    }

    async fn find_expired_voting_by_chapter(
        &self,
        chapter_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Vec<ProposalRecord>, RepositoryError> {
        let rows: Vec<ProposalRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM proposals
            WHERE chapter_id = ? AND status = ? AND vote_deadline < ?
            ORDER BY id ASC
            "#,
            PROPOSAL_COLUMNS
        ))
        .bind(chapter_id)
        .bind(ProposalStatus::Voting.as_str())
        .bind(encode_ts(&now))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;

        into_records(rows)
    }

    async fn commit_finalization(
        &self,
        changes: &[StatusChange],
        promotion: Option<&NewChapter>,
    ) -> Result<Option<CreatedChapter>, RepositoryError> {
        // 未提交的事务在 drop 时回滚
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        for change in changes {
            if !ProposalStatus::Voting.can_transition_to(change.status) {
                return Err(RepositoryError::Conflict(format!(
                    "illegal transition voting -> {} for proposal {}",
                    change.status, change.proposal_id
                )));
            }

            let result = sqlx::query(
                r#"
                UPDATE proposals SET status = ?
                WHERE id = ? AND status = ? AND vote_count = ?
                "#,
            )
            .bind(change.status.as_str())
            .bind(change.proposal_id)
            .bind(ProposalStatus::Voting.as_str())
            .bind(i64::from(change.expected_vote_count))
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

            if result.rows_affected() == 0 {
                return Err(RepositoryError::Conflict(format!(
                    "proposal {} changed since it was read (expected voting with {} votes)",
                    change.proposal_id, change.expected_vote_count
                )));
            }
        }

        let created = match promotion {
            Some(chapter) => Some(insert_chapter(&mut *tx, chapter).await?),
            None => None,
        };

        tx.commit().await.map_err(db_error)?;

        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::ChapterRepositoryPort;
    use crate::test_support::TestContext;

    #[tokio::test]
    async fn test_expired_scan_uses_strict_deadline() {
        let ctx = TestContext::new().await;
        let (_, chapter) = ctx.novel_with_chapter().await;
        let p1 = ctx.proposal(&chapter, 1).await;
        let deadline = ctx.deadline_of(&chapter);

        assert!(ctx.proposals.find_expired_voting(deadline).await.unwrap().is_empty());

        let later = deadline + chrono::Duration::microseconds(1);
        let expired = ctx.proposals.find_expired_voting(later).await.unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, p1);
        assert_eq!(
            ctx.proposals
                .find_expired_voting_by_chapter(chapter.id, later)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_commit_rolls_back_when_counter_moved() {
        let ctx = TestContext::new().await;
        let (novel_id, chapter) = ctx.novel_with_chapter().await;
        let p1 = ctx.proposal_with_votes(&chapter, 1, 2).await;
        let p2 = ctx.proposal_with_votes(&chapter, 2, 1).await;

        let changes = [
            StatusChange {
                proposal_id: p1,
                status: ProposalStatus::Adopted,
                expected_vote_count: 2,
            },
            StatusChange {
                proposal_id: p2,
                status: ProposalStatus::Rejected,
                // 读取后又多了一票
                expected_vote_count: 0,
            },
        ];
        let draft = NewChapter {
            novel_id,
            author_id: 1,
            title: "t".to_string(),
            content: "c".to_string(),
            from_proposal_id: Some(p1),
            created_at: ctx.clock_now(),
        };

        let err = ctx
            .proposals
            .commit_finalization(&changes, Some(&draft))
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Conflict(_)));
        let p1 = ctx.proposals.find_by_id(p1).await.unwrap().unwrap();
        assert_eq!(p1.status, ProposalStatus::Voting);
        assert_eq!(ctx.chapters.find_by_novel(novel_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_commit_refuses_to_leave_terminal_state() {
        let ctx = TestContext::new().await;
        let (_, chapter) = ctx.novel_with_chapter().await;
        let p1 = ctx.proposal(&chapter, 1).await;
        let pending = [StatusChange {
            proposal_id: p1,
            status: ProposalStatus::Pending,
            expected_vote_count: 0,
        }];

        ctx.proposals.commit_finalization(&pending, None).await.unwrap();
        let err = ctx
            .proposals
            .commit_finalization(&pending, None)
            .await
            .unwrap_err();

        assert!(matches!(err, RepositoryError::Conflict(_)));
    }
}
