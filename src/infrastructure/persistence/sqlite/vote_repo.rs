//! SQLite Vote Repository
//!
//! 投票行与 `proposals.vote_count` 始终在同一事务中变更。
//! 事务内先执行写语句再读取，避免 SQLite 读锁升级写锁时的 busy 错误。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::{db_error, decode_ts, decode_u32, encode_ts, is_unique_violation, DbPool};
use crate::application::ports::{
    NewVote, RepositoryError, VoteRecord, VoteRepositoryPort, VoteTally,
};
use crate::domain::{ProposalStatus, VotingWindow};

/// SQLite Vote Repository
pub struct SqliteVoteRepository {
    pool: DbPool,
}

impl SqliteVoteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct VoteRow {
    id: i64,
    user_id: i64,
    proposal_id: i64,
    chapter_id: i64,
    voted_at: String,
}

impl TryFrom<VoteRow> for VoteRecord {
    type Error = RepositoryError;

    fn try_from(row: VoteRow) -> Result<Self, Self::Error> {
        Ok(VoteRecord {
            id: row.id,
            user_id: row.user_id,
            proposal_id: row.proposal_id,
            chapter_id: row.chapter_id,
            voted_at: decode_ts(&row.voted_at)?,
        })
    }
}

#[derive(FromRow)]
struct ProposalStateRow {
    status: String,
    vote_deadline: String,
    vote_count: i64,
}

#[async_trait]
impl VoteRepositoryPort for SqliteVoteRepository {
    async fn exists(&self, user_id: i64, proposal_id: i64) -> Result<bool, RepositoryError> {
        let (found,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM votes WHERE user_id = ? AND proposal_id = ?)",
        )
        .bind(user_id)
        .bind(proposal_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(found)
    }

    async fn exists_for_chapter(
        &self,
        user_id: i64,
        chapter_id: i64,
    ) -> Result<bool, RepositoryError> {
        let (found,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM votes WHERE user_id = ? AND chapter_id = ?)",
        )
        .bind(user_id)
        .bind(chapter_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)?;

        Ok(found)
    }

    async fn find(
        &self,
        user_id: i64,
        proposal_id: i64,
    ) -> Result<Option<VoteRecord>, RepositoryError> {
        let row: Option<VoteRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, proposal_id, chapter_id, voted_at
            FROM votes WHERE user_id = ? AND proposal_id = ?
            "#,
        )
        .bind(user_id)
        .bind(proposal_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        row.map(VoteRecord::try_from).transpose()
    }

    async fn record(&self, vote: &NewVote) -> Result<VoteTally, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        // 条件自增：只有仍在投票中且未到截止时间的提案才计票
        let counted: Option<(i64,)> = sqlx::query_as(
            r#"
            UPDATE proposals SET vote_count = vote_count + 1
            WHERE id = ? AND chapter_id = ? AND status = ? AND vote_deadline > ?
            RETURNING vote_count
            "#,
        )
        .bind(vote.proposal_id)
        .bind(vote.chapter_id)
        .bind(ProposalStatus::Voting.as_str())
        .bind(encode_ts(&vote.voted_at))
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?;

        let Some((vote_count,)) = counted else {
            return Err(RepositoryError::Conflict(format!(
                "proposal {} is not open for voting",
                vote.proposal_id
            )));
        };

        let inserted = sqlx::query(
            "INSERT INTO votes (user_id, proposal_id, chapter_id, voted_at) VALUES (?, ?, ?, ?)",
        )
        .bind(vote.user_id)
        .bind(vote.proposal_id)
        .bind(vote.chapter_id)
        .bind(encode_ts(&vote.voted_at))
        .execute(&mut *tx)
        .await;

        let vote_id = match inserted {
            Ok(result) => result.last_insert_rowid(),
            Err(e) if is_unique_violation(&e) => {
                return Err(RepositoryError::Duplicate(format!(
                    "user {} already voted in chapter {}",
                    vote.user_id, vote.chapter_id
                )));
            }
            Err(e) => return Err(db_error(e)),
        };

        tx.commit().await.map_err(db_error)?;

        Ok(VoteTally {
            vote_id,
            proposal_id: vote.proposal_id,
            vote_count: decode_u32(vote_count, "vote_count")?,
        })
    }

    async fn retract(
        &self,
        user_id: i64,
        proposal_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<VoteTally>, RepositoryError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let deleted: Option<(i64,)> =
            sqlx::query_as("DELETE FROM votes WHERE user_id = ? AND proposal_id = ? RETURNING id")
                .bind(user_id)
                .bind(proposal_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error)?;

        let Some((vote_id,)) = deleted else {
            return Ok(None);
        };

        let state: ProposalStateRow = sqlx::query_as(
            "SELECT status, vote_deadline, vote_count FROM proposals WHERE id = ?",
        )
        .bind(proposal_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?
        .ok_or_else(|| RepositoryError::NotFound(format!("proposal {}", proposal_id)))?;

        let status = ProposalStatus::parse(&state.status)
            .map_err(|e| RepositoryError::SerializationError(e.to_string()))?;
        let deadline = decode_ts(&state.vote_deadline)?;
        if status != ProposalStatus::Voting || !VotingWindow::is_open(deadline, now) {
            return Err(RepositoryError::Conflict(format!(
                "proposal {} is no longer open for voting",
                proposal_id
            )));
        }

        if state.vote_count <= 0 {
            return Err(RepositoryError::Inconsistent(format!(
                "proposal {} has vote row {} but vote_count {}",
                proposal_id, vote_id, state.vote_count
            )));
        }

        let (vote_count,): (i64,) = sqlx::query_as(
            "UPDATE proposals SET vote_count = vote_count - 1 WHERE id = ? RETURNING vote_count",
        )
        .bind(proposal_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;

        Ok(Some(VoteTally {
            vote_id,
            proposal_id,
            vote_count: decode_u32(vote_count, "vote_count")?,
        }))
    }

    async fn count_for_proposal(&self, proposal_id: i64) -> Result<u32, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM votes WHERE proposal_id = ?")
            .bind(proposal_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;

        decode_u32(count, "vote rows")
    }
}
