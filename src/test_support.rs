//! 测试夹具：SQLite（默认内存库）+ 手动时钟

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use tempfile::TempDir;

use crate::application::ports::{
    ChapterCreationPort, ChapterRecord, ChapterRepositoryPort, ClockPort, NewChapter,
    NewProposal, NewVote, ProposalRepositoryPort, VoteRepositoryPort,
};
use crate::application::{ChapterPromoter, FinalizeVotingHandler};
use crate::domain::VotingWindow;
use crate::infrastructure::http::{AppState, Repositories, VotingOptions};
use crate::infrastructure::persistence::sqlite::{
    create_pool, encode_ts, run_migrations, DatabaseConfig, DbPool, SqliteChapterRepository,
    SqliteNovelRepository, SqliteProposalRepository, SqliteUserDirectory, SqliteVoteRepository,
};
use crate::infrastructure::ManualClock;

// 小说与账户由外部系统维护，测试里直接写表

pub(crate) async fn seed_novel(pool: &DbPool, title: &str, created_at: DateTime<Utc>) -> i64 {
    sqlx::query("INSERT INTO novels (title, created_at) VALUES (?, ?)")
        .bind(title)
        .bind(encode_ts(&created_at))
        .execute(pool)
        .await
        .unwrap()
        .last_insert_rowid()
}

pub(crate) async fn seed_user(pool: &DbPool, user_id: i64, nickname: &str) {
    sqlx::query(
        "INSERT INTO users (id, nickname) VALUES (?, ?) \
         ON CONFLICT(id) DO UPDATE SET nickname = excluded.nickname",
    )
    .bind(user_id)
    .bind(nickname)
    .execute(pool)
    .await
    .unwrap();
}

pub(crate) async fn delete_user(pool: &DbPool, user_id: i64) {
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool)
        .await
        .unwrap();
}

pub(crate) struct TestContext {
    pub pool: DbPool,
    pub clock: Arc<ManualClock>,
    pub novels: Arc<SqliteNovelRepository>,
    pub chapters: Arc<SqliteChapterRepository>,
    pub proposals: Arc<SqliteProposalRepository>,
    pub votes: Arc<SqliteVoteRepository>,
    pub users: Arc<SqliteUserDirectory>,
    pub window: VotingWindow,
    _dir: Option<TempDir>,
}

impl TestContext {
    pub async fn new() -> Self {
        Self::with_config(&DatabaseConfig::in_memory(), None).await
    }

    /// 文件数据库，多连接，用于并发测试
    pub async fn on_disk(max_connections: u32) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            max_connections,
            ..DatabaseConfig::new(dir.path().join("relay.db"))
        };
        Self::with_config(&config, Some(dir)).await
    }

    async fn with_config(config: &DatabaseConfig, dir: Option<TempDir>) -> Self {
        let pool = create_pool(config).await.unwrap();
        run_migrations(&pool).await.unwrap();

        let start = Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap();

        Self {
            clock: Arc::new(ManualClock::new(start)),
            novels: Arc::new(SqliteNovelRepository::new(pool.clone())),
            chapters: Arc::new(SqliteChapterRepository::new(pool.clone())),
            proposals: Arc::new(SqliteProposalRepository::new(pool.clone())),
            votes: Arc::new(SqliteVoteRepository::new(pool.clone())),
            users: Arc::new(SqliteUserDirectory::new(pool.clone())),
            window: VotingWindow::from_secs(3 * 24 * 3600).unwrap(),
            pool,
            _dir: dir,
        }
    }

    pub fn clock_now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn novel(&self) -> i64 {
        seed_novel(&self.pool, "测试小说", self.clock_now()).await
    }

    /// 新章节的作者固定为用户 1
    pub async fn chapter(&self, novel_id: i64) -> ChapterRecord {
        self.user(1).await;
        let created = self
            .chapters
            .create_chapter(&NewChapter {
                novel_id,
                author_id: 1,
                title: "第一章".to_string(),
                content: "故事从这里开始。".to_string(),
                from_proposal_id: None,
                created_at: self.clock_now(),
            })
            .await
            .unwrap();

        self.chapters.find_by_id(created.id).await.unwrap().unwrap()
    }

    pub async fn novel_with_chapter(&self) -> (i64, ChapterRecord) {
        let novel_id = self.novel().await;
        let chapter = self.chapter(novel_id).await;
        (novel_id, chapter)
    }

    pub async fn user(&self, user_id: i64) {
        seed_user(&self.pool, user_id, &format!("user-{}", user_id)).await;
    }

    pub async fn remove_user(&self, user_id: i64) {
        delete_user(&self.pool, user_id).await;
    }

    pub fn deadline_of(&self, chapter: &ChapterRecord) -> DateTime<Utc> {
        self.window.deadline_for(chapter.created_at)
    }

    /// 把时钟拨到截止时间之后一秒
    pub fn expire(&self, chapter: &ChapterRecord) {
        self.clock.set(self.deadline_of(chapter) + Duration::seconds(1));
    }

    pub async fn proposal(&self, chapter: &ChapterRecord, proposer_id: i64) -> i64 {
        self.user(proposer_id).await;
        self.proposals
            .insert(&NewProposal {
                chapter_id: chapter.id,
                proposer_id,
                title: format!("提案-{}", proposer_id),
                content: "那天夜里，门开了。".to_string(),
                vote_deadline: self.deadline_of(chapter),
                ai_generated: false,
                created_at: self.clock_now(),
            })
            .await
            .unwrap()
    }

    /// 创建提案并由 `votes` 个互不相同的用户投票
    pub async fn proposal_with_votes(
        &self,
        chapter: &ChapterRecord,
        proposer_id: i64,
        votes: u32,
    ) -> i64 {
        let proposal_id = self.proposal(chapter, proposer_id).await;
        for i in 0..i64::from(votes) {
            self.votes
                .record(&NewVote {
                    user_id: 100_000 + proposal_id * 100 + i,
                    proposal_id,
                    chapter_id: chapter.id,
                    voted_at: self.clock_now(),
                })
                .await
                .unwrap();
        }
        proposal_id
    }

    pub async fn vote_count(&self, proposal_id: i64) -> u32 {
        self.proposals
            .find_by_id(proposal_id)
            .await
            .unwrap()
            .unwrap()
            .vote_count
    }

    pub fn promoter(&self) -> Arc<ChapterPromoter> {
        Arc::new(ChapterPromoter::new(
            self.novels.clone(),
            self.chapters.clone(),
            self.users.clone(),
            self.chapters.clone(),
            self.clock.clone(),
        ))
    }

    pub fn finalize_handler(&self) -> FinalizeVotingHandler {
        FinalizeVotingHandler::new(
            self.novels.clone(),
            self.chapters.clone(),
            self.proposals.clone(),
            self.promoter(),
            self.clock.clone(),
        )
    }

    pub fn repositories(&self) -> Repositories {
        Repositories {
            novels: self.novels.clone(),
            chapters: self.chapters.clone(),
            chapter_creation: self.chapters.clone(),
            proposals: self.proposals.clone(),
            votes: self.votes.clone(),
            users: self.users.clone(),
        }
    }

    pub fn app_state(&self) -> AppState {
        AppState::new(
            self.repositories(),
            self.clock.clone(),
            VotingOptions {
                window: self.window,
                default_page_size: 6,
                max_page_size: 50,
            },
        )
    }
}
