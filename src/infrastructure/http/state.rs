//! Application State
//!
//! 包含所有 Command/Query Handlers 的应用状态

use std::sync::Arc;

use crate::application::{
    // Command handlers
    CancelVoteHandler, CastVoteHandler, FinalizeVotingHandler, SubmitProposalHandler,
    // Query handlers
    ListChapterProposalsHandler, ListProposalsHandler, VerifyVoteTalliesHandler,
    // Ports
    ChapterCreationPort, ChapterPromoter, ChapterRepositoryPort, ClockPort, NovelRepositoryPort,
    ProposalRepositoryPort, UserDirectoryPort, VoteRepositoryPort,
};
use crate::domain::VotingWindow;

/// 投票相关参数
#[derive(Debug, Clone, Copy)]
pub struct VotingOptions {
    pub window: VotingWindow,
    pub default_page_size: u32,
    pub max_page_size: u32,
}

/// 仓储端口集合
#[derive(Clone)]
pub struct Repositories {
    pub novels: Arc<dyn NovelRepositoryPort>,
    pub chapters: Arc<dyn ChapterRepositoryPort>,
    pub chapter_creation: Arc<dyn ChapterCreationPort>,
    pub proposals: Arc<dyn ProposalRepositoryPort>,
    pub votes: Arc<dyn VoteRepositoryPort>,
    pub users: Arc<dyn UserDirectoryPort>,
}

/// 应用状态
pub struct AppState {
    pub options: VotingOptions,

    // ========== Command Handlers ==========
    pub cast_vote_handler: CastVoteHandler,
    pub cancel_vote_handler: CancelVoteHandler,
    pub submit_proposal_handler: SubmitProposalHandler,
    /// 与定时 Worker 共享，保证单飞
    pub finalize_handler: Arc<FinalizeVotingHandler>,

    // ========== Query Handlers ==========
    pub list_proposals_handler: ListProposalsHandler,
    pub list_chapter_proposals_handler: ListChapterProposalsHandler,
    pub verify_tallies_handler: VerifyVoteTalliesHandler,
}

impl AppState {
    /// 创建应用状态
    pub fn new(repos: Repositories, clock: Arc<dyn ClockPort>, options: VotingOptions) -> Self {
        let promoter = Arc::new(ChapterPromoter::new(
            repos.novels.clone(),
            repos.chapters.clone(),
            repos.users.clone(),
            repos.chapter_creation.clone(),
            clock.clone(),
        ));

        Self {
            options,

            // Command handlers
            cast_vote_handler: CastVoteHandler::new(
                repos.proposals.clone(),
                repos.votes.clone(),
                clock.clone(),
            ),
            cancel_vote_handler: CancelVoteHandler::new(
                repos.proposals.clone(),
                repos.votes.clone(),
                clock.clone(),
            ),
            submit_proposal_handler: SubmitProposalHandler::new(
                repos.chapters.clone(),
                repos.proposals.clone(),
                repos.users.clone(),
                clock.clone(),
                options.window,
            ),
            finalize_handler: Arc::new(FinalizeVotingHandler::new(
                repos.novels.clone(),
                repos.chapters.clone(),
                repos.proposals.clone(),
                promoter,
                clock.clone(),
            )),

            // Query handlers
            list_proposals_handler: ListProposalsHandler::new(
                repos.novels.clone(),
                repos.chapters.clone(),
                repos.proposals.clone(),
                repos.users.clone(),
                clock,
                options.window,
                options.max_page_size,
            ),
            list_chapter_proposals_handler: ListChapterProposalsHandler::new(
                repos.chapters.clone(),
                repos.proposals.clone(),
            ),
            verify_tallies_handler: VerifyVoteTalliesHandler::new(
                repos.chapters,
                repos.proposals,
                repos.votes,
            ),
        }
    }
}
