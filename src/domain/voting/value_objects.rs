//! Voting Context - Value Objects

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::VotingError;

/// 提案标题最大长度（字符）
pub const MAX_TITLE_CHARS: usize = 60;

/// 提案正文最大长度（字符）
pub const MAX_CONTENT_CHARS: usize = 5000;

/// 提案状态
///
/// 状态机:
/// - `Voting` 为初始状态
/// - `Adopted` / `Rejected` / `Pending` 只能由结算任务从 `Voting` 转入
/// - `Deleted` 只能由管理操作进入，结算任务不会产生
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalStatus {
    /// 投票中
    Voting,
    /// 已采纳（已晋升为新章节）
    Adopted,
    /// 未采纳
    Rejected,
    /// 平票或无人投票，等待人工处理
    Pending,
    /// 已删除
    Deleted,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Voting => "voting",
            ProposalStatus::Adopted => "adopted",
            ProposalStatus::Rejected => "rejected",
            ProposalStatus::Pending => "pending",
            ProposalStatus::Deleted => "deleted",
        }
    }

    pub fn parse(s: &str) -> Result<Self, VotingError> {
        match s {
            "voting" => Ok(ProposalStatus::Voting),
            "adopted" => Ok(ProposalStatus::Adopted),
            "rejected" => Ok(ProposalStatus::Rejected),
            "pending" => Ok(ProposalStatus::Pending),
            "deleted" => Ok(ProposalStatus::Deleted),
            other => Err(VotingError::UnknownStatus(other.to_string())),
        }
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProposalStatus::Voting)
    }

    /// 状态迁移是否合法（终态不可回到 Voting）
    pub fn can_transition_to(&self, next: ProposalStatus) -> bool {
        matches!(
            (self, next),
            (
                ProposalStatus::Voting,
                ProposalStatus::Adopted | ProposalStatus::Rejected | ProposalStatus::Pending
            )
        )
    }
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 投票窗口
///
/// 截止时间 = 章节创建时间 + 窗口长度，创建提案时确定，之后不可变
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VotingWindow(Duration);

impl VotingWindow {
    pub fn from_secs(secs: u64) -> Result<Self, VotingError> {
        if secs == 0 {
            return Err(VotingError::InvalidWindow("窗口长度不能为 0".to_string()));
        }
        let secs = i64::try_from(secs)
            .map_err(|_| VotingError::InvalidWindow(format!("窗口过长: {}s", secs)))?;
        Duration::try_seconds(secs)
            .map(Self)
            .ok_or_else(|| VotingError::InvalidWindow(format!("窗口过长: {}s", secs)))
    }

    pub fn duration(&self) -> Duration {
        self.0
    }

    /// 计算章节的投票截止时间
    pub fn deadline_for(&self, chapter_created_at: DateTime<Utc>) -> DateTime<Utc> {
        chapter_created_at + self.0
    }

    /// 投票是否仍然开放（严格早于截止时间）
    pub fn is_open(deadline: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now < deadline
    }
}

/// 提案标题
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalTitle(String);

impl ProposalTitle {
    pub fn new(title: impl Into<String>) -> Result<Self, VotingError> {
        let title = title.into();
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(VotingError::InvalidTitle("标题不能为空".to_string()));
        }
        if trimmed.chars().count() > MAX_TITLE_CHARS {
            return Err(VotingError::InvalidTitle(format!(
                "标题长度不能超过{}字符",
                MAX_TITLE_CHARS
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// 提案正文
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalContent(String);

impl ProposalContent {
    pub fn new(content: impl Into<String>) -> Result<Self, VotingError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(VotingError::InvalidContent("正文不能为空".to_string()));
        }
        if content.chars().count() > MAX_CONTENT_CHARS {
            return Err(VotingError::InvalidContent(format!(
                "正文长度不能超过{}字符",
                MAX_CONTENT_CHARS
            )));
        }
        Ok(Self(content))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_status_round_trip_through_storage_form() {
        for status in [
            ProposalStatus::Voting,
            ProposalStatus::Adopted,
            ProposalStatus::Rejected,
            ProposalStatus::Pending,
            ProposalStatus::Deleted,
        ] {
            assert_eq!(ProposalStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(ProposalStatus::parse("closed").is_err());
    }

    #[test]
    fn test_terminal_states_never_reopen() {
        assert!(ProposalStatus::Voting.can_transition_to(ProposalStatus::Adopted));
        assert!(ProposalStatus::Voting.can_transition_to(ProposalStatus::Pending));
        assert!(!ProposalStatus::Voting.can_transition_to(ProposalStatus::Deleted));
        assert!(!ProposalStatus::Pending.can_transition_to(ProposalStatus::Voting));
        assert!(!ProposalStatus::Adopted.can_transition_to(ProposalStatus::Rejected));
        assert!(ProposalStatus::Rejected.is_terminal());
    }

    #[test]
    fn test_deadline_is_chapter_creation_plus_window() {
        let window = VotingWindow::from_secs(3 * 24 * 3600).unwrap();
        let created = Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap();
        assert_eq!(
            window.deadline_for(created),
            Utc.with_ymd_and_hms(2025, 8, 4, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_voting_closes_exactly_at_deadline() {
        let deadline = Utc.with_ymd_and_hms(2025, 8, 4, 12, 0, 0).unwrap();
        assert!(VotingWindow::is_open(deadline, deadline - Duration::seconds(1)));
        assert!(!VotingWindow::is_open(deadline, deadline));
        assert!(!VotingWindow::is_open(deadline, deadline + Duration::seconds(1)));
    }

    #[test]
    fn test_zero_window_rejected() {
        assert!(VotingWindow::from_secs(0).is_err());
    }

    #[test]
    fn test_title_limits() {
        assert_eq!(ProposalTitle::new("  王的归来 ").unwrap().as_str(), "王的归来");
        assert!(ProposalTitle::new("   ").is_err());
        assert!(ProposalTitle::new("字".repeat(MAX_TITLE_CHARS)).is_ok());
        assert!(ProposalTitle::new("字".repeat(MAX_TITLE_CHARS + 1)).is_err());
    }

    #[test]
    fn test_content_limits() {
        assert!(ProposalContent::new("").is_err());
        assert!(ProposalContent::new("a".repeat(MAX_CONTENT_CHARS)).is_ok());
        assert!(ProposalContent::new("a".repeat(MAX_CONTENT_CHARS + 1)).is_err());
    }
}
