use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use std::str::FromStr;

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub user_id: String,
    pub content_id: String,
    pub challenge_id: String,
    pub nb_votes: i64,
    pub created_at: DateTime<Utc>,
}

impl Vote {
    pub fn new(user_id: &str, content_id: &str, challenge_id: &str, nb_votes: i64) -> Self {
        Self {
            user_id: user_id.to_string(),
            content_id: content_id.to_string(),
            challenge_id: challenge_id.to_string(),
            nb_votes,
            created_at: Utc::now(),
        }
    }
}

/// 挑战的投票规则
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteRule {
    /// 同一用户在同一挑战中的票数累加到一条记录
    UnlimitedVotes,
    /// 每个用户每个内容一票
    OneVotePerUser,
}

impl Default for VoteRule {
    fn default() -> Self {
        Self::UnlimitedVotes
    }
}

impl FromStr for VoteRule {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unlimited" | "unlimited_votes" => Ok(VoteRule::UnlimitedVotes),
            "one_vote" | "one_vote_per_user" => Ok(VoteRule::OneVotePerUser),
            other => Err(AppError::Validation(format!("Unknown vote rule: {}", other))),
        }
    }
}

/// 单次投票后的结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteOutcome {
    pub content_id: String,
    pub user_votes: i64,
    pub total_votes: i64,
}
