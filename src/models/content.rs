use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::models::vote::Vote;

/// 挑战作品，带聚合计数
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub id: String,
    pub user_id: String,
    pub challenge_id: Option<String>,
    #[serde(default)]
    pub vote_count: i64,
    #[serde(default)]
    pub view_count: i64,
    #[serde(default)]
    pub share_count: i64,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default)]
    pub voters: Vec<Vote>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

impl Content {
    /// 投票人列表中的票数总和
    pub fn voter_total(&self) -> i64 {
        self.voters.iter().map(|v| v.nb_votes).sum()
    }

    pub fn votes_by(&self, user_id: &str) -> i64 {
        self.voters
            .iter()
            .filter(|v| v.user_id == user_id)
            .map(|v| v.nb_votes)
            .sum()
    }
}

/// 计数器类交互
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Interaction {
    View,
    Share,
    Comment,
}
