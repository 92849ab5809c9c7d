use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::models::content::Content;

/// 相关性评分权重
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RankingWeights {
    pub vote_weight: f64,
    pub view_weight: f64,
    pub share_weight: f64,
    pub recency_weight: f64,
}

impl RankingWeights {
    /// 发现页：偏重投票
    pub fn discovery() -> Self {
        Self {
            vote_weight: 3.0,
            view_weight: 0.5,
            share_weight: 2.0,
            recency_weight: 1.0,
        }
    }

    /// 关注页：偏重新鲜度
    pub fn followed() -> Self {
        Self {
            vote_weight: 2.0,
            view_weight: 0.3,
            share_weight: 1.5,
            recency_weight: 2.0,
        }
    }
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self::discovery()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    Discovery,
    Followed,
}

impl FeedKind {
    pub fn weights(&self) -> RankingWeights {
        match self {
            FeedKind::Discovery => RankingWeights::discovery(),
            FeedKind::Followed => RankingWeights::followed(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedContent {
    #[serde(flatten)]
    pub content: Content,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feed {
    pub kind: FeedKind,
    pub items: Vec<RankedContent>,
    pub total: usize,
    pub generated_at: DateTime<Utc>,
}
