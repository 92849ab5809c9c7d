use crate::{
    config::Config,
    error::{AppError, Result},
    models::{content::*, ranking::*},
    services::Backend,
    utils::retry::retry_on_conflict,
};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, error};

const CONTENTS: &str = "contents";

/// 新鲜度加分在该时长内线性衰减到 0
const RECENCY_WINDOW_HOURS: f64 = 50.0;

const VOTE_THRESHOLD: i64 = 10;
const VOTE_THRESHOLD_BONUS: f64 = 20.0;
const SHARE_THRESHOLD: i64 = 5;
const SHARE_THRESHOLD_BONUS: f64 = 15.0;
const VIEW_THRESHOLD: i64 = 100;
const VIEW_THRESHOLD_BONUS: f64 = 10.0;

/// 计算作品的相关性分数
pub fn calculate_relevance_score(content: &Content, weights: &RankingWeights, now: DateTime<Utc>) -> f64 {
    let votes = content.vote_count.max(0) as f64;
    let views = content.view_count.max(0) as f64;
    let shares = content.share_count.max(0) as f64;

    let hours = (now - content.created_at).num_minutes().max(0) as f64 / 60.0;
    let recency_bonus = (RECENCY_WINDOW_HOURS - hours).max(0.0) * weights.recency_weight;

    let mut score = votes * weights.vote_weight
        + views * weights.view_weight
        + shares * weights.share_weight
        + recency_bonus;

    if content.vote_count > VOTE_THRESHOLD {
        score += VOTE_THRESHOLD_BONUS;
    }
    if content.share_count > SHARE_THRESHOLD {
        score += SHARE_THRESHOLD_BONUS;
    }
    if content.view_count > VIEW_THRESHOLD {
        score += VIEW_THRESHOLD_BONUS;
    }

    score
}

/// 打分、按 id 去重、降序排列并截断
pub fn rank_contents(
    contents: Vec<Content>,
    weights: &RankingWeights,
    now: DateTime<Utc>,
    limit: usize,
) -> Vec<RankedContent> {
    let mut seen = HashSet::new();
    let mut ranked: Vec<RankedContent> = contents
        .into_iter()
        .filter(|c| seen.insert(c.id.clone()))
        .map(|content| {
            let score = calculate_relevance_score(&content, weights, now);
            RankedContent { content, score }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.content.created_at.cmp(&a.content.created_at))
    });
    ranked.truncate(limit);
    ranked
}

/// 信息流组装
#[derive(Clone)]
pub struct FeedService {
    backend: Backend,
    default_limit: usize,
    max_write_attempts: u32,
}

impl FeedService {
    pub fn new(backend: Backend, config: &Config) -> Self {
        Self {
            backend,
            default_limit: config.default_feed_limit,
            max_write_attempts: config.max_write_attempts,
        }
    }

    /// 发现页
    pub async fn discovery_feed(&self, limit: Option<usize>) -> Result<Feed> {
        debug!("Building discovery feed");

        let contents: Vec<Content> = self.backend.list(CONTENTS, &[]).await?;
        Ok(self.build(FeedKind::Discovery, contents, limit))
    }

    /// 单个挑战下的作品，按发现页权重排序
    pub async fn challenge_feed(&self, challenge_id: &str, limit: Option<usize>) -> Result<Feed> {
        debug!("Building feed for challenge: {}", challenge_id);

        let contents: Vec<Content> = self
            .backend
            .list(CONTENTS, &[("challengeId", challenge_id)])
            .await?;
        Ok(self.build(FeedKind::Discovery, contents, limit))
    }

    /// 关注页：来自关注作者的作品
    pub async fn followed_feed(&self, followed_user_ids: &[String], limit: Option<usize>) -> Result<Feed> {
        debug!("Building followed feed for {} authors", followed_user_ids.len());

        let mut contents = Vec::new();
        for user_id in followed_user_ids {
            let mut authored: Vec<Content> = self
                .backend
                .list(CONTENTS, &[("userId", user_id.as_str())])
                .await?;
            contents.append(&mut authored);
        }

        Ok(self.build(FeedKind::Followed, contents, limit))
    }

    fn build(&self, kind: FeedKind, contents: Vec<Content>, limit: Option<usize>) -> Feed {
        let items = rank_contents(
            contents,
            &kind.weights(),
            Utc::now(),
            limit.unwrap_or(self.default_limit),
        );
        let total = items.len();

        Feed {
            kind,
            items,
            total,
            generated_at: Utc::now(),
        }
    }

    /// 记录浏览、分享或评论；失败只记日志
    pub async fn record_interaction(&self, content_id: &str, interaction: Interaction) {
        if let Err(e) = self.try_record_interaction(content_id, interaction).await {
            error!("Failed to record {:?} on content {}: {}", interaction, content_id, e);
        }
    }

    pub async fn try_record_interaction(&self, content_id: &str, interaction: Interaction) -> Result<Content> {
        let this = self;
        retry_on_conflict("record_interaction", self.max_write_attempts, move || async move {
            let mut content: Content = this
                .backend
                .get(CONTENTS, content_id)
                .await?
                .ok_or_else(|| AppError::not_found("Content"))?;
            let expected = content.version;

            match interaction {
                Interaction::View => content.view_count += 1,
                Interaction::Share => content.share_count += 1,
                Interaction::Comment => content.comment_count += 1,
            }

            this.backend
                .update::<Content>(CONTENTS, content_id, &content, expected)
                .await
        })
        .await
    }
}
