use crate::{
    config::Config,
    error::{AppError, Result},
    models::{content::Content, vote::*},
    services::{coupon::CouponInventory, Backend},
    utils::retry::retry_on_conflict,
};
use tracing::{debug, error, info};

const CONTENTS: &str = "contents";

/// 投票计数
#[derive(Clone)]
pub struct VoteTally {
    backend: Backend,
    default_rule: VoteRule,
    max_write_attempts: u32,
}

impl VoteTally {
    pub fn new(backend: Backend, config: &Config) -> Self {
        Self {
            backend,
            default_rule: config.vote_rule,
            max_write_attempts: config.max_write_attempts,
        }
    }

    pub fn default_rule(&self) -> VoteRule {
        self.default_rule
    }

    /// 按规则把投票计入作品的投票人列表，并重新计算 `voteCount`
    pub async fn add_vote_to_content(&self, vote: &Vote, rule: VoteRule) -> Result<VoteOutcome> {
        debug!(
            "Adding {} vote(s) from {} to content {} ({:?})",
            vote.nb_votes, vote.user_id, vote.content_id, rule
        );

        if vote.nb_votes <= 0 {
            return Err(AppError::validation("A vote must carry at least one vote"));
        }

        let this = self;
        let saved = retry_on_conflict("add_vote", self.max_write_attempts, move || async move {
            let mut content: Content = this
                .backend
                .get(CONTENTS, &vote.content_id)
                .await?
                .ok_or_else(|| AppError::not_found("Content"))?;
            let expected = content.version;

            apply_vote(&mut content.voters, vote.clone(), rule);
            content.vote_count = tally(&content.voters);

            this.backend
                .update::<Content>(CONTENTS, &content.id, &content, expected)
                .await
        })
        .await?;

        info!(
            "Content {} now has {} votes ({} voters)",
            saved.id,
            saved.vote_count,
            saved.voters.len()
        );

        Ok(VoteOutcome {
            content_id: saved.id.clone(),
            user_votes: saved.votes_by(&vote.user_id),
            total_votes: saved.vote_count,
        })
    }

    /// 使用默认规则投票
    pub async fn cast_vote(&self, vote: &Vote) -> Result<VoteOutcome> {
        self.add_vote_to_content(vote, self.default_rule).await
    }

    /// 先消耗优惠券次数，再计票
    ///
    /// 优惠券剩余次数少于票数时不扣减也不计票。计票失败时优惠券次数不会退回。
    pub async fn vote_with_coupon(
        &self,
        vote: &Vote,
        coupon_id: &str,
        rule: VoteRule,
        inventory: &CouponInventory,
    ) -> Result<VoteOutcome> {
        let uses = u32::try_from(vote.nb_votes)
            .map_err(|_| AppError::Validation(format!("Invalid vote count {}", vote.nb_votes)))?;

        inventory.spend_coupon_usage(coupon_id, uses).await?;

        match self.add_vote_to_content(vote, rule).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                error!(
                    "Coupon {} spent but vote on {} was not recorded: {}",
                    coupon_id, vote.content_id, e
                );
                Err(e)
            }
        }
    }

    /// 挑战下所有作品的票数总和
    pub async fn get_total_votes_for_challenge(&self, challenge_id: &str) -> Result<i64> {
        let contents: Vec<Content> = self
            .backend
            .list(CONTENTS, &[("challengeId", challenge_id)])
            .await?;

        Ok(contents
            .iter()
            .filter(|c| c.challenge_id.as_deref() == Some(challenge_id))
            .map(|c| c.vote_count)
            .sum())
    }

    /// 用户在某个挑战中的投票记录
    pub async fn user_votes_for_challenge(&self, user_id: &str, challenge_id: &str) -> Result<Vec<Vote>> {
        let contents: Vec<Content> = self
            .backend
            .list(CONTENTS, &[("challengeId", challenge_id)])
            .await?;

        Ok(contents
            .into_iter()
            .flat_map(|c| c.voters)
            .filter(|v| v.user_id == user_id && v.challenge_id == challenge_id)
            .collect())
    }
}

/// 把一次投票并入投票人列表
///
/// `UnlimitedVotes` 按 (userId, challengeId) 累加到已有条目；
/// `OneVotePerUser` 直接追加，不检查重复：同一用户的每次投票各占一条。
pub fn apply_vote(voters: &mut Vec<Vote>, vote: Vote, rule: VoteRule) {
    match rule {
        VoteRule::UnlimitedVotes => {
            match voters
                .iter_mut()
                .find(|v| v.user_id == vote.user_id && v.challenge_id == vote.challenge_id)
            {
                Some(existing) => existing.nb_votes += vote.nb_votes,
                None => voters.push(vote),
            }
        }
        VoteRule::OneVotePerUser => voters.push(vote),
    }
}

pub fn tally(voters: &[Vote]) -> i64 {
    voters.iter().map(|v| v.nb_votes).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlimited_votes_accumulate() {
        let mut voters = Vec::new();
        apply_vote(&mut voters, Vote::new("u1", "c1", "ch1", 2), VoteRule::UnlimitedVotes);
        apply_vote(&mut voters, Vote::new("u1", "c1", "ch1", 3), VoteRule::UnlimitedVotes);
        apply_vote(&mut voters, Vote::new("u2", "c1", "ch1", 1), VoteRule::UnlimitedVotes);

        assert_eq!(voters.len(), 2);
        assert_eq!(voters[0].nb_votes, 5);
        assert_eq!(tally(&voters), 6);
    }

    #[test]
    fn test_one_vote_per_user_appends_duplicates() {
        let mut voters = Vec::new();
        apply_vote(&mut voters, Vote::new("u1", "c1", "ch1", 1), VoteRule::OneVotePerUser);
        apply_vote(&mut voters, Vote::new("u1", "c1", "ch1", 1), VoteRule::OneVotePerUser);

        assert_eq!(voters.len(), 2);
        assert_eq!(tally(&voters), 2);
    }
}
