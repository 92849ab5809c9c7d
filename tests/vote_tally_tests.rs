mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use creator_ledger::{
    models::{
        Content, CouponType, Interaction, ItemType, PaymentMethod, TransactionType, Vote, VoteRule,
    },
    services::{MemoryApi, ResourceApi},
    AppError, Result,
};
use serde_json::{json, Value};
use tokio_test::assert_err;

use common::*;

async fn stored_content(api: &MemoryApi, id: &str) -> Content {
    let value = api.get("contents", id).await.unwrap().unwrap();
    serde_json::from_value(value).unwrap()
}

#[tokio::test]
async fn unlimited_votes_accumulate_into_one_entry() {
    let (api, state) = memory_state();
    api.seed("contents", content_record("c1", "artist", "ch1", 0)).unwrap();

    state
        .votes
        .add_vote_to_content(&Vote::new("u1", "c1", "ch1", 2), VoteRule::UnlimitedVotes)
        .await
        .unwrap();
    let outcome = state
        .votes
        .add_vote_to_content(&Vote::new("u1", "c1", "ch1", 3), VoteRule::UnlimitedVotes)
        .await
        .unwrap();

    assert_eq!(outcome.user_votes, 5);
    assert_eq!(outcome.total_votes, 5);

    let content = stored_content(&api, "c1").await;
    assert_eq!(content.voters.len(), 1);
    assert_eq!(content.voters[0].nb_votes, 5);
    assert_eq!(content.vote_count, content.voter_total());
}

#[tokio::test]
async fn one_vote_per_user_appends_every_vote() {
    let (api, state) = memory_state();
    api.seed("contents", content_record("c1", "artist", "ch1", 0)).unwrap();

    for _ in 0..2 {
        state
            .votes
            .add_vote_to_content(&Vote::new("u1", "c1", "ch1", 1), VoteRule::OneVotePerUser)
            .await
            .unwrap();
    }

    // 该分支不做重复检查：同一用户留下两条记录
    let content = stored_content(&api, "c1").await;
    assert_eq!(content.voters.len(), 2);
    assert_eq!(content.vote_count, 2);
}

#[tokio::test]
async fn vote_on_missing_content_fails() {
    let (_, state) = memory_state();
    let err = assert_err!(
        state
            .votes
            .add_vote_to_content(&Vote::new("u1", "nope", "ch1", 1), VoteRule::UnlimitedVotes)
            .await
    );
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn zero_vote_is_rejected() {
    let (api, state) = memory_state();
    api.seed("contents", content_record("c1", "artist", "ch1", 0)).unwrap();

    let err = assert_err!(state.votes.cast_vote(&Vote::new("u1", "c1", "ch1", 0)).await);
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn challenge_total_sums_vote_counts() {
    let (api, state) = memory_state();
    api.seed("contents", content_record("c1", "a", "ch1", 3)).unwrap();
    api.seed("contents", content_record("c2", "b", "ch1", 4)).unwrap();
    api.seed("contents", content_record("c3", "c", "ch2", 10)).unwrap();

    assert_eq!(state.votes.get_total_votes_for_challenge("ch1").await.unwrap(), 7);
    assert_eq!(state.votes.get_total_votes_for_challenge("ch2").await.unwrap(), 10);
    assert_eq!(state.votes.get_total_votes_for_challenge("ch3").await.unwrap(), 0);
}

#[tokio::test]
async fn challenge_total_tracks_new_votes() {
    let (api, state) = memory_state();
    api.seed("contents", content_record("c1", "a", "ch1", 0)).unwrap();
    api.seed("contents", content_record("c2", "b", "ch1", 0)).unwrap();

    state.votes.cast_vote(&Vote::new("u1", "c1", "ch1", 4)).await.unwrap();
    state.votes.cast_vote(&Vote::new("u2", "c2", "ch1", 1)).await.unwrap();
    state.votes.cast_vote(&Vote::new("u1", "c1", "ch1", 2)).await.unwrap();

    assert_eq!(state.votes.get_total_votes_for_challenge("ch1").await.unwrap(), 7);

    let mine = state.votes.user_votes_for_challenge("u1", "ch1").await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].nb_votes, 6);
}

#[tokio::test]
async fn vote_with_coupon_spends_usage() {
    let (api, state) = memory_state();
    api.seed("contents", content_record("c1", "artist", "ch1", 0)).unwrap();

    let wallet = state
        .purchases
        .purchase_pack(&coupon_pack(CouponType::Premium, 1, 0), ItemType::Coupons, PaymentMethod::Free)
        .await
        .unwrap();
    let coupon_id = wallet.coupons[0].id.clone();

    let outcome = state
        .votes
        .vote_with_coupon(
            &Vote::new(USER_ID, "c1", "ch1", 2),
            &coupon_id,
            VoteRule::UnlimitedVotes,
            &state.coupons,
        )
        .await
        .unwrap();

    assert_eq!(outcome.total_votes, 2);
    let coupon = state
        .coupons
        .all_coupons()
        .into_iter()
        .find(|c| c.id == coupon_id)
        .unwrap();
    assert_eq!(coupon.usage_value, 1);
}

async fn buy_coupon(state: &creator_ledger::AppState, coupon_type: CouponType) -> String {
    let wallet = state
        .purchases
        .purchase_pack(&coupon_pack(coupon_type, 1, 0), ItemType::Coupons, PaymentMethod::Free)
        .await
        .unwrap();
    wallet.coupons[0].id.clone()
}

fn usage_of(state: &creator_ledger::AppState, coupon_id: &str) -> u32 {
    state
        .coupons
        .all_coupons()
        .into_iter()
        .find(|c| c.id == coupon_id)
        .map(|c| c.usage_value)
        .unwrap()
}

#[tokio::test]
async fn vote_with_coupon_needs_enough_uses() {
    let (api, state) = memory_state();
    api.seed("contents", content_record("c1", "artist", "ch1", 0)).unwrap();
    let coupon_id = buy_coupon(&state, CouponType::Standard).await;

    let err = assert_err!(
        state
            .votes
            .vote_with_coupon(
                &Vote::new(USER_ID, "c1", "ch1", 5),
                &coupon_id,
                VoteRule::UnlimitedVotes,
                &state.coupons,
            )
            .await
    );
    assert!(matches!(
        err,
        AppError::InsufficientFunds { required: 5, available: 1 }
    ));

    assert_eq!(usage_of(&state, &coupon_id), 1);
    let content = stored_content(&api, "c1").await;
    assert_eq!(content.vote_count, 0);
    assert!(content.voters.is_empty());
}

#[tokio::test]
async fn coupon_stays_spent_when_tally_fails() {
    let (_, state) = memory_state();
    let coupon_id = buy_coupon(&state, CouponType::Premium).await;

    let err = assert_err!(
        state
            .votes
            .vote_with_coupon(
                &Vote::new(USER_ID, "missing", "ch1", 2),
                &coupon_id,
                VoteRule::UnlimitedVotes,
                &state.coupons,
            )
            .await
    );
    assert!(matches!(err, AppError::NotFound(_)));

    assert_eq!(usage_of(&state, &coupon_id), 1);
    let usages = state.ledger.transactions_of(TransactionType::Usage);
    assert_eq!(usages.len(), 1);
    assert_eq!(usages[0].amount, 2);
}

/// 在第一次写作品之前插入另一位用户的投票，模拟并发写入
struct RacingApi {
    inner: MemoryApi,
    raced: AtomicBool,
}

#[async_trait]
impl ResourceApi for RacingApi {
    async fn list(&self, resource: &str, filter: &[(String, String)]) -> Result<Vec<Value>> {
        self.inner.list(resource, filter).await
    }

    async fn get(&self, resource: &str, id: &str) -> Result<Option<Value>> {
        self.inner.get(resource, id).await
    }

    async fn create(&self, resource: &str, body: Value) -> Result<Value> {
        self.inner.create(resource, body).await
    }

    async fn update(
        &self,
        resource: &str,
        id: &str,
        body: Value,
        expected_version: Option<u64>,
    ) -> Result<Value> {
        if resource == "contents" && !self.raced.swap(true, Ordering::SeqCst) {
            let mut other = self.inner.get(resource, id).await?.unwrap_or_default();
            other["voters"] = json!([{
                "userId": "rival",
                "contentId": id,
                "challengeId": "ch1",
                "nbVotes": 4,
                "createdAt": "2024-01-01T00:00:00Z"
            }]);
            other["voteCount"] = json!(4);
            self.inner.update(resource, id, other, None).await?;
        }
        self.inner.update(resource, id, body, expected_version).await
    }

    async fn delete(&self, resource: &str, id: &str) -> Result<()> {
        self.inner.delete(resource, id).await
    }
}

#[tokio::test]
async fn concurrent_vote_is_not_lost() {
    let inner = MemoryApi::new();
    inner.seed("contents", content_record("c1", "artist", "ch1", 0)).unwrap();
    let state = state_with(Arc::new(RacingApi {
        inner: inner.clone(),
        raced: AtomicBool::new(false),
    }));

    let outcome = state
        .votes
        .add_vote_to_content(&Vote::new("u1", "c1", "ch1", 3), VoteRule::UnlimitedVotes)
        .await
        .unwrap();

    assert_eq!(outcome.total_votes, 7);
    let content = stored_content(&inner, "c1").await;
    assert_eq!(content.voters.len(), 2);
    assert_eq!(content.vote_count, 7);
}

#[tokio::test]
async fn interactions_bump_counters() {
    let (api, state) = memory_state();
    api.seed("contents", content_record("c1", "artist", "ch1", 0)).unwrap();

    state.feed.record_interaction("c1", Interaction::View).await;
    state.feed.record_interaction("c1", Interaction::View).await;
    state.feed.record_interaction("c1", Interaction::Share).await;
    // 失败只记日志
    state.feed.record_interaction("missing", Interaction::Comment).await;

    let content = stored_content(&api, "c1").await;
    assert_eq!(content.view_count, 2);
    assert_eq!(content.share_count, 1);
    assert_eq!(content.comment_count, 0);
}

#[tokio::test]
async fn feeds_rank_by_engagement() {
    let (api, state) = memory_state();
    let mut popular = content_record("popular", "a", "ch1", 40);
    popular["viewCount"] = json!(300);
    api.seed("contents", popular).unwrap();
    api.seed("contents", content_record("quiet", "b", "ch1", 0)).unwrap();
    api.seed("contents", content_record("other", "c", "ch2", 15)).unwrap();

    let discovery = state.feed.discovery_feed(None).await.unwrap();
    let ids: Vec<_> = discovery.items.iter().map(|i| i.content.id.as_str()).collect();
    assert_eq!(ids, vec!["popular", "other", "quiet"]);

    let challenge = state.feed.challenge_feed("ch1", Some(1)).await.unwrap();
    assert_eq!(challenge.total, 1);
    assert_eq!(challenge.items[0].content.id, "popular");

    let followed = state
        .feed
        .followed_feed(&["b".to_string(), "c".to_string()], None)
        .await
        .unwrap();
    let ids: Vec<_> = followed.items.iter().map(|i| i.content.id.as_str()).collect();
    assert_eq!(ids, vec!["other", "quiet"]);
}
