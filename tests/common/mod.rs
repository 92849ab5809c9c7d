#![allow(dead_code)]

use std::sync::Arc;

use creator_ledger::{
    models::{CouponType, ItemType, Pack},
    services::{MemoryApi, ResourceApi},
    utils::LocalCache,
    AppState, Config,
};
use serde_json::{json, Value};

pub const USER_ID: &str = "user-1";
pub const WALLET_ID: &str = "wallet-1";

pub fn wallet_record(coins: i64, coupons: i64) -> Value {
    json!({
        "id": WALLET_ID,
        "userId": USER_ID,
        "balance": { "coins": coins, "coupons": coupons },
        "coupons": [],
        "transactions": [],
        "createdAt": "2024-01-01T00:00:00Z",
        "updatedAt": "2024-01-01T00:00:00Z"
    })
}

pub fn content_record(id: &str, author: &str, challenge_id: &str, vote_count: i64) -> Value {
    json!({
        "id": id,
        "userId": author,
        "challengeId": challenge_id,
        "voteCount": vote_count,
        "viewCount": 0,
        "shareCount": 0,
        "commentCount": 0,
        "voters": [],
        "createdAt": chrono::Utc::now()
    })
}

pub fn coupon_pack(coupon_type: CouponType, amount: i64, price: i64) -> Pack {
    Pack {
        id: format!("pack-{:?}-{}", coupon_type, amount).to_lowercase(),
        name: format!("{} x{}", coupon_type.display_name(), amount),
        amount,
        price,
        item_type: ItemType::Coupons,
        coupon_type: Some(coupon_type),
    }
}

pub fn coin_pack(amount: i64) -> Pack {
    Pack {
        id: format!("coins-{}", amount),
        name: format!("{} coins", amount),
        amount,
        price: 0,
        item_type: ItemType::Coins,
        coupon_type: None,
    }
}

pub fn state_with(api: Arc<dyn ResourceApi>) -> AppState {
    AppState::new(Config::default(), api, LocalCache::in_memory(), USER_ID)
}

pub fn memory_state() -> (MemoryApi, AppState) {
    let api = MemoryApi::new();
    let state = state_with(Arc::new(api.clone()));
    (api, state)
}
