use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::coupon::Coupon,
};

/// 余额：金币与优惠券数量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub coins: i64,
    pub coupons: i64,
}

impl Balance {
    pub fn new(coins: i64, coupons: i64) -> Self {
        Self { coins, coupons }
    }

    /// 按增量调整余额，不做充足性检查；溢出时余额保持不变
    pub fn apply_delta(&mut self, coins_delta: i64, coupons_delta: i64) -> Result<()> {
        let coins = self.coins.checked_add(coins_delta).ok_or_else(|| {
            AppError::Validation(format!("Coin balance overflow: {} {:+}", self.coins, coins_delta))
        })?;
        let coupons = self.coupons.checked_add(coupons_delta).ok_or_else(|| {
            AppError::Validation(format!("Coupon balance overflow: {} {:+}", self.coupons, coupons_delta))
        })?;

        self.coins = coins;
        self.coupons = coupons;
        Ok(())
    }

    pub fn covers_coins(&self, amount: i64) -> bool {
        self.coins >= amount
    }

    pub fn covers_coupons(&self, amount: i64) -> bool {
        self.coupons >= amount
    }
}

/// 用户钱包
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub balance: Balance,
    #[serde(default)]
    pub coupons: Vec<Coupon>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u64>,
}

impl Wallet {
    /// 首次访问时创建的空钱包
    pub fn empty(user_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            balance: Balance::default(),
            coupons: Vec::new(),
            transactions: Vec::new(),
            created_at: now,
            updated_at: now,
            version: None,
        }
    }

    pub fn find_coupon_mut(&mut self, coupon_id: &str) -> Option<&mut Coupon> {
        self.coupons.iter_mut().find(|c| c.id == coupon_id)
    }

    /// 交易记录只追加，不修改
    pub fn record(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Purchase,
    Usage,
    Refund,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Coins,
    Coupons,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Coins,      // 金币支付
    Card,       // 银行卡
    InAppStore, // 应用商店内购
    Free,       // 赠送
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub wallet_id: String,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    pub amount: i64,
    pub item_type: ItemType,
    pub date: DateTime<Utc>,
    pub price: i64,
    pub payment_method: Option<PaymentMethod>,
}

impl Transaction {
    pub fn new(
        wallet_id: &str,
        transaction_type: TransactionType,
        amount: i64,
        item_type: ItemType,
        price: i64,
        payment_method: Option<PaymentMethod>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            wallet_id: wallet_id.to_string(),
            transaction_type,
            amount,
            item_type,
            date: Utc::now(),
            price,
            payment_method,
        }
    }
}
