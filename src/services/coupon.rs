use crate::{
    config::Config,
    error::{AppError, Result},
    models::{coupon::*, pack::Pack, wallet::*},
    services::ledger::LedgerStore,
};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

/// 优惠券库存，挂在钱包上的子账本
#[derive(Clone)]
pub struct CouponInventory {
    ledger: LedgerStore,
    validity: Duration,
}

impl CouponInventory {
    pub fn new(ledger: LedgerStore, config: &Config) -> Self {
        Self {
            ledger,
            validity: Duration::days(config.coupon_validity_days),
        }
    }

    /// 为礼包铸造 `pack.amount` 张优惠券
    pub fn mint_coupons(&self, pack: &Pack, now: DateTime<Utc>) -> Result<Vec<Coupon>> {
        let coupon_type = pack
            .coupon_type
            .ok_or_else(|| AppError::validation("Coupon pack has no coupon type"))?;

        Ok(mint_batch(coupon_type, pack.amount, now, self.validity))
    }

    /// 扣减优惠券的剩余次数，归零后标记为耗尽
    ///
    /// 已耗尽的优惠券不会被恢复，也不会被删除。
    pub async fn decrement_user_coupon_usage(&self, coupon_id: &str, n: u32) -> Result<Coupon> {
        debug!("Decrementing coupon {} by {}", coupon_id, n);
        self.consume_usage("decrement_coupon", coupon_id, n, false).await
    }

    /// 消耗恰好 `n` 次；剩余次数不足时失败且不写入
    pub async fn spend_coupon_usage(&self, coupon_id: &str, n: u32) -> Result<Coupon> {
        debug!("Spending {} use(s) of coupon {}", n, coupon_id);
        self.consume_usage("spend_coupon", coupon_id, n, true).await
    }

    async fn consume_usage(&self, label: &str, coupon_id: &str, n: u32, exact: bool) -> Result<Coupon> {
        if n == 0 {
            return Err(AppError::validation("Usage decrement must be at least 1"));
        }

        let now = Utc::now();
        let (_, coupon) = self
            .ledger
            .modify_wallet(label, |wallet| {
                let wallet_id = wallet.id.clone();
                let coupon = wallet
                    .find_coupon_mut(coupon_id)
                    .ok_or_else(|| AppError::not_found("Coupon"))?;

                if coupon.usage_value == 0 || coupon.is_exhausted {
                    return Err(AppError::CouponExhausted(coupon_id.to_string()));
                }
                if coupon.is_expired(now) {
                    return Err(AppError::Validation(format!("Coupon {} has expired", coupon_id)));
                }
                if exact && coupon.usage_value < n {
                    return Err(AppError::insufficient(
                        i64::from(n),
                        i64::from(coupon.usage_value),
                    ));
                }

                coupon.usage_value = coupon.usage_value.saturating_sub(n);
                if coupon.usage_value == 0 {
                    coupon.is_exhausted = true;
                }
                let updated = coupon.clone();

                if updated.is_exhausted {
                    wallet.balance.coupons = wallet.balance.coupons.saturating_sub(1).max(0);
                }
                wallet.record(Transaction::new(
                    &wallet_id,
                    TransactionType::Usage,
                    i64::from(n),
                    ItemType::Coupons,
                    0,
                    None,
                ));

                Ok(updated)
            })
            .await?;

        if coupon.is_exhausted {
            info!("Coupon {} exhausted", coupon.id);
        }
        Ok(coupon)
    }

    /// 当前可用的优惠券（未耗尽、未过期）
    pub fn available_coupons(&self) -> Vec<Coupon> {
        let now = Utc::now();
        self.all_coupons()
            .into_iter()
            .filter(|c| c.is_available(now))
            .collect()
    }

    pub fn all_coupons(&self) -> Vec<Coupon> {
        self.ledger
            .wallet_snapshot()
            .map(|w| w.coupons)
            .unwrap_or_default()
    }

    /// 可用优惠券剩余的总投票次数
    pub fn remaining_usage(&self) -> u64 {
        self.available_coupons()
            .iter()
            .map(|c| u64::from(c.usage_value))
            .sum()
    }
}

/// 按类型表铸造一批优惠券
pub fn mint_batch(
    coupon_type: CouponType,
    amount: i64,
    now: DateTime<Utc>,
    validity: Duration,
) -> Vec<Coupon> {
    (0..amount.max(0))
        .map(|_| Coupon {
            id: Uuid::new_v4().to_string(),
            name: coupon_type.display_name().to_string(),
            coupon_type,
            usage_value: coupon_type.usage_value(),
            expires_at: now + validity,
            is_exhausted: false,
            created_at: now,
        })
        .collect()
}
