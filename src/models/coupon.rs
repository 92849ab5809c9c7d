use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CouponType {
    Standard,
    Special,
    Premium,
    Legendary,
}

impl CouponType {
    /// 每种优惠券可投票的次数
    pub fn usage_value(&self) -> u32 {
        match self {
            CouponType::Standard => 1,
            CouponType::Special => 2,
            CouponType::Premium => 3,
            CouponType::Legendary => 5,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            CouponType::Standard => "Standard coupon",
            CouponType::Special => "Special coupon",
            CouponType::Premium => "Premium coupon",
            CouponType::Legendary => "Legendary coupon",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub coupon_type: CouponType,
    pub usage_value: u32,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub is_exhausted: bool,
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// 可用：未耗尽且未过期
    pub fn is_available(&self, now: DateTime<Utc>) -> bool {
        !self.is_exhausted && self.usage_value > 0 && !self.is_expired(now)
    }
}
