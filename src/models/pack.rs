use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::models::{coupon::CouponType, wallet::ItemType};

/// 可购买的礼包：铸造金币或一批优惠券
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_pack_contents", skip_on_field_errors = false))]
pub struct Pack {
    pub id: String,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    #[validate(range(min = 1, max = 10000))]
    pub amount: i64,
    #[validate(range(min = 0))]
    pub price: i64,
    pub item_type: ItemType,
    pub coupon_type: Option<CouponType>,
}

fn validate_pack_contents(pack: &Pack) -> Result<(), ValidationError> {
    if pack.item_type == ItemType::Coupons && pack.coupon_type.is_none() {
        let mut err = ValidationError::new("coupon_type_required");
        err.message = Some("优惠券礼包必须指定优惠券类型".into());
        return Err(err);
    }
    Ok(())
}
