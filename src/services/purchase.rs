use crate::{
    error::{AppError, Result},
    models::{pack::Pack, wallet::*},
    services::{command::OptimisticUpdate, coupon::CouponInventory, ledger::LedgerStore},
};
use chrono::Utc;
use tracing::{debug, error, info};
use validator::Validate;

/// 礼包购买编排
#[derive(Clone)]
pub struct PurchaseOrchestrator {
    ledger: LedgerStore,
    inventory: CouponInventory,
}

impl PurchaseOrchestrator {
    pub fn new(ledger: LedgerStore, inventory: CouponInventory) -> Self {
        Self { ledger, inventory }
    }

    /// 购买礼包
    ///
    /// 确保钱包存在、构造交易记录、按需铸造优惠券、计算新余额，
    /// 最后把三者作为一次钱包更新写回。
    pub async fn purchase_pack(
        &self,
        pack: &Pack,
        item_type: ItemType,
        payment_method: PaymentMethod,
    ) -> Result<Wallet> {
        debug!("Purchasing pack {} as {:?} via {:?}", pack.id, item_type, payment_method);

        pack.validate()?;
        if item_type == ItemType::Coupons && pack.coupon_type.is_none() {
            return Err(AppError::validation("Coupon purchase needs a coupon type"));
        }

        let now = Utc::now();
        let (wallet, minted) = self
            .ledger
            .modify_wallet("purchase_pack", |wallet| {
                let transaction = Transaction::new(
                    &wallet.id,
                    TransactionType::Purchase,
                    pack.amount,
                    item_type,
                    pack.price,
                    Some(payment_method),
                );

                let coupons = match item_type {
                    ItemType::Coupons => self.inventory.mint_coupons(pack, now)?,
                    ItemType::Coins => Vec::new(),
                };

                let mut balance = wallet.balance;
                match item_type {
                    ItemType::Coins => balance.apply_delta(pack.amount, 0)?,
                    ItemType::Coupons => balance.apply_delta(0, coupons.len() as i64)?,
                }

                let minted = coupons.len();
                wallet.coupons.extend(coupons);
                wallet.balance = balance;
                wallet.record(transaction);
                Ok(minted)
            })
            .await?;

        info!(
            "Pack {} purchased by {}: {} coupons minted, balance now {:?}",
            pack.id,
            self.ledger.user_id(),
            minted,
            wallet.balance
        );
        Ok(wallet)
    }

    /// 用金币购买礼包
    ///
    /// 先乐观地发布扣款后的余额，再依次扣除金币、发放礼包。发放失败时尽力退款；
    /// 退款也失败时发布已扣款的余额并返回原始错误。
    pub async fn purchase_with_coins(&self, pack: &Pack) -> Result<Wallet> {
        pack.validate()?;

        let price = pack.price;
        let update = OptimisticUpdate::apply(self.ledger.balance_channel(), |b| {
            b.coins = b.coins.saturating_sub(price)
        });

        if price > 0 {
            if let Err(e) = self.ledger.deduct_coins(price).await {
                update.revert();
                return Err(e);
            }
        }

        match self.purchase_pack(pack, pack.item_type, PaymentMethod::Coins).await {
            Ok(wallet) => {
                update.confirm(wallet.balance);
                Ok(wallet)
            }
            Err(e) => {
                error!("Pack {} purchase failed after deducting {} coins: {}", pack.id, price, e);

                if price > 0 {
                    match self.ledger.refund_coins(price).await {
                        Ok(balance) => update.confirm(balance),
                        Err(refund_err) => {
                            error!("Refund of {} coins failed: {}", price, refund_err);
                            update.confirm(self.ledger.get_balance());
                        }
                    }
                } else {
                    update.revert();
                }
                Err(e)
            }
        }
    }
}
