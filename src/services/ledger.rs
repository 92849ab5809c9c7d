use crate::{
    config::Config,
    error::{AppError, Result},
    models::wallet::*,
    services::Backend,
    utils::{cache::LocalCache, retry::retry_on_conflict},
};
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

const WALLETS: &str = "wallets";

/// 钱包账本
///
/// 内存中保存最近一次确认的钱包，所有写操作都通过 [`modify_wallet`](Self::modify_wallet)
/// 对远端做读-改-写，成功后向订阅者重新发布余额并镜像到本地缓存。
#[derive(Clone)]
pub struct LedgerStore {
    backend: Backend,
    cache: LocalCache,
    user_id: String,
    wallet: Arc<RwLock<Option<Wallet>>>,
    balance_tx: Arc<watch::Sender<Balance>>,
    max_write_attempts: u32,
}

impl LedgerStore {
    pub fn new(backend: Backend, cache: LocalCache, user_id: &str, config: &Config) -> Self {
        let (balance_tx, _) = watch::channel(Balance::default());

        Self {
            backend,
            cache,
            user_id: user_id.to_string(),
            wallet: Arc::new(RwLock::new(None)),
            balance_tx: Arc::new(balance_tx),
            max_write_attempts: config.max_write_attempts,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// 最近一次确认的余额（同步读取内存）
    pub fn get_balance(&self) -> Balance {
        self.wallet
            .read()
            .as_ref()
            .map(|w| w.balance)
            .unwrap_or_default()
    }

    pub fn wallet_snapshot(&self) -> Option<Wallet> {
        self.wallet.read().clone()
    }

    /// 订阅余额变化
    pub fn subscribe(&self) -> watch::Receiver<Balance> {
        self.balance_tx.subscribe()
    }

    pub(crate) fn balance_channel(&self) -> Arc<watch::Sender<Balance>> {
        self.balance_tx.clone()
    }

    /// 加载钱包，不存在则创建；网络失败时回退到本地缓存
    pub async fn load_wallet(&self) -> Result<Wallet> {
        debug!("Loading wallet for user: {}", self.user_id);

        match self.fetch_or_create().await {
            Ok(wallet) => {
                self.publish(&wallet).await;
                Ok(wallet)
            }
            Err(e) if e.is_transport() => {
                let key = LocalCache::wallet_key(&self.user_id);
                match self.cache.get::<Wallet>(&key) {
                    Some(cached) => {
                        warn!("Wallet fetch failed ({}), serving cached wallet {}", e, cached.id);
                        self.set_snapshot(&cached);
                        Ok(cached)
                    }
                    None => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_or_create(&self) -> Result<Wallet> {
        if let Some(wallet) = self
            .backend
            .find_one::<Wallet>(WALLETS, "userId", &self.user_id)
            .await?
        {
            return Ok(wallet);
        }

        let wallet = self.backend.create(WALLETS, &Wallet::empty(&self.user_id)).await?;
        info!("Created wallet {} for user {}", wallet.id, self.user_id);
        Ok(wallet)
    }

    /// 对远端钱包做读-改-写
    ///
    /// `mutate` 可能因版本冲突被重放，必须只依赖传入的钱包。返回 `Err` 时不写入。
    pub async fn modify_wallet<R, F>(&self, label: &str, mutate: F) -> Result<(Wallet, R)>
    where
        F: Fn(&mut Wallet) -> Result<R> + Send + Sync,
        R: Send,
    {
        let mutate = &mutate;
        let this = self;

        let (saved, output) = retry_on_conflict(label, self.max_write_attempts, move || async move {
            let mut wallet = this.fetch_or_create().await?;
            let expected = wallet.version;

            let output = mutate(&mut wallet)?;
            wallet.updated_at = Utc::now();

            let saved: Wallet = this
                .backend
                .update(WALLETS, &wallet.id, &wallet, expected)
                .await?;
            Ok((saved, output))
        })
        .await?;

        self.publish(&saved).await;
        Ok((saved, output))
    }

    /// 按增量更新余额
    pub async fn update_balance(&self, coins_delta: i64, coupons_delta: i64) -> Result<Balance> {
        debug!(
            "Updating balance for {}: coins {:+}, coupons {:+}",
            self.user_id, coins_delta, coupons_delta
        );

        let (wallet, _) = self
            .modify_wallet("update_balance", |w| {
                w.balance.apply_delta(coins_delta, coupons_delta)
            })
            .await?;

        Ok(wallet.balance)
    }

    pub async fn add_coins(&self, amount: i64) -> Result<Balance> {
        ensure_positive(amount)?;
        self.update_balance(amount, 0).await
    }

    /// 退还金币并记录退款交易
    pub async fn refund_coins(&self, amount: i64) -> Result<Balance> {
        ensure_positive(amount)?;
        info!("Refunding {} coins to {}", amount, self.user_id);

        let (wallet, _) = self
            .modify_wallet("refund_coins", |w| {
                w.balance.apply_delta(amount, 0)?;
                let txn = Transaction::new(&w.id, TransactionType::Refund, amount, ItemType::Coins, 0, None);
                w.record(txn);
                Ok(())
            })
            .await?;

        Ok(wallet.balance)
    }

    /// 扣除金币；本地余额不足时在任何网络请求之前失败
    ///
    /// 充足性检查与远端写入不是原子的。
    pub async fn deduct_coins(&self, amount: i64) -> Result<Balance> {
        ensure_positive(amount)?;

        let balance = self.get_balance();
        if !balance.covers_coins(amount) {
            warn!("Insufficient coins for {}: {} < {}", self.user_id, balance.coins, amount);
            return Err(AppError::insufficient(amount, balance.coins));
        }

        self.update_balance(-amount, 0).await
    }

    pub async fn deduct_coupons(&self, amount: i64) -> Result<Balance> {
        ensure_positive(amount)?;

        let balance = self.get_balance();
        if !balance.covers_coupons(amount) {
            warn!("Insufficient coupons for {}: {} < {}", self.user_id, balance.coupons, amount);
            return Err(AppError::insufficient(amount, balance.coupons));
        }

        self.update_balance(0, -amount).await
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.wallet
            .read()
            .as_ref()
            .map(|w| w.transactions.clone())
            .unwrap_or_default()
    }

    pub fn transactions_of(&self, transaction_type: TransactionType) -> Vec<Transaction> {
        self.transactions()
            .into_iter()
            .filter(|t| t.transaction_type == transaction_type)
            .collect()
    }

    fn set_snapshot(&self, wallet: &Wallet) {
        *self.wallet.write() = Some(wallet.clone());
        self.balance_tx.send_replace(wallet.balance);
    }

    async fn publish(&self, wallet: &Wallet) {
        self.set_snapshot(wallet);

        let key = LocalCache::wallet_key(&self.user_id);
        if let Err(e) = self.cache.set(&key, wallet).await {
            warn!("Failed to mirror wallet {} to local cache: {}", wallet.id, e);
        }
    }
}

fn ensure_positive(amount: i64) -> Result<()> {
    if amount <= 0 {
        return Err(AppError::Validation(format!("Amount must be positive, got {}", amount)));
    }
    Ok(())
}
