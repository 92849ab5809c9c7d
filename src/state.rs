use std::sync::Arc;

use crate::{
    config::Config,
    error::Result,
    services::{
        api::{ResourceApi, RestClient},
        backend::Backend,
        coupon::CouponInventory,
        feed::FeedService,
        ledger::LedgerStore,
        purchase::PurchaseOrchestrator,
        vote::VoteTally,
    },
    utils::cache::LocalCache,
};

/// 当前登录用户的共享状态
/// 每个服务只有一个实例，克隆只复制句柄
#[derive(Clone)]
pub struct AppState {
    /// 应用配置
    pub config: Config,

    /// 资源后端
    pub backend: Backend,

    /// 本地缓存
    pub cache: LocalCache,

    /// 钱包账本
    pub ledger: LedgerStore,

    /// 优惠券库存
    pub coupons: CouponInventory,

    /// 礼包购买
    pub purchases: PurchaseOrchestrator,

    /// 投票计数
    pub votes: VoteTally,

    /// 信息流
    pub feed: FeedService,
}

impl AppState {
    pub fn new(config: Config, api: Arc<dyn ResourceApi>, cache: LocalCache, user_id: &str) -> Self {
        let backend = Backend::new(api);
        let ledger = LedgerStore::new(backend.clone(), cache.clone(), user_id, &config);
        let coupons = CouponInventory::new(ledger.clone(), &config);
        let purchases = PurchaseOrchestrator::new(ledger.clone(), coupons.clone());
        let votes = VoteTally::new(backend.clone(), &config);
        let feed = FeedService::new(backend.clone(), &config);

        Self {
            config,
            backend,
            cache,
            ledger,
            coupons,
            purchases,
            votes,
            feed,
        }
    }

    /// 连接 REST 后端，按配置打开本地缓存
    pub async fn connect(config: Config, user_id: &str) -> Result<Self> {
        let api = Arc::new(RestClient::new(&config)?);
        let cache = match &config.cache_path {
            Some(path) => LocalCache::open(path).await?,
            None => LocalCache::in_memory(),
        };

        Ok(Self::new(config, api, cache, user_id))
    }

    /// 检查是否为生产环境
    pub fn is_production(&self) -> bool {
        self.config.is_production()
    }

    /// 检查是否为开发环境
    pub fn is_development(&self) -> bool {
        self.config.is_development()
    }
}
