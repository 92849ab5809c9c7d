pub mod api;
pub mod backend;
pub mod command;
pub mod coupon;
pub mod feed;
pub mod ledger;
pub mod memory;
pub mod purchase;
pub mod vote;

// 重新导出常用类型
pub use api::{ResourceApi, RestClient};
pub use backend::Backend;
pub use command::OptimisticUpdate;
pub use coupon::CouponInventory;
pub use feed::FeedService;
pub use ledger::LedgerStore;
pub use memory::MemoryApi;
pub use purchase::PurchaseOrchestrator;
pub use vote::VoteTally;
