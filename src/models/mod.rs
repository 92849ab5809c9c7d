pub mod content;
pub mod coupon;
pub mod pack;
pub mod ranking;
pub mod vote;
pub mod wallet;

pub use content::{Content, Interaction};
pub use coupon::{Coupon, CouponType};
pub use pack::Pack;
pub use ranking::{Feed, FeedKind, RankedContent, RankingWeights};
pub use vote::{Vote, VoteOutcome, VoteRule};
pub use wallet::{Balance, ItemType, PaymentMethod, Transaction, TransactionType, Wallet};
