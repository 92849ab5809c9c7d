//! 创作者挑战应用的经济核心：钱包账本、优惠券库存、礼包购买、投票计数与信息流排序。
//!
//! 所有状态都来自外部 REST 资源后端，钱包额外镜像到本地 JSON 缓存，
//! 网络不可用时作为陈旧读回退。

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod telemetry;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
