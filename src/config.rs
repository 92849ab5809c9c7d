use serde::{Deserialize, Serialize};
use std::env;

use crate::models::vote::VoteRule;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Runtime
    pub environment: String,
    pub log_level: String,

    // Backend API
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,

    // Local cache
    pub cache_path: Option<String>,

    // Ledger rules
    pub vote_rule: VoteRule,
    pub max_write_attempts: u32,
    pub coupon_validity_days: i64,

    // Feed
    pub default_feed_limit: usize,
}

impl Config {
    /// 加载 .env 后读取环境变量
    pub fn load() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Config {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            log_level: env::var("LOG_LEVEL")
                .unwrap_or_else(|_| "creator_ledger=debug".to_string()),

            api_base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:1337/api".to_string()),
            api_token: env::var("API_TOKEN").ok().filter(|t| !t.is_empty()),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()?,

            cache_path: env::var("CACHE_PATH").ok().filter(|p| !p.is_empty()),

            vote_rule: env::var("VOTE_RULE")
                .unwrap_or_else(|_| "unlimited".to_string())
                .parse()?,
            max_write_attempts: env::var("MAX_WRITE_ATTEMPTS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()?,
            coupon_validity_days: env::var("COUPON_VALIDITY_DAYS")
                .unwrap_or_else(|_| "365".to_string())
                .parse()?,

            default_feed_limit: env::var("DEFAULT_FEED_LIMIT")
                .unwrap_or_else(|_| "20".to_string())
                .parse()?,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            log_level: "creator_ledger=debug".to_string(),
            api_base_url: "http://localhost:1337/api".to_string(),
            api_token: None,
            request_timeout_secs: 10,
            cache_path: None,
            vote_rule: VoteRule::UnlimitedVotes,
            max_write_attempts: 3,
            coupon_validity_days: 365,
            default_feed_limit: 20,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.is_development());
        assert!(!config.is_production());
        assert_eq!(config.max_write_attempts, 3);
        assert_eq!(config.coupon_validity_days, 365);
        assert_eq!(config.vote_rule, VoteRule::UnlimitedVotes);
    }

    #[test]
    fn test_vote_rule_names() {
        assert_eq!("one_vote".parse::<VoteRule>().unwrap(), VoteRule::OneVotePerUser);
        assert_eq!("UNLIMITED_VOTES".parse::<VoteRule>().unwrap(), VoteRule::UnlimitedVotes);
        assert!("twice".parse::<VoteRule>().is_err());
    }
}
