use std::env;
use tracing::{error, info};

use creator_ledger::{telemetry, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置
    let config = Config::load()?;

    // 初始化日志
    telemetry::init_tracing(&config);

    info!("Starting creator-ledger against {}", config.api_base_url);

    let user_id = env::var("LEDGER_USER_ID")
        .map_err(|_| anyhow::anyhow!("LEDGER_USER_ID must be set"))?;

    let state = AppState::connect(config, &user_id).await?;

    let wallet = match state.ledger.load_wallet().await {
        Ok(wallet) => wallet,
        Err(e) => {
            error!("Failed to load wallet for {}: {}", user_id, e);
            return Err(e.into());
        }
    };

    info!(
        "Wallet {}: {} coins, {} coupons, {} transactions",
        wallet.id,
        wallet.balance.coins,
        wallet.balance.coupons,
        wallet.transactions.len()
    );
    info!(
        "{} coupons available ({} votes remaining)",
        state.coupons.available_coupons().len(),
        state.coupons.remaining_usage()
    );

    let feed = state.feed.discovery_feed(Some(5)).await?;
    for (rank, item) in feed.items.iter().enumerate() {
        info!(
            "#{} {} score={:.1} votes={} views={} shares={}",
            rank + 1,
            item.content.id,
            item.score,
            item.content.vote_count,
            item.content.view_count,
            item.content.share_count
        );
    }

    Ok(())
}
