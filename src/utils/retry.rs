use std::future::Future;
use tracing::warn;

use crate::error::Result;

/// 读-改-写遇到版本冲突时重新读取并重放，最多 `attempts` 次
pub async fn retry_on_conflict<T, F, Fut>(label: &str, attempts: u32, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;

    loop {
        match op().await {
            Err(e) if e.is_conflict() && attempt < attempts => {
                warn!("{}: write conflict on attempt {}/{}: {}", label, attempt, attempts, e);
                attempt += 1;
            }
            other => return other,
        }
    }
}
