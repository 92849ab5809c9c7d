use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// 乐观更新命令
///
/// 创建时立即向订阅者发布本地状态变化，异步结果返回后调用
/// [`confirm`](Self::confirm) 发布权威值，或 [`revert`](Self::revert)
/// 恢复原值。未结算就被丢弃（例如调用方的 future 被取消）时自动回滚。
pub struct OptimisticUpdate<T: Clone> {
    channel: Arc<watch::Sender<T>>,
    previous: T,
    settled: bool,
}

impl<T: Clone> OptimisticUpdate<T> {
    pub fn apply(channel: Arc<watch::Sender<T>>, transition: impl FnOnce(&mut T)) -> Self {
        let previous = channel.borrow().clone();
        channel.send_modify(transition);

        Self {
            channel,
            previous,
            settled: false,
        }
    }

    /// 乐观发布之前的值
    pub fn previous(&self) -> &T {
        &self.previous
    }

    pub fn confirm(mut self, authoritative: T) {
        self.settle(authoritative);
    }

    pub fn revert(mut self) {
        let previous = self.previous.clone();
        self.settle(previous);
    }

    fn settle(&mut self, value: T) {
        self.channel.send_replace(value);
        self.settled = true;
    }
}

impl<T: Clone> Drop for OptimisticUpdate<T> {
    fn drop(&mut self) {
        if !self.settled {
            debug!("Optimistic update dropped before settling, reverting");
            self.channel.send_replace(self.previous.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Balance;

    fn channel(coins: i64) -> (Arc<watch::Sender<Balance>>, watch::Receiver<Balance>) {
        let (tx, rx) = watch::channel(Balance::new(coins, 0));
        (Arc::new(tx), rx)
    }

    #[test]
    fn test_apply_publishes_immediately() {
        let (tx, rx) = channel(150);
        let update = OptimisticUpdate::apply(tx, |b| b.coins -= 100);

        assert_eq!(rx.borrow().coins, 50);
        assert_eq!(update.previous().coins, 150);
        update.confirm(Balance::new(50, 5));
        assert_eq!(*rx.borrow(), Balance::new(50, 5));
    }

    #[test]
    fn test_revert_restores_previous() {
        let (tx, rx) = channel(150);
        let update = OptimisticUpdate::apply(tx, |b| b.coins -= 100);
        update.revert();

        assert_eq!(rx.borrow().coins, 150);
    }

    #[test]
    fn test_drop_without_settling_reverts() {
        let (tx, rx) = channel(80);
        {
            let _update = OptimisticUpdate::apply(tx, |b| b.coins = 0);
            assert_eq!(rx.borrow().coins, 0);
        }
        assert_eq!(rx.borrow().coins, 80);
    }
}
